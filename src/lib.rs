//! NotifyMeOn - direct-message alerts for guild events
//!
//! Guild members opt into DMs when events happen in their guild (currently:
//! audit-log entry creation) and can suppress noisy actions with per-user
//! allow/deny lists.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Command API (axum)                      │
//! │   toggle subscription · toggle filter · list · replay · ingest │
//! └───────────────┬──────────────────────────────┬───────────────┘
//!                 │ load / flush                 │ audit-log entry
//! ┌───────────────▼──────────────┐  ┌────────────▼───────────────┐
//! │   GuildHandle (per guild)    │  │        Dispatcher          │
//! │  - subscriptions             │◄─┤  - subscribers             │
//! │  - allow / deny filters      │  │  - filters                 │
//! └───────────────┬──────────────┘  │  - formatter               │
//!                 │                 └────────────┬───────────────┘
//! ┌───────────────▼──────────────┐  ┌────────────▼───────────────┐
//! │  ConfigBackend (one blob     │  │  MemberDirectory /         │
//! │  per guild)                  │  │  DirectMessenger (Discord) │
//! └──────────────────────────────┘  └────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`]: HTTP command surface and event ingestion
//! - [`channels`]: platform seams and the Discord REST client
//! - [`dispatch`]: subscriber fan-out and message rendering
//! - [`events`]: event types and recent-event history
//! - [`store`]: per-guild state, handles and config backends
//! - [`config`]: configuration management

pub mod api;
pub mod channels;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod store;

pub use config::NotifyConfig;
pub use error::{Error, Result};
