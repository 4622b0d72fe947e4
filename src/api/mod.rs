//! API module: command surface and event ingestion over HTTP
//!
//! Members toggle subscriptions and filter tokens, list their settings,
//! and replay recent events; the platform bridge posts audit-log entries
//! for dispatch.

pub mod handler;
pub mod types;

pub use handler::{notify_router, NotifyState};
