//! Events module: listenable event types and recent-event history
//!
//! Defines the closed set of event types members can subscribe to, the
//! inbound audit-log record, and the bounded history used for replay.

pub mod history;
pub mod types;

pub use history::EventHistory;
pub use types::{
    ActionCategory, AttributeChange, AuditActor, AuditLogEntry, AuditTarget, FilterKind,
    FilterToggle, GuildId, ListenEventType, SubscriptionToggle, UserId,
};
