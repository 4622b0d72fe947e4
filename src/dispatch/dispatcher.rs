//! Event dispatcher
//!
//! Fans an audit-log entry out to the guild's subscribers. Every failure is
//! per-subscriber: members who left are skipped, refused deliveries are not
//! retried, and neither stops the remaining subscribers.

use crate::channels::{DirectMessenger, MemberDirectory};
use crate::dispatch::formatter;
use crate::events::types::{AuditLogEntry, ListenEventType, UserId};
use crate::store::GuildState;
use serde::Serialize;
use std::sync::Arc;

/// Outcome counts of one dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    pub delivered: usize,
    pub filtered: usize,
    pub missing_members: usize,
    pub failed: usize,
}

impl DispatchReport {
    fn absorb(&mut self, other: &DispatchReport) {
        self.delivered += other.delivered;
        self.filtered += other.filtered;
        self.missing_members += other.missing_members;
        self.failed += other.failed;
    }
}

/// Delivers events to subscribers through the platform seams
pub struct Dispatcher {
    members: Arc<dyn MemberDirectory>,
    messenger: Arc<dyn DirectMessenger>,
}

impl Dispatcher {
    pub fn new(members: Arc<dyn MemberDirectory>, messenger: Arc<dyn DirectMessenger>) -> Self {
        Self { members, messenger }
    }

    /// Deliver an audit-log entry to every subscriber of the guild
    pub async fn dispatch_audit_entry(
        &self,
        state: &GuildState,
        entry: &AuditLogEntry,
    ) -> DispatchReport {
        let subscribers = state.subscribers(ListenEventType::AuditLogEntry);
        tracing::debug!(
            "Dispatching {} in guild {} to {} subscriber(s)",
            entry.action,
            entry.guild_id,
            subscribers.len()
        );
        self.deliver(state, entry, subscribers).await
    }

    /// Deliver entries to a single user, as if they had just happened.
    /// Only reaches the user while subscribed; their filters still apply.
    pub async fn replay_to(
        &self,
        state: &GuildState,
        user: UserId,
        entries: &[AuditLogEntry],
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        if !state.is_subscribed(ListenEventType::AuditLogEntry, user) {
            return report;
        }
        for entry in entries {
            let single = self.deliver(state, entry, [user]).await;
            report.absorb(&single);
        }
        report
    }

    /// Resolve each recipient, then apply their filters, then send.
    /// A filtered user who left the guild counts as missing.
    async fn deliver(
        &self,
        state: &GuildState,
        entry: &AuditLogEntry,
        recipients: impl IntoIterator<Item = UserId>,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut rendered = None;

        for user in recipients {
            let member = match self.members.resolve_member(entry.guild_id, user).await {
                Ok(Some(member)) => member,
                Ok(None) => {
                    tracing::debug!("User {} left guild {}, skipping", user, entry.guild_id);
                    report.missing_members += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to resolve user {} in guild {}: {}",
                        user,
                        entry.guild_id,
                        e
                    );
                    report.missing_members += 1;
                    continue;
                }
            };

            if !state.permits(user, ListenEventType::AuditLogEntry, &entry.action) {
                tracing::debug!("Filtered {} for user {}", entry.action, user);
                report.filtered += 1;
                continue;
            }

            let message = rendered.get_or_insert_with(|| formatter::render(entry));
            match self.messenger.send_direct(&member, message).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::debug!("Delivery to user {} failed: {}", user, e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}
