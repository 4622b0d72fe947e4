//! Bounded per-guild history of recent audit-log entries
//!
//! Kept in memory only; feeds the replay command.

use crate::events::types::{AuditLogEntry, GuildId};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

/// Most recent audit-log entries per guild, oldest evicted first
pub struct EventHistory {
    capacity: usize,
    entries: RwLock<HashMap<GuildId, VecDeque<AuditLogEntry>>>,
}

impl EventHistory {
    /// Create a history keeping at most `capacity` entries per guild
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record an entry for its guild
    pub async fn record(&self, entry: AuditLogEntry) {
        let mut entries = self.entries.write().await;
        let ring = entries.entry(entry.guild_id).or_default();
        if ring.len() == self.capacity {
            ring.pop_front();
        }
        ring.push_back(entry);
    }

    /// Up to `count` most recent entries for a guild, oldest first
    pub async fn recent(&self, guild: GuildId, count: usize) -> Vec<AuditLogEntry> {
        let entries = self.entries.read().await;
        match entries.get(&guild) {
            Some(ring) => {
                let skip = ring.len().saturating_sub(count);
                ring.iter().skip(skip).cloned().collect()
            }
            None => Vec::new(),
        }
    }
}
