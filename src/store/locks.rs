//! Per-guild mutual exclusion for load-mutate-flush sequences

use crate::events::types::GuildId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Lazily created async mutex per guild
#[derive(Default)]
pub struct GuildLocks {
    locks: Mutex<HashMap<GuildId, Arc<tokio::sync::Mutex<()>>>>,
}

impl GuildLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a guild's state
    pub async fn acquire(&self, guild: GuildId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(guild).or_default().clone()
        };
        lock.lock_owned().await
    }
}
