//! Explicit per-guild state handle
//!
//! A handle is loaded from the config backend, mutated in memory and
//! flushed back as a whole blob. Nothing is cached between handles.

use crate::error::Result;
use crate::events::types::{
    FilterKind, FilterToggle, GuildId, ListenEventType, SubscriptionToggle, UserId,
};
use crate::store::backend::ConfigBackend;
use crate::store::state::GuildState;
use std::sync::Arc;

/// Loaded state of one guild bound to the backend it came from
pub struct GuildHandle {
    guild: GuildId,
    state: GuildState,
    backend: Arc<dyn ConfigBackend>,
    dirty: bool,
}

impl GuildHandle {
    /// Load a guild's state; a guild with no saved blob starts empty
    pub async fn load(backend: Arc<dyn ConfigBackend>, guild: GuildId) -> Result<Self> {
        let state = match backend.load(guild).await? {
            Some(blob) => GuildState::from_blob(&blob),
            None => GuildState::default(),
        };
        Ok(Self {
            guild,
            state,
            backend,
            dirty: false,
        })
    }

    pub fn state(&self) -> &GuildState {
        &self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn toggle_subscription(
        &mut self,
        event_type: ListenEventType,
        user: UserId,
    ) -> SubscriptionToggle {
        self.dirty = true;
        self.state.toggle_subscription(event_type, user)
    }

    pub fn toggle_filter(
        &mut self,
        user: UserId,
        event_type: ListenEventType,
        kind: FilterKind,
        token: &str,
    ) -> Result<FilterToggle> {
        let outcome = self.state.toggle_filter(user, event_type, kind, token)?;
        self.dirty = true;
        Ok(outcome)
    }

    /// Write the whole blob back if anything changed since load or last flush
    pub async fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.backend.save(self.guild, &self.state.to_blob()).await?;
        self.dirty = false;
        Ok(())
    }
}
