//! Platform seams used by the dispatcher
//!
//! The chat platform owns member lookup and message delivery; the
//! dispatcher only sees these traits.

use crate::dispatch::formatter::RenderedMessage;
use crate::error::Result;
use crate::events::types::{GuildId, UserId};
use async_trait::async_trait;

/// A guild member resolved from the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: UserId,
}

/// Looks up guild members
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Resolve a member; `Ok(None)` when the user is no longer in the guild
    async fn resolve_member(&self, guild: GuildId, user: UserId) -> Result<Option<Member>>;
}

/// Delivers direct messages
#[async_trait]
pub trait DirectMessenger: Send + Sync {
    /// Send a direct message to a member
    async fn send_direct(&self, member: &Member, message: &RenderedMessage) -> Result<()>;
}
