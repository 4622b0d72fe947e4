//! Event types
//!
//! Identifiers, the closed set of listenable event types and filter kinds,
//! and the inbound audit-log record. Wire tags match the persisted blob and
//! the command surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Guild (server) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildId(pub u64);

/// User identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event a member can ask to be notified on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ListenEventType {
    #[serde(rename = "auditlogentry")]
    AuditLogEntry,
}

impl ListenEventType {
    pub const ALL: [ListenEventType; 1] = [ListenEventType::AuditLogEntry];

    /// Wire tag used in commands and the persisted blob
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuditLogEntry => "auditlogentry",
        }
    }
}

impl fmt::Display for ListenEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListenEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|t| t.as_str()).collect();
                format!("event type must be one of: {}", known.join(", "))
            })
    }
}

/// Filter list kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Only listed tokens are delivered (when the list is non-empty)
    #[serde(alias = "whitelist")]
    Allow,
    /// Listed tokens are never delivered
    #[serde(alias = "blacklist")]
    Deny,
}

impl FilterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FilterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" | "whitelist" => Ok(Self::Allow),
            "deny" | "blacklist" => Ok(Self::Deny),
            other => Err(format!(
                "unknown filter kind: {} (expected allow or deny)",
                other
            )),
        }
    }
}

/// Result of toggling a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionToggle {
    Subscribed,
    Unsubscribed,
}

/// Result of toggling a filter token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterToggle {
    Added,
    Removed,
}

/// Broad category of an audit-log action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    Create,
    Update,
    Delete,
    Other,
}

impl ActionCategory {
    /// Derive the category from an action name such as `channel_update`
    pub fn from_action(action: &str) -> Self {
        let action = action.to_ascii_lowercase();
        if action.ends_with("_create") || action.ends_with("_add") {
            Self::Create
        } else if action.ends_with("_update") {
            Self::Update
        } else if action.ends_with("_delete") || action.ends_with("_remove") {
            Self::Delete
        } else {
            Self::Other
        }
    }
}

/// User who performed an audit-logged action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditActor {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
}

/// Object an audit-logged action was applied to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTarget {
    /// Object kind, e.g. `channel`, `role`, `member`
    pub kind: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// One changed attribute with its value before and after the action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeChange {
    pub key: String,
    #[serde(default)]
    pub before: Option<serde_json::Value>,
    #[serde(default)]
    pub after: Option<serde_json::Value>,
}

/// Audit-log entry created in a guild
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: u64,
    pub guild_id: GuildId,
    pub guild_name: String,
    pub actor: AuditActor,
    /// Snake-case action name, e.g. `channel_create`
    pub action: String,
    pub target: AuditTarget,
    #[serde(default)]
    pub changes: Vec<AttributeChange>,
    #[serde(default)]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn category(&self) -> ActionCategory {
        ActionCategory::from_action(&self.action)
    }
}
