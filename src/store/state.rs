//! Per-guild subscription and filter state
//!
//! `GuildState` is the typed in-memory form; `GuildBlob` is the persisted
//! form handed to the config backend. Empty sets and maps are pruned on
//! every mutation, so an absent entry and an empty one are the same thing.

use crate::error::{Error, Result};
use crate::events::types::{FilterKind, FilterToggle, ListenEventType, SubscriptionToggle, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Filter lists of one user, by event type then kind
pub type UserFilters = BTreeMap<ListenEventType, BTreeMap<FilterKind, BTreeSet<String>>>;

/// Subscriptions and filters of a single guild
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuildState {
    subscriptions: BTreeMap<ListenEventType, BTreeSet<UserId>>,
    filters: BTreeMap<UserId, UserFilters>,
}

impl GuildState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty() && self.filters.is_empty()
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Subscribe the user if absent, unsubscribe if present
    pub fn toggle_subscription(
        &mut self,
        event_type: ListenEventType,
        user: UserId,
    ) -> SubscriptionToggle {
        let users = self.subscriptions.entry(event_type).or_default();
        let outcome = if users.remove(&user) {
            SubscriptionToggle::Unsubscribed
        } else {
            users.insert(user);
            SubscriptionToggle::Subscribed
        };
        if users.is_empty() {
            self.subscriptions.remove(&event_type);
        }
        outcome
    }

    /// Users subscribed to an event type
    pub fn subscribers(&self, event_type: ListenEventType) -> BTreeSet<UserId> {
        self.subscriptions
            .get(&event_type)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_subscribed(&self, event_type: ListenEventType, user: UserId) -> bool {
        self.subscriptions
            .get(&event_type)
            .is_some_and(|users| users.contains(&user))
    }

    /// Event types a user is subscribed to
    pub fn subscriptions_of(&self, user: UserId) -> BTreeSet<ListenEventType> {
        self.subscriptions
            .iter()
            .filter(|(_, users)| users.contains(&user))
            .map(|(event_type, _)| *event_type)
            .collect()
    }

    // =========================================================================
    // Filters
    // =========================================================================

    /// Add the token to the user's list if absent, remove it if present
    pub fn toggle_filter(
        &mut self,
        user: UserId,
        event_type: ListenEventType,
        kind: FilterKind,
        token: &str,
    ) -> Result<FilterToggle> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::InvalidInput("filter token must not be empty".to_string()));
        }

        let by_event = self.filters.entry(user).or_default();
        let by_kind = by_event.entry(event_type).or_default();
        let tokens = by_kind.entry(kind).or_default();

        let outcome = if tokens.remove(token) {
            FilterToggle::Removed
        } else {
            tokens.insert(token.to_string());
            FilterToggle::Added
        };

        if tokens.is_empty() {
            by_kind.remove(&kind);
        }
        if by_kind.is_empty() {
            by_event.remove(&event_type);
        }
        if by_event.is_empty() {
            self.filters.remove(&user);
        }

        Ok(outcome)
    }

    fn filter_tokens(
        &self,
        user: UserId,
        event_type: ListenEventType,
        kind: FilterKind,
    ) -> Option<&BTreeSet<String>> {
        self.filters
            .get(&user)
            .and_then(|by_event| by_event.get(&event_type))
            .and_then(|by_kind| by_kind.get(&kind))
    }

    /// Whether the user's deny list for the event type holds this exact token
    pub fn matches(&self, user: UserId, event_type: ListenEventType, token: &str) -> bool {
        self.filter_tokens(user, event_type, FilterKind::Deny)
            .is_some_and(|tokens| tokens.contains(token))
    }

    /// Whether an event carrying `token` should reach the user.
    ///
    /// Deny wins. A non-empty allow list restricts delivery to its tokens.
    pub fn permits(&self, user: UserId, event_type: ListenEventType, token: &str) -> bool {
        if self.matches(user, event_type, token) {
            return false;
        }
        match self.filter_tokens(user, event_type, FilterKind::Allow) {
            Some(allowed) if !allowed.is_empty() => allowed.contains(token),
            _ => true,
        }
    }

    /// All filter lists of a user
    pub fn filters_of(&self, user: UserId) -> UserFilters {
        self.filters.get(&user).cloned().unwrap_or_default()
    }

    // =========================================================================
    // Persisted form
    // =========================================================================

    pub fn to_blob(&self) -> GuildBlob {
        let subscriptions = self
            .subscriptions
            .iter()
            .map(|(event_type, users)| {
                (
                    event_type.as_str().to_string(),
                    users.iter().map(|u| u.0).collect(),
                )
            })
            .collect();

        let filters = self
            .filters
            .iter()
            .map(|(user, by_event)| {
                let by_event = by_event
                    .iter()
                    .map(|(event_type, by_kind)| {
                        let by_kind = by_kind
                            .iter()
                            .map(|(kind, tokens)| {
                                (kind.as_str().to_string(), tokens.iter().cloned().collect())
                            })
                            .collect();
                        (event_type.as_str().to_string(), by_kind)
                    })
                    .collect();
                (user.0.to_string(), by_event)
            })
            .collect();

        GuildBlob {
            subscriptions,
            filters,
        }
    }

    /// Rebuild typed state from a blob. Unknown tags and malformed user keys
    /// are dropped with a warning so one bad entry never hides the rest.
    pub fn from_blob(blob: &GuildBlob) -> Self {
        let mut state = Self::default();

        for (tag, users) in &blob.subscriptions {
            let Ok(event_type) = tag.parse::<ListenEventType>() else {
                tracing::warn!("Ignoring subscriptions for unknown event type '{}'", tag);
                continue;
            };
            let set: BTreeSet<UserId> = users.iter().copied().map(UserId).collect();
            if !set.is_empty() {
                state.subscriptions.entry(event_type).or_default().extend(set);
            }
        }

        for (user_key, by_event) in &blob.filters {
            let Ok(user) = user_key.parse::<u64>().map(UserId) else {
                tracing::warn!("Ignoring filters for malformed user id '{}'", user_key);
                continue;
            };
            for (tag, by_kind) in by_event {
                let Ok(event_type) = tag.parse::<ListenEventType>() else {
                    tracing::warn!("Ignoring filters for unknown event type '{}'", tag);
                    continue;
                };
                for (kind_key, tokens) in by_kind {
                    let Ok(kind) = kind_key.parse::<FilterKind>() else {
                        tracing::warn!("Ignoring unknown filter kind '{}'", kind_key);
                        continue;
                    };
                    let tokens: BTreeSet<String> = tokens
                        .iter()
                        .map(|t| t.trim())
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect();
                    if tokens.is_empty() {
                        continue;
                    }
                    state
                        .filters
                        .entry(user)
                        .or_default()
                        .entry(event_type)
                        .or_default()
                        .entry(kind)
                        .or_default()
                        .extend(tokens);
                }
            }
        }

        state
    }
}

/// Persisted per-guild blob
///
/// ```json
/// {
///   "subscriptions": { "auditlogentry": [123, 456] },
///   "filters": { "123": { "auditlogentry": { "deny": ["channel_create"] } } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildBlob {
    #[serde(default)]
    pub subscriptions: BTreeMap<String, Vec<u64>>,
    #[serde(default)]
    pub filters: BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<String>>>>,
}
