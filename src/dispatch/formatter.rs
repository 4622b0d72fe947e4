//! Audit-log entry rendering
//!
//! Pure conversion of an [`AuditLogEntry`] into a message body. Update
//! actions list each changed attribute as `before → after`; attributes whose
//! values are lists render as added/removed items instead.

use crate::events::types::{ActionCategory, AttributeChange, AuditLogEntry};
use serde_json::{json, Value};

/// Discord embed limits
const EMBED_TITLE_LIMIT: usize = 256;
const EMBED_DESCRIPTION_LIMIT: usize = 4096;

/// Embed accent colour per category
const COLOR_CREATE: u32 = 0x2ecc71;
const COLOR_UPDATE: u32 = 0xf1c40f;
const COLOR_DELETE: u32 = 0xe74c3c;
const COLOR_OTHER: u32 = 0x95a5a6;

/// Message ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub title: String,
    pub target: Option<String>,
    pub attribution: String,
    pub changes: Vec<String>,
    pub reason: Option<String>,
    pub timestamp: String,
    pub color: u32,
}

impl RenderedMessage {
    fn body_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(target) = &self.target {
            lines.push(target.clone());
        }
        lines.push(self.attribution.clone());
        if !self.changes.is_empty() {
            lines.push(String::new());
            lines.extend(self.changes.iter().cloned());
        }
        if let Some(reason) = &self.reason {
            lines.push(String::new());
            lines.push(format!("Reason: {}", reason));
        }
        lines
    }

    /// Plain-text body
    pub fn to_text(&self) -> String {
        let mut text = format!("**{}**\n", self.title);
        text.push_str(&self.body_lines().join("\n"));
        text
    }

    /// Discord embed payload for `POST /channels/{id}/messages`
    pub fn to_embed(&self) -> Value {
        json!({
            "embeds": [{
                "title": truncate(&self.title, EMBED_TITLE_LIMIT),
                "description": truncate(&self.body_lines().join("\n"), EMBED_DESCRIPTION_LIMIT),
                "color": self.color,
                "timestamp": self.timestamp,
            }]
        })
    }
}

/// Render an audit-log entry
pub fn render(entry: &AuditLogEntry) -> RenderedMessage {
    let category = entry.category();

    let attribution = match &entry.actor.name {
        Some(name) => format!("By <@{}> ({})", entry.actor.id, name),
        None => format!("By <@{}>", entry.actor.id),
    };

    let changes = entry
        .changes
        .iter()
        .filter_map(|change| render_change(change, category))
        .collect();

    RenderedMessage {
        title: format!("{} in {}", humanize_action(&entry.action), entry.guild_name),
        target: render_target(entry),
        attribution,
        changes,
        reason: entry
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string),
        timestamp: entry.created_at.to_rfc3339(),
        color: match category {
            ActionCategory::Create => COLOR_CREATE,
            ActionCategory::Update => COLOR_UPDATE,
            ActionCategory::Delete => COLOR_DELETE,
            ActionCategory::Other => COLOR_OTHER,
        },
    }
}

/// `channel_create` → `Channel Create`
pub fn humanize_action(action: &str) -> String {
    action
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_target(entry: &AuditLogEntry) -> Option<String> {
    let target = &entry.target;
    let mut parts = Vec::new();
    if !target.kind.is_empty() {
        parts.push(target.kind.clone());
    }
    if let Some(name) = &target.name {
        parts.push(name.clone());
    }
    if let Some(id) = target.id {
        parts.push(format!("({})", id));
    }
    if parts.is_empty() {
        None
    } else {
        Some(format!("Target: {}", parts.join(" ")))
    }
}

fn render_change(change: &AttributeChange, category: ActionCategory) -> Option<String> {
    let is_list = |v: &Option<Value>| matches!(v, Some(Value::Array(_)));
    if is_list(&change.before) || is_list(&change.after) {
        return render_list_diff(change);
    }
    if category != ActionCategory::Update {
        return None;
    }
    Some(format!(
        "{}: {} → {}",
        change.key,
        display_value(change.before.as_ref()),
        display_value(change.after.as_ref())
    ))
}

fn render_list_diff(change: &AttributeChange) -> Option<String> {
    let before = as_items(change.before.as_ref());
    let after = as_items(change.after.as_ref());

    let added: Vec<String> = after
        .iter()
        .filter(|item| !before.contains(item))
        .map(|item| display_value(Some(item)))
        .collect();
    let removed: Vec<String> = before
        .iter()
        .filter(|item| !after.contains(item))
        .map(|item| display_value(Some(item)))
        .collect();

    if added.is_empty() && removed.is_empty() {
        return None;
    }

    let mut parts = Vec::new();
    if !added.is_empty() {
        parts.push(format!("+[{}]", added.join(", ")));
    }
    if !removed.is_empty() {
        parts.push(format!("-[{}]", removed.join(", ")));
    }
    Some(format!("{}: {}", change.key, parts.join(" ")))
}

fn as_items(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other.clone()],
    }
}

/// Strings unquoted, named objects by name, absent values as `(none)`
fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "(none)".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(map)) => match map.get("name") {
            Some(Value::String(name)) => name.clone(),
            _ => Value::Object(map.clone()).to_string(),
        },
        Some(other) => other.to_string(),
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit.saturating_sub(1)).collect();
    out.push('…');
    out
}
