//! Wire types for the command API
//!
//! All bodies use camelCase JSON.

use crate::dispatch::DispatchReport;
use crate::error::Error;
use crate::events::types::{FilterToggle, SubscriptionToggle};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request body for toggling a subscription
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleSubscriptionRequest {
    pub user_id: u64,
}

/// Result of toggling a subscription
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleSubscriptionResponse {
    pub event_type: String,
    pub user_id: u64,
    pub status: SubscriptionToggle,
    pub message: String,
}

/// Request body for toggling a filter token
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFilterRequest {
    pub user_id: u64,
    pub kind: String,
    pub token: String,
}

/// Result of toggling a filter token
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFilterResponse {
    pub event_type: String,
    pub user_id: u64,
    pub kind: String,
    pub token: String,
    pub status: FilterToggle,
}

/// Subscribers of one event type
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribersResponse {
    pub event_type: String,
    pub subscribers: Vec<u64>,
}

/// A user's subscriptions and filters in a guild
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettingsResponse {
    pub user_id: u64,
    pub subscriptions: Vec<String>,
    /// event type → filter kind → tokens
    pub filters: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

/// Request body for replaying recent events
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRequest {
    pub user_id: u64,
    #[serde(default = "default_replay_count")]
    pub count: usize,
}

fn default_replay_count() -> usize {
    1
}

/// Result of replaying recent events
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayResponse {
    pub replayed: usize,
    pub report: DispatchReport,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

/// API error detail
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn with_code(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_code("BAD_REQUEST", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_code("FORBIDDEN", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_code("INTERNAL_ERROR", message)
    }
}

/// Handler failure carrying its HTTP status
#[derive(Debug)]
pub struct ApiFailure {
    pub status: StatusCode,
    pub body: ApiError,
}

impl ApiFailure {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ApiError::bad_request(message),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            body: ApiError::forbidden(message),
        }
    }
}

impl From<Error> for ApiFailure {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidInput(message) => Self::bad_request(message),
            other => {
                tracing::warn!("Command failed: {}", other);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: ApiError::internal(other.to_string()),
                }
            }
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}
