//! HTTP handlers for the command API
//!
//! - GET  /health
//! - PUT  /api/v1/guilds/:guild_id/subscriptions/:event_type  # toggle subscription
//! - GET  /api/v1/guilds/:guild_id/subscriptions/:event_type  # list subscribers
//! - GET  /api/v1/guilds/:guild_id/users/:user_id  # a user's subscriptions and filters
//! - PUT  /api/v1/guilds/:guild_id/filters/:event_type  # toggle filter token
//! - POST /api/v1/guilds/:guild_id/events/:event_type  # ingest and dispatch an event
//! - POST /api/v1/guilds/:guild_id/events/:event_type/replay  # replay recent events to a user
//!
//! Mutating commands hold the guild lock across load, mutate and flush.

use crate::api::types::*;
use crate::config::DiscordConfig;
use crate::dispatch::{DispatchReport, Dispatcher};
use crate::events::types::{AuditLogEntry, FilterKind, GuildId, ListenEventType, SubscriptionToggle, UserId};
use crate::events::EventHistory;
use crate::store::{ConfigBackend, GuildHandle, GuildLocks};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;

/// Shared state for command handlers
#[derive(Clone)]
pub struct NotifyState {
    pub discord: Arc<DiscordConfig>,
    pub backend: Arc<dyn ConfigBackend>,
    pub dispatcher: Arc<Dispatcher>,
    pub history: Arc<EventHistory>,
    pub locks: Arc<GuildLocks>,
}

impl NotifyState {
    pub fn new(
        discord: DiscordConfig,
        backend: Arc<dyn ConfigBackend>,
        dispatcher: Arc<Dispatcher>,
        history_capacity: usize,
    ) -> Self {
        Self {
            discord: Arc::new(discord),
            backend,
            dispatcher,
            history: Arc::new(EventHistory::new(history_capacity)),
            locks: Arc::new(GuildLocks::new()),
        }
    }

    fn check_guild(&self, guild: GuildId) -> Result<(), ApiFailure> {
        if self.discord.is_guild_allowed(guild.0) {
            Ok(())
        } else {
            Err(ApiFailure::forbidden(format!("Guild {} is not allowed", guild)))
        }
    }
}

/// Create the command router
pub fn notify_router(state: NotifyState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/v1/guilds/:guild_id/subscriptions/:event_type",
            put(toggle_subscription).get(list_subscribers),
        )
        .route("/api/v1/guilds/:guild_id/users/:user_id", get(user_settings))
        .route(
            "/api/v1/guilds/:guild_id/filters/:event_type",
            put(toggle_filter),
        )
        .route("/api/v1/guilds/:guild_id/events/:event_type", post(ingest_event))
        .route(
            "/api/v1/guilds/:guild_id/events/:event_type/replay",
            post(replay_events),
        )
        .with_state(state)
}

fn parse_event_type(raw: &str) -> Result<ListenEventType, ApiFailure> {
    raw.parse::<ListenEventType>().map_err(ApiFailure::bad_request)
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// PUT /api/v1/guilds/:guild_id/subscriptions/:event_type
async fn toggle_subscription(
    State(state): State<NotifyState>,
    Path((guild_id, event_type)): Path<(u64, String)>,
    Json(request): Json<ToggleSubscriptionRequest>,
) -> Result<Json<ToggleSubscriptionResponse>, ApiFailure> {
    let guild = GuildId(guild_id);
    state.check_guild(guild)?;
    let event_type = parse_event_type(&event_type)?;
    let user = UserId(request.user_id);

    let _guard = state.locks.acquire(guild).await;
    let mut handle = GuildHandle::load(state.backend.clone(), guild).await?;
    let status = handle.toggle_subscription(event_type, user);
    handle.flush().await?;

    tracing::info!("User {} {:?} on {} in guild {}", user, status, event_type, guild);

    let message = match status {
        SubscriptionToggle::Subscribed => format!("Will notify you on {}", event_type),
        SubscriptionToggle::Unsubscribed => format!("Will no longer notify you on {}", event_type),
    };

    Ok(Json(ToggleSubscriptionResponse {
        event_type: event_type.to_string(),
        user_id: user.0,
        status,
        message,
    }))
}

/// GET /api/v1/guilds/:guild_id/subscriptions/:event_type
async fn list_subscribers(
    State(state): State<NotifyState>,
    Path((guild_id, event_type)): Path<(u64, String)>,
) -> Result<Json<SubscribersResponse>, ApiFailure> {
    let guild = GuildId(guild_id);
    state.check_guild(guild)?;
    let event_type = parse_event_type(&event_type)?;

    let handle = GuildHandle::load(state.backend.clone(), guild).await?;
    let subscribers = handle
        .state()
        .subscribers(event_type)
        .into_iter()
        .map(|u| u.0)
        .collect();

    Ok(Json(SubscribersResponse {
        event_type: event_type.to_string(),
        subscribers,
    }))
}

/// GET /api/v1/guilds/:guild_id/users/:user_id
async fn user_settings(
    State(state): State<NotifyState>,
    Path((guild_id, user_id)): Path<(u64, u64)>,
) -> Result<Json<UserSettingsResponse>, ApiFailure> {
    let guild = GuildId(guild_id);
    state.check_guild(guild)?;
    let user = UserId(user_id);

    let handle = GuildHandle::load(state.backend.clone(), guild).await?;
    let subscriptions = handle
        .state()
        .subscriptions_of(user)
        .into_iter()
        .map(|t| t.to_string())
        .collect();
    let filters = handle
        .state()
        .filters_of(user)
        .into_iter()
        .map(|(event_type, by_kind)| {
            let by_kind = by_kind
                .into_iter()
                .map(|(kind, tokens)| (kind.to_string(), tokens.into_iter().collect()))
                .collect();
            (event_type.to_string(), by_kind)
        })
        .collect();

    Ok(Json(UserSettingsResponse {
        user_id: user.0,
        subscriptions,
        filters,
    }))
}

/// PUT /api/v1/guilds/:guild_id/filters/:event_type
async fn toggle_filter(
    State(state): State<NotifyState>,
    Path((guild_id, event_type)): Path<(u64, String)>,
    Json(request): Json<ToggleFilterRequest>,
) -> Result<Json<ToggleFilterResponse>, ApiFailure> {
    let guild = GuildId(guild_id);
    state.check_guild(guild)?;
    let event_type = parse_event_type(&event_type)?;
    let kind = request
        .kind
        .parse::<FilterKind>()
        .map_err(ApiFailure::bad_request)?;
    let user = UserId(request.user_id);

    let _guard = state.locks.acquire(guild).await;
    let mut handle = GuildHandle::load(state.backend.clone(), guild).await?;
    let status = handle.toggle_filter(user, event_type, kind, &request.token)?;
    handle.flush().await?;

    tracing::info!(
        "User {} {:?} {} token '{}' for {} in guild {}",
        user,
        status,
        kind,
        request.token.trim(),
        event_type,
        guild
    );

    Ok(Json(ToggleFilterResponse {
        event_type: event_type.to_string(),
        user_id: user.0,
        kind: kind.to_string(),
        token: request.token.trim().to_string(),
        status,
    }))
}

/// POST /api/v1/guilds/:guild_id/events/:event_type
async fn ingest_event(
    State(state): State<NotifyState>,
    Path((guild_id, event_type)): Path<(u64, String)>,
    Json(entry): Json<AuditLogEntry>,
) -> Result<Json<DispatchReport>, ApiFailure> {
    let guild = GuildId(guild_id);
    state.check_guild(guild)?;
    match parse_event_type(&event_type)? {
        ListenEventType::AuditLogEntry => {}
    }
    if entry.guild_id != guild {
        return Err(ApiFailure::bad_request(format!(
            "Entry belongs to guild {}, not {}",
            entry.guild_id, guild
        )));
    }

    state.history.record(entry.clone()).await;

    let handle = GuildHandle::load(state.backend.clone(), guild).await?;
    let report = state
        .dispatcher
        .dispatch_audit_entry(handle.state(), &entry)
        .await;

    tracing::info!(
        "Dispatched {} in guild {}: {} delivered, {} filtered",
        entry.action,
        guild,
        report.delivered,
        report.filtered
    );

    Ok(Json(report))
}

/// POST /api/v1/guilds/:guild_id/events/:event_type/replay
async fn replay_events(
    State(state): State<NotifyState>,
    Path((guild_id, event_type)): Path<(u64, String)>,
    Json(request): Json<ReplayRequest>,
) -> Result<Json<ReplayResponse>, ApiFailure> {
    let guild = GuildId(guild_id);
    state.check_guild(guild)?;
    match parse_event_type(&event_type)? {
        ListenEventType::AuditLogEntry => {}
    }
    let count = request.count.min(state.history.capacity());
    let user = UserId(request.user_id);

    let entries = state.history.recent(guild, count).await;
    let handle = GuildHandle::load(state.backend.clone(), guild).await?;
    let report = state
        .dispatcher
        .replay_to(handle.state(), user, &entries)
        .await;

    tracing::info!(
        "Replayed {} event(s) in guild {} to user {}",
        entries.len(),
        guild,
        user
    );

    Ok(Json(ReplayResponse {
        replayed: entries.len(),
        report,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::dispatcher::tests::{make_entry, FakeDirectory, RecordingMessenger};
    use crate::store::MemoryBackend;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        backend: Arc<dyn ConfigBackend>,
        messenger: Arc<RecordingMessenger>,
    }

    fn make_app_with(discord: DiscordConfig) -> TestApp {
        let backend: Arc<dyn ConfigBackend> = Arc::new(MemoryBackend::new());
        let messenger = Arc::new(RecordingMessenger::default());
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(FakeDirectory::default()),
            messenger.clone(),
        ));
        let state = NotifyState::new(discord, backend.clone(), dispatcher, 10);
        TestApp {
            router: notify_router(state),
            backend,
            messenger,
        }
    }

    fn make_app() -> TestApp {
        make_app_with(DiscordConfig::default())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 64)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn send(
        app: &TestApp,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> axum::response::Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.router.clone().oneshot(request).await.unwrap()
    }

    async fn post_event(app: &TestApp, action: &str) -> serde_json::Value {
        let entry = serde_json::to_value(make_entry(10, action)).unwrap();
        let resp = send(
            app,
            "POST",
            "/api/v1/guilds/10/events/auditlogentry",
            Some(entry),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        body_json(resp).await
    }

    #[tokio::test]
    async fn test_health() {
        let app = make_app();
        let resp = send(&app, "GET", "/health", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_toggle_subscription_round_trip() {
        let app = make_app();
        let uri = "/api/v1/guilds/10/subscriptions/auditlogentry";

        let resp = send(&app, "PUT", uri, Some(serde_json::json!({"userId": 7}))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "subscribed");
        assert_eq!(json["message"], "Will notify you on auditlogentry");

        let resp = send(&app, "GET", uri, None).await;
        assert_eq!(body_json(resp).await["subscribers"], serde_json::json!([7]));

        let resp = send(&app, "PUT", uri, Some(serde_json::json!({"userId": 7}))).await;
        assert_eq!(body_json(resp).await["status"], "unsubscribed");

        let resp = send(&app, "GET", uri, None).await;
        assert_eq!(body_json(resp).await["subscribers"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_unknown_event_type_rejected_without_mutation() {
        let app = make_app();
        let resp = send(
            &app,
            "PUT",
            "/api/v1/guilds/10/subscriptions/memberjoin",
            Some(serde_json::json!({"userId": 7})),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("auditlogentry"));
        assert!(app.backend.load(GuildId(10)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disallowed_guild_forbidden() {
        let app = make_app_with(DiscordConfig {
            allowed_guilds: vec![1],
            ..DiscordConfig::default()
        });
        let resp = send(
            &app,
            "PUT",
            "/api/v1/guilds/10/subscriptions/auditlogentry",
            Some(serde_json::json!({"userId": 7})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(app.backend.load(GuildId(10)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_toggle_filter_validation() {
        let app = make_app();
        let uri = "/api/v1/guilds/10/filters/auditlogentry";

        let resp = send(
            &app,
            "PUT",
            uri,
            Some(serde_json::json!({"userId": 7, "kind": "greylist", "token": "kick"})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = send(
            &app,
            "PUT",
            uri,
            Some(serde_json::json!({"userId": 7, "kind": "deny", "token": "  "})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(app.backend.load(GuildId(10)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_settings_lists_subscriptions_and_filters() {
        let app = make_app();
        send(
            &app,
            "PUT",
            "/api/v1/guilds/10/subscriptions/auditlogentry",
            Some(serde_json::json!({"userId": 7})),
        )
        .await;
        let resp = send(
            &app,
            "PUT",
            "/api/v1/guilds/10/filters/auditlogentry",
            Some(serde_json::json!({"userId": 7, "kind": "blacklist", "token": "kick"})),
        )
        .await;
        let json = body_json(resp).await;
        assert_eq!(json["status"], "added");
        assert_eq!(json["kind"], "deny");

        let resp = send(&app, "GET", "/api/v1/guilds/10/users/7", None).await;
        let json = body_json(resp).await;
        assert_eq!(json["subscriptions"], serde_json::json!(["auditlogentry"]));
        assert_eq!(
            json["filters"]["auditlogentry"]["deny"],
            serde_json::json!(["kick"])
        );

        let resp = send(&app, "GET", "/api/v1/guilds/10/users/8", None).await;
        let json = body_json(resp).await;
        assert_eq!(json["subscriptions"], serde_json::json!([]));
        assert_eq!(json["filters"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_event_delivery_follows_filters() {
        let app = make_app();
        send(
            &app,
            "PUT",
            "/api/v1/guilds/10/subscriptions/auditlogentry",
            Some(serde_json::json!({"userId": 7})),
        )
        .await;

        let report = post_event(&app, "channel_create").await;
        assert_eq!(report["delivered"], 1);

        let filter = serde_json::json!({"userId": 7, "kind": "deny", "token": "channel_create"});
        let uri = "/api/v1/guilds/10/filters/auditlogentry";
        send(&app, "PUT", uri, Some(filter.clone())).await;
        let report = post_event(&app, "channel_create").await;
        assert_eq!(report["delivered"], 0);
        assert_eq!(report["filtered"], 1);

        send(&app, "PUT", uri, Some(filter)).await;
        let report = post_event(&app, "channel_create").await;
        assert_eq!(report["delivered"], 1);

        assert_eq!(app.messenger.deliveries_to(UserId(7)), 2);
    }

    #[tokio::test]
    async fn test_event_for_other_guild_rejected() {
        let app = make_app();
        let entry = serde_json::to_value(make_entry(11, "kick")).unwrap();
        let resp = send(
            &app,
            "POST",
            "/api/v1/guilds/10/events/auditlogentry",
            Some(entry),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_replay_recent_events() {
        let app = make_app();
        post_event(&app, "kick").await;
        post_event(&app, "channel_create").await;
        post_event(&app, "role_update").await;

        send(
            &app,
            "PUT",
            "/api/v1/guilds/10/subscriptions/auditlogentry",
            Some(serde_json::json!({"userId": 7})),
        )
        .await;

        let resp = send(
            &app,
            "POST",
            "/api/v1/guilds/10/events/auditlogentry/replay",
            Some(serde_json::json!({"userId": 7, "count": 2})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["replayed"], 2);
        assert_eq!(json["report"]["delivered"], 2);
        assert_eq!(app.messenger.deliveries_to(UserId(7)), 2);

        // Count beyond capacity is clamped to what history holds
        let resp = send(
            &app,
            "POST",
            "/api/v1/guilds/10/events/auditlogentry/replay",
            Some(serde_json::json!({"userId": 7, "count": 500})),
        )
        .await;
        assert_eq!(body_json(resp).await["replayed"], 3);
    }

    #[tokio::test]
    async fn test_replay_zero_events_delivers_nothing() {
        let app = make_app();
        send(
            &app,
            "PUT",
            "/api/v1/guilds/10/subscriptions/auditlogentry",
            Some(serde_json::json!({"userId": 7})),
        )
        .await;
        post_event(&app, "kick").await;
        assert_eq!(app.messenger.deliveries_to(UserId(7)), 1);

        let resp = send(
            &app,
            "POST",
            "/api/v1/guilds/10/events/auditlogentry/replay",
            Some(serde_json::json!({"userId": 7, "count": 0})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["replayed"], 0);
        assert_eq!(json["report"]["delivered"], 0);
        assert_eq!(app.messenger.deliveries_to(UserId(7)), 1);
    }
}
