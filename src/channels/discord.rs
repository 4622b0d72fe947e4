//! Discord REST client
//!
//! Resolves guild members and delivers direct messages through the Discord
//! HTTP API. Gateway events are received elsewhere.

use super::adapter::{DirectMessenger, Member, MemberDirectory};
use crate::config::DiscordConfig;
use crate::dispatch::formatter::RenderedMessage;
use crate::error::{Error, Result};
use crate::events::types::{GuildId, UserId};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Discord REST client implementing the member and delivery seams
pub struct DiscordClient {
    api_base: String,
    bot_token: String,
    client: reqwest::Client,
    dm_channels: RwLock<HashMap<UserId, String>>,
}

impl DiscordClient {
    /// Create a client with an explicit token
    pub fn new(api_base: impl Into<String>, bot_token: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            client: reqwest::Client::new(),
            dm_channels: RwLock::new(HashMap::new()),
        }
    }

    /// Create a client, resolving the bot token from the configured env var
    pub fn from_config(config: &DiscordConfig) -> Result<Self> {
        let token = Self::resolve_credential(&config.bot_token_ref)?;
        Ok(Self::new(config.api_base.clone(), token))
    }

    /// Resolve credential from environment variable
    fn resolve_credential(credential_ref: &str) -> Result<String> {
        std::env::var(credential_ref).map_err(|_| {
            Error::Config(format!(
                "Failed to resolve Discord bot token from env var: {}",
                credential_ref
            ))
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.bot_token)
    }

    /// Open (or reuse) the DM channel with a user
    async fn dm_channel(&self, user: UserId) -> Result<String> {
        if let Some(id) = self.dm_channels.read().await.get(&user) {
            return Ok(id.clone());
        }

        let response = self
            .client
            .post(self.url("/users/@me/channels"))
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "recipient_id": user.to_string() }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Delivery(format!(
                "Failed to open DM channel with {}: {}",
                user,
                api_error_message(response).await
            )));
        }

        let channel: DiscordChannel = response
            .json()
            .await
            .map_err(|e| Error::Platform(format!("Failed to parse DM channel response: {}", e)))?;

        self.dm_channels
            .write()
            .await
            .insert(user, channel.id.clone());
        Ok(channel.id)
    }
}

#[async_trait]
impl MemberDirectory for DiscordClient {
    async fn resolve_member(&self, guild: GuildId, user: UserId) -> Result<Option<Member>> {
        let response = self
            .client
            .get(self.url(&format!("/guilds/{}/members/{}", guild, user)))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::Platform(format!(
                "Failed to fetch member {} of guild {}: {}",
                user,
                guild,
                api_error_message(response).await
            )));
        }

        Ok(Some(Member { id: user }))
    }
}

#[async_trait]
impl DirectMessenger for DiscordClient {
    async fn send_direct(&self, member: &Member, message: &RenderedMessage) -> Result<()> {
        let channel_id = self.dm_channel(member.id).await?;

        tracing::debug!(
            "Sending DM to {} via channel {}: {}",
            member.id,
            channel_id,
            message.title
        );

        let response = self
            .client
            .post(self.url(&format!("/channels/{}/messages", channel_id)))
            .header("Authorization", self.auth_header())
            .json(&message.to_embed())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Delivery(format!(
                "Discord refused DM to {}: {}",
                member.id,
                api_error_message(response).await
            )));
        }

        Ok(())
    }
}

/// Best-effort extraction of Discord's `{"message", "code"}` error body
async fn api_error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<DiscordApiError>().await {
        Ok(err) => format!("{} ({} code {})", err.message, status, err.code),
        Err(_) => status.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct DiscordApiError {
    message: String,
    #[serde(default)]
    code: u64,
}

#[derive(Debug, Deserialize)]
struct DiscordChannel {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::formatter::RenderedMessage;
    use axum::{
        extract::{Path, State},
        http::StatusCode as AxumStatus,
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MockDiscord {
        opened: Arc<Mutex<Vec<String>>>,
        posted: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    }

    async fn get_member(Path((_guild, user)): Path<(u64, u64)>) -> impl IntoResponse {
        if user == 1 {
            (
                AxumStatus::OK,
                Json(serde_json::json!({
                    "user": {"id": "1", "username": "ferris", "global_name": "Ferris"},
                    "nick": null
                })),
            )
        } else {
            (
                AxumStatus::NOT_FOUND,
                Json(serde_json::json!({"message": "Unknown Member", "code": 10007})),
            )
        }
    }

    async fn open_dm(
        State(mock): State<MockDiscord>,
        Json(body): Json<serde_json::Value>,
    ) -> impl IntoResponse {
        let recipient = body["recipient_id"].as_str().unwrap_or_default().to_string();
        mock.opened.lock().unwrap().push(recipient.clone());
        Json(serde_json::json!({ "id": format!("dm-{}", recipient) }))
    }

    async fn post_message(
        State(mock): State<MockDiscord>,
        Path(channel): Path<String>,
        Json(body): Json<serde_json::Value>,
    ) -> impl IntoResponse {
        if channel == "dm-2" {
            return (
                AxumStatus::FORBIDDEN,
                Json(serde_json::json!({
                    "message": "Cannot send messages to this user",
                    "code": 50007
                })),
            );
        }
        mock.posted.lock().unwrap().push((channel, body));
        (AxumStatus::OK, Json(serde_json::json!({"id": "msg-1"})))
    }

    async fn start_mock() -> (String, MockDiscord) {
        let mock = MockDiscord::default();
        let app = Router::new()
            .route("/guilds/:guild/members/:user", get(get_member))
            .route("/users/@me/channels", post(open_dm))
            .route("/channels/:channel/messages", post(post_message))
            .with_state(mock.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), mock)
    }

    fn sample_message() -> RenderedMessage {
        RenderedMessage {
            title: "Channel Create in Test".to_string(),
            target: None,
            attribution: "By <@9>".to_string(),
            changes: vec![],
            reason: None,
            timestamp: "2024-02-12T16:00:00+00:00".to_string(),
            color: 0,
        }
    }

    #[test]
    fn test_from_config_missing_token() {
        let config = DiscordConfig {
            bot_token_ref: "NOTIFYMEON_TEST_TOKEN_THAT_IS_NOT_SET".to_string(),
            ..DiscordConfig::default()
        };
        let err = DiscordClient::from_config(&config).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_api_base_trailing_slash() {
        let client = DiscordClient::new("http://localhost/api/", "t");
        assert_eq!(client.url("/users/@me"), "http://localhost/api/users/@me");
        assert_eq!(client.auth_header(), "Bot t");
    }

    #[tokio::test]
    async fn test_resolve_member() {
        let (base, _mock) = start_mock().await;
        let client = DiscordClient::new(base, "token");

        let member = client
            .resolve_member(GuildId(10), UserId(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(member.id, UserId(1));

        let missing = client.resolve_member(GuildId(10), UserId(5)).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_send_direct_reuses_dm_channel() {
        let (base, mock) = start_mock().await;
        let client = DiscordClient::new(base, "token");
        let member = Member { id: UserId(1) };

        client.send_direct(&member, &sample_message()).await.unwrap();
        client.send_direct(&member, &sample_message()).await.unwrap();

        assert_eq!(mock.opened.lock().unwrap().len(), 1);
        let posted = mock.posted.lock().unwrap();
        assert_eq!(posted.len(), 2);
        assert_eq!(posted[0].0, "dm-1");
        assert_eq!(posted[0].1["embeds"][0]["title"], "Channel Create in Test");
    }

    #[tokio::test]
    async fn test_send_direct_refused_is_delivery_error() {
        let (base, _mock) = start_mock().await;
        let client = DiscordClient::new(base, "token");
        let member = Member { id: UserId(2) };

        let err = client
            .send_direct(&member, &sample_message())
            .await
            .unwrap_err();
        match err {
            Error::Delivery(msg) => assert!(msg.contains("50007")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
