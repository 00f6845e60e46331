//! Outbound Slack Web API calls: `views.open`, `chat.postMessage`, `auth.test`.
//!
//! The trait is the seam the flow depends on; the HTTP implementation is the
//! only place that knows about tokens and wire envelopes. Failures are
//! returned to the caller, never swallowed here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use replica_core::config::SlackConfig;

use crate::blocks::{MessageTemplate, ModalView};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChatApiError {
    #[error("chat transport send failed during {operation}: {message}")]
    TransportSendFailure { operation: &'static str, message: String },
    #[error("chat platform rejected {operation}: {error}")]
    PlatformRejected { operation: &'static str, error: String },
}

impl ChatApiError {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::TransportSendFailure { operation, .. }
            | Self::PlatformRejected { operation, .. } => operation,
        }
    }
}

/// Bot's own identity, resolved once at startup and used to suppress
/// self-triggered greetings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotIdentity {
    pub user_id: String,
}

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn auth_identity(&self) -> Result<BotIdentity, ChatApiError>;
    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), ChatApiError>;
    async fn post_message(
        &self,
        channel_id: &str,
        message: &MessageTemplate,
    ) -> Result<(), ChatApiError>;
}

pub struct HttpChatApi {
    client: Client,
    base_url: String,
    bot_token: SecretString,
}

impl HttpChatApi {
    pub fn new(config: &SlackConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: "https://slack.com/api".to_string(),
            bot_token: config.bot_token.clone(),
        })
    }

    async fn call(&self, operation: &'static str, body: Value) -> Result<ApiResponse, ChatApiError> {
        let response = self
            .client
            .post(format!("{}/{operation}", self.base_url))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|error| ChatApiError::TransportSendFailure {
                operation,
                message: error.to_string(),
            })?;

        let parsed: ApiResponse = response.json().await.map_err(|error| {
            ChatApiError::TransportSendFailure { operation, message: error.to_string() }
        })?;

        if !parsed.ok {
            return Err(ChatApiError::PlatformRejected {
                operation,
                error: parsed.error.clone().unwrap_or_else(|| "unknown_error".to_string()),
            });
        }

        Ok(parsed)
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn auth_identity(&self) -> Result<BotIdentity, ChatApiError> {
        let response = self.call("auth.test", json!({})).await?;
        let user_id = response.user_id.ok_or_else(|| ChatApiError::PlatformRejected {
            operation: "auth.test",
            error: "response missing user_id".to_string(),
        })?;

        Ok(BotIdentity { user_id })
    }

    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), ChatApiError> {
        self.call("views.open", open_view_body(trigger_id, view)).await.map(|_| ())
    }

    async fn post_message(
        &self,
        channel_id: &str,
        message: &MessageTemplate,
    ) -> Result<(), ChatApiError> {
        self.call("chat.postMessage", post_message_body(channel_id, message)).await.map(|_| ())
    }
}

fn open_view_body(trigger_id: &str, view: &ModalView) -> Value {
    json!({
        "trigger_id": trigger_id,
        "view": view,
    })
}

fn post_message_body(channel_id: &str, message: &MessageTemplate) -> Value {
    json!({
        "channel": channel_id,
        "text": message.fallback_text,
        "blocks": message.blocks,
    })
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}
