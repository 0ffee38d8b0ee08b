//! Slack notification tool.
//!
//! Posts a message to one fixed channel via `chat.postMessage`. The
//! success wording (`sent message to slack`) is part of the contract the
//! agent parses for confirmation — do not reword it.

use async_trait::async_trait;
use concierge_core::error::ToolError;
use concierge_core::tool::{Tool, ToolResult};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Failures a notification backend can report.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("Slack API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Something that can post a message to a named channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), NotifyError>;
}

/// Slack Web API client.
pub struct SlackClient {
    token: String,
    base_url: String,
    client: reqwest::Client,
}

impl SlackClient {
    pub fn new(token: impl Into<String>) -> Result<Self, NotifyError> {
        Self::with_base_url(token, "https://slack.com/api")
    }

    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        Ok(Self {
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}

#[async_trait]
impl Notifier for SlackClient {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/chat.postMessage", self.base_url);
        debug!(%channel, text_len = text.len(), "Posting Slack message");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&serde_json::json!({ "channel": channel, "text": text }))
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Api(format!(
                "chat.postMessage returned status {}",
                response.status().as_u16()
            )));
        }

        let body: PostMessageResponse = response
            .json()
            .await
            .map_err(|e| NotifyError::Api(e.to_string()))?;

        if !body.ok {
            return Err(NotifyError::Api(
                body.error.unwrap_or_else(|| "unknown error".into()),
            ));
        }
        Ok(())
    }
}

/// The `send_slack_message` tool.
pub struct SlackTool {
    notifier: Arc<dyn Notifier>,
    channel: String,
}

impl SlackTool {
    pub fn new(notifier: Arc<dyn Notifier>, channel: impl Into<String>) -> Self {
        Self {
            notifier,
            channel: channel.into(),
        }
    }
}

#[async_trait]
impl Tool for SlackTool {
    fn name(&self) -> &str {
        "send_slack_message"
    }

    fn description(&self) -> &str {
        "Send a message to a Slack channel."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The message to send"
                }
            },
            "required": ["message"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolResult, ToolError> {
        let message = arguments["message"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'message' argument".into()))?;

        println!("Sending message to Slack 📤: {message}");

        let (success, output) = match self.notifier.post_message(&self.channel, message).await {
            Ok(()) => (
                true,
                serde_json::json!({ "message": "sent message to slack" }).to_string(),
            ),
            Err(e) => (false, serde_json::json!({ "error": e.to_string() }).to_string()),
        };

        Ok(ToolResult {
            call_id: String::new(),
            success,
            output,
            agent: None,
        })
    }
}
