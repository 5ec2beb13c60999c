//! Agent stream client
//!
//! Opens the HTTP response whose body is the newline-delimited event stream
//! and hands back its byte chunks. Everything after that point (framing,
//! decoding, reduction) happens in the driver.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::RelayError;

/// Body of an agent response as a stream of raw chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, RelayError>> + Send>>;

/// Request sent to the stream endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub chat_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// Id of the locally echoed user message this turn answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Replay the stored conversation without submitting new input.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub load_only: bool,
}

impl ChatRequest {
    /// A new user turn.
    pub fn message(
        chat_id: impl Into<String>,
        input: impl Into<String>,
        message_id: impl Into<String>,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            input: Some(input.into()),
            message_id: Some(message_id.into()),
            load_only: false,
        }
    }

    /// A history replay.
    pub fn load(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            input: None,
            message_id: None,
            load_only: true,
        }
    }
}

/// Source of agent byte streams.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Open the response stream for `request`.
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, RelayError>;
}

/// reqwest-backed [`ChatTransport`].
#[derive(Debug, Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl AgentClient {
    pub fn new(config: ClientConfig) -> Result<Self, RelayError> {
        let mut builder = reqwest::Client::builder().connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let http = builder.build().map_err(|e| {
            RelayError::ConfigurationError(format!("Failed to build HTTP client: {e}"))
        })?;
        Ok(Self { http, config })
    }

    /// Use a preconfigured reqwest client.
    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl ChatTransport for AgentClient {
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, RelayError> {
        let mut builder = self.http.post(self.config.endpoint.clone()).json(request);
        if let Some(authorization) = self.config.authorization() {
            builder = builder.header(reqwest::header::AUTHORIZATION, authorization);
        }
        for (name, value) in &self.config.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        tracing::debug!(
            chat_id = %request.chat_id,
            load_only = request.load_only,
            "Opening chat stream"
        );
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::api_error(
                status.as_u16(),
                extract_error_message(&body),
            ));
        }
        if status == reqwest::StatusCode::NO_CONTENT {
            return Err(RelayError::MissingBody(format!(
                "agent responded {status} for chat {}",
                request.chat_id
            )));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| RelayError::StreamError(format!("Stream error: {e}"))));
        Ok(Box::pin(stream))
    }
}

/// Prefer the `error` field of a JSON error body; fall back to the raw text.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
