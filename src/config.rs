//! Client configuration
//!
//! Connection settings for the agent stream endpoint. The bearer token is
//! minted elsewhere and handed in ready to use; it is kept in a
//! [`SecretString`] so it never appears in `Debug` output.

use std::collections::HashMap;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::RelayError;

/// Environment variable holding the stream endpoint URL.
pub const ENDPOINT_ENV: &str = "CHAT_RELAY_ENDPOINT";
/// Environment variable holding the bearer token.
pub const TOKEN_ENV: &str = "CHAT_RELAY_TOKEN";
/// Environment variable holding the request timeout in seconds.
pub const TIMEOUT_ENV: &str = "CHAT_RELAY_TIMEOUT_SECS";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct ClientConfig {
    /// Full URL of the stream-chat-state endpoint.
    pub endpoint: reqwest::Url,
    pub bearer_token: Option<SecretString>,
    /// Whole-request timeout. Streams can be long, so there is none by
    /// default.
    pub timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub headers: HashMap<String, String>,
    pub user_agent: Option<String>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("has_bearer_token", &self.bearer_token.is_some())
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Create a configuration for `endpoint`.
    pub fn new(endpoint: &str) -> Result<Self, RelayError> {
        let endpoint = reqwest::Url::parse(endpoint).map_err(|e| {
            RelayError::ConfigurationError(format!("Invalid endpoint URL '{endpoint}': {e}"))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(RelayError::ConfigurationError(format!(
                "Unsupported endpoint scheme '{}'",
                endpoint.scheme()
            )));
        }

        Ok(Self {
            endpoint,
            bearer_token: None,
            timeout: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            headers: HashMap::new(),
            user_agent: None,
        })
    }

    /// Load from `CHAT_RELAY_ENDPOINT`, `CHAT_RELAY_TOKEN` and
    /// `CHAT_RELAY_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, RelayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup(ENDPOINT_ENV).ok_or_else(|| {
            RelayError::ConfigurationError(format!("Missing required variable {ENDPOINT_ENV}"))
        })?;
        let mut config = Self::new(&endpoint)?;

        if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.is_empty()) {
            config = config.with_bearer_token(token);
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                RelayError::ConfigurationError(format!(
                    "{TIMEOUT_ENV} must be a whole number of seconds, got '{raw}'"
                ))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(SecretString::from(token.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// The `Authorization` header value, if a token is set.
    pub(crate) fn authorization(&self) -> Option<String> {
        self.bearer_token
            .as_ref()
            .map(|t| format!("Bearer {}", t.expose_secret()))
    }
}
