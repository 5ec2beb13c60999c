//! Core error types.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Coarse classification of a [`RelayError`], suitable for UI decisions
/// (for example whether to offer a retry affordance).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Upstream answered with a 4xx status.
    Client,
    /// Upstream answered with a 5xx status.
    Server,
    /// Connection, timeout or mid-stream read failure.
    Network,
    /// The stream violated the framing contract.
    Protocol,
    /// Local configuration is invalid.
    Configuration,
    /// Anything else.
    Internal,
}

/// Errors surfaced by the relay.
///
/// Transport-level variants are always propagated to the caller of the
/// stream driver; messages folded before the failure stay in the reducer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelayError {
    /// Sending the request or reading the body failed.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The request or a body read exceeded a transport timeout.
    #[error("Timeout error: {0}")]
    TimeoutError(String),

    /// The agent service responded with a non-success status.
    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },

    /// The byte source failed after the stream had started.
    #[error("Stream error: {0}")]
    StreamError(String),

    /// No readable body was available for the response.
    #[error("No response body available: {0}")]
    MissingBody(String),

    /// A single record exceeded the framer's line budget.
    #[error("Stream line exceeded {limit} bytes (saw {len})")]
    LineTooLong { len: usize, limit: usize },

    /// JSON (de)serialization failure outside of per-line decoding.
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Invariant violation inside the relay.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl RelayError {
    /// Build an [`RelayError::ApiError`].
    pub fn api_error(status: u16, body: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            body: body.into(),
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError { status, .. } if *status >= 500 => ErrorCategory::Server,
            Self::ApiError { .. } => ErrorCategory::Client,
            Self::HttpError(_)
            | Self::TimeoutError(_)
            | Self::StreamError(_)
            | Self::MissingBody(_) => ErrorCategory::Network,
            Self::LineTooLong { .. } | Self::JsonError(_) => ErrorCategory::Protocol,
            Self::ConfigurationError(_) => ErrorCategory::Configuration,
            Self::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// Whether resending the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ApiError { status, .. } => *status == 429 || *status >= 500,
            Self::HttpError(_) | Self::TimeoutError(_) | Self::StreamError(_) => true,
            _ => false,
        }
    }

    /// True for failures of the byte source itself.
    pub fn is_transport(&self) -> bool {
        matches!(self.category(), ErrorCategory::Network)
    }
}

/// Why a single line could not be turned into a stream event.
///
/// Decode errors are non-fatal: the offending line is dropped and the stream
/// continues.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("malformed stream record: {reason}")]
pub struct DecodeError {
    /// Parser message.
    pub reason: String,
    /// The offending line, verbatim.
    pub line: String,
}
