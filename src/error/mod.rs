//! Error Handling Module
//!
//! This module provides error handling for the relay, including:
//! - Core error types (`RelayError`, `ErrorCategory`, `DecodeError`)
//! - Type conversions from common error types
//!
//! Two failure classes matter to callers. Per-record decode failures are
//! reported as [`DecodeError`] and never abort a stream. Everything else is a
//! [`RelayError`] and means the conversation state may be incomplete.
//!
//! # Example
//!
//! ```rust,ignore
//! use chat_relay::error::{ErrorCategory, RelayError};
//!
//! let error = RelayError::api_error(503, "upstream unavailable");
//! assert_eq!(error.category(), ErrorCategory::Server);
//! assert!(error.is_retryable());
//! ```

mod conversions;
pub mod types;

pub use types::*;
