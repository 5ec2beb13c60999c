//! Type Conversions for RelayError
//!
//! From trait implementations for converting common error types into
//! RelayError.

use super::types::RelayError;

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimeoutError(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::StreamError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        Self::StreamError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: RelayError = json_err.into();
        assert!(matches!(err, RelayError::JsonError(_)));
    }

    #[test]
    fn test_from_io_error_is_stream_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err: RelayError = io_err.into();
        assert!(matches!(err, RelayError::StreamError(ref m) if m.contains("reset by peer")));
        assert!(err.is_transport());
    }
}
