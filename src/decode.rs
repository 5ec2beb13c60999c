//! Event decoding
//!
//! Turns one framed line into a [`StreamEvent`]. A line that is not a JSON
//! object of the expected shape is dropped with a warning; it never fails
//! the stream.

use crate::error::DecodeError;
use crate::wire::StreamEvent;

/// Characters of a malformed line kept in the warning.
const LOGGED_LINE_CHARS: usize = 256;

/// Parse a line strictly, returning the reason on failure.
pub fn try_decode_event(line: &str) -> Result<StreamEvent, DecodeError> {
    serde_json::from_str(line).map_err(|e| DecodeError {
        reason: e.to_string(),
        line: line.to_string(),
    })
}

/// Parse a line, logging and discarding it when malformed.
pub fn decode_event(line: &str) -> Option<StreamEvent> {
    match try_decode_event(line) {
        Ok(event) => Some(event),
        Err(e) => {
            let preview: String = e.line.chars().take(LOGGED_LINE_CHARS).collect();
            tracing::warn!(
                line = %preview,
                line_bytes = e.line.len(),
                error = %e.reason,
                "Failed to parse streaming message"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn decodes_valid_line() {
        let event =
            decode_event(r#"{"id":"m1","role":"assistant","content":"hi","sort":1}"#).unwrap();
        assert_eq!(event.id, "m1");
        assert_eq!(event.content, "hi");
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let event = decode_event(" {\"id\":\"m1\",\"sort\":1}\r").unwrap();
        assert_eq!(event.id, "m1");
    }

    #[test]
    fn reports_reason_and_line() {
        let err = try_decode_event("NOT-JSON").unwrap_err();
        assert_eq!(err.line, "NOT-JSON");
        assert!(!err.reason.is_empty());

        let err = try_decode_event("[1,2,3]").unwrap_err();
        assert_eq!(err.line, "[1,2,3]");
    }

    #[traced_test]
    #[test]
    fn malformed_line_is_warned_and_dropped() {
        assert!(decode_event("NOT-JSON").is_none());
        assert!(logs_contain("Failed to parse streaming message"));
        assert!(logs_contain("NOT-JSON"));
    }

    #[traced_test]
    #[test]
    fn warning_truncates_long_lines() {
        let line = format!("NOT-JSON {} END-OF-LINE", "x".repeat(1000));
        assert!(decode_event(&line).is_none());
        assert!(logs_contain("NOT-JSON xxx"));
        assert!(!logs_contain("END-OF-LINE"));
    }
}
