//! Flattened digest of an event stream.
//!
//! Useful for non-interactive callers that only want the assistant's final
//! text together with the reasoning and tool activity that led to it.

use futures::{Stream, StreamExt};

use crate::error::RelayError;
use crate::wire::{Role, StreamEvent, ToolCallPayload};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseSummary {
    /// Concatenated assistant delta text.
    pub content: String,
    /// Every non-empty `thinking` string, in arrival order.
    pub thinking: Vec<String>,
    /// Every tool call payload, in arrival order.
    pub tool_calls: Vec<ToolCallPayload>,
    /// The forwarded events themselves.
    pub events: Vec<StreamEvent>,
}

impl ResponseSummary {
    pub fn from_events(events: impl IntoIterator<Item = StreamEvent>) -> Self {
        let mut summary = Self::default();
        for event in events {
            summary.push(event);
        }
        summary
    }

    /// Consume an event stream (see [`crate::pipeline::event_stream`]),
    /// stopping at the first error.
    pub async fn collect<S>(mut stream: S) -> Result<Self, RelayError>
    where
        S: Stream<Item = Result<StreamEvent, RelayError>> + Unpin,
    {
        let mut summary = Self::default();
        while let Some(event) = stream.next().await {
            summary.push(event?);
        }
        Ok(summary)
    }

    pub fn push(&mut self, event: StreamEvent) {
        if event.role == Role::Assistant && event.is_delta() && !event.content.is_empty() {
            self.content.push_str(&event.content);
        }
        if let Some(thinking) = event.thinking.as_ref().filter(|t| !t.is_empty()) {
            self.thinking.push(thinking.clone());
        }
        if let Some(tool_call) = &event.tool_call {
            self.tool_calls.push(tool_call.clone());
        }
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{DriverConfig, event_stream};

    #[test]
    fn folds_deltas_thinking_and_tools() {
        let summary = ResponseSummary::from_events(vec![
            StreamEvent::user("u1", "question", 0.0).with_delta(true),
            StreamEvent::assistant("a1", "", 1.0).with_thinking("look up data"),
            StreamEvent::assistant("t1", "", 2.0)
                .with_tool_call(ToolCallPayload::new("query", "{}").with_result("[]")),
            StreamEvent::assistant("a2", "The answer", 3.0).with_delta(true),
            StreamEvent::assistant("a2", " is 42.", 3.0).with_delta(true),
            StreamEvent::assistant("a2", "The answer is 42.", 3.0).with_delta(false),
        ]);

        assert_eq!(summary.content, "The answer is 42.");
        assert_eq!(summary.thinking, vec!["look up data"]);
        assert_eq!(summary.tool_calls.len(), 1);
        assert_eq!(summary.tool_calls[0].result.as_deref(), Some("[]"));
        assert_eq!(summary.events.len(), 6);
    }

    #[tokio::test]
    async fn collects_from_event_stream() {
        let chunks: Vec<Result<&'static [u8], RelayError>> = vec![Ok(
            b"{\"id\":\"a1\",\"content\":\"hi\",\"isDelta\":true,\"sort\":1}\n{\"id\":\"__state__\"}\n"
                .as_slice(),
        )];
        let stream = event_stream(futures::stream::iter(chunks), DriverConfig::default());
        let summary = ResponseSummary::collect(stream).await.unwrap();
        assert_eq!(summary.content, "hi");
        assert_eq!(summary.events.len(), 1);
    }
}
