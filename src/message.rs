//! Display-ready messages
//!
//! A [`Message`] is the reduced, renderable unit produced from one or more
//! [`StreamEvent`]s sharing an id.

use serde::{Deserialize, Serialize};

use crate::wire::{Role, StreamEvent};

/// Typed content part.
///
/// Streamed messages always carry exactly one `Text` part; other kinds can
/// be inserted locally by the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    Text { text: String },
    Code { text: String },
    Image { image: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Text of a `Text` part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Function name and arguments of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Tool call attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    /// Always `"function"` for streamed tool calls.
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

/// Reduced conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: Vec<ContentPart>,
    /// Sole ordering key of the message list.
    pub sort: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_delta: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_in_process: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_path: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_structured_response: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    /// Plain text message with no stream flags.
    pub fn new(id: impl Into<String>, role: Role, text: impl Into<String>, sort: f64) -> Self {
        Self {
            id: id.into(),
            role,
            content: vec![ContentPart::text(text)],
            sort,
            is_delta: None,
            is_in_process: None,
            thinking: None,
            graph_path: None,
            is_structured_response: None,
            tool_calls: None,
        }
    }

    /// Locally echoed user input, id `<unix millis>-message`.
    pub fn user_input(text: impl Into<String>, sort: f64) -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        Self::new(format!("{millis}-message"), Role::User, text, sort)
    }

    /// Assistant message carrying an error text, id `error-<unix millis>`,
    /// sorted by the same timestamp so it lands at the end.
    pub fn error_notice(text: impl Into<String>) -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        Self::new(format!("error-{millis}"), Role::Assistant, text, millis as f64)
    }

    /// Project a stream event into a standalone message.
    pub fn from_event(event: &StreamEvent) -> Self {
        let tool_calls = event.tool_call.as_ref().map(|tc| {
            vec![ToolCall {
                id: event.id.clone(),
                kind: "function".to_string(),
                function: FunctionCall {
                    name: tc.name.clone(),
                    arguments: tc.input.clone(),
                },
                result: tc.populated_result().map(str::to_string),
            }]
        });

        Self {
            id: event.id.clone(),
            role: event.role,
            content: vec![ContentPart::text(event.content.clone())],
            sort: event.sort,
            is_delta: event.is_delta,
            is_in_process: event.is_in_process,
            thinking: event.thinking.clone(),
            graph_path: event.graph_path.clone(),
            is_structured_response: event.is_structured_response,
            tool_calls,
        }
    }

    /// Text of the message when its sole content part is text.
    pub fn text(&self) -> Option<&str> {
        match self.content.as_slice() {
            [part] => part.as_text(),
            _ => None,
        }
    }

    pub fn is_in_process(&self) -> bool {
        self.is_in_process.unwrap_or(false)
    }
}

impl From<&StreamEvent> for Message {
    fn from(event: &StreamEvent) -> Self {
        Message::from_event(event)
    }
}

impl From<StreamEvent> for Message {
    fn from(event: StreamEvent) -> Self {
        Message::from_event(&event)
    }
}
