//! Wire records
//!
//! One [`StreamEvent`] is carried per line of the agent's `text/plain`
//! response body. Decoding is deliberately lenient about absent fields and
//! strict about wrongly typed ones: only `id` is required, while a `role`
//! outside `user`/`assistant` or a non-numeric `sort` rejects the record.
//! A `null` `sort` counts as `0`.

use serde::{Deserialize, Deserializer, Serialize};

/// Reserved id of the full-state snapshot record.
pub const STATE_SNAPSHOT_ID: &str = "__state__";

/// Reserved id of the stream-truncation marker.
pub const CUTOFF_ID: &str = "__cutoff__";

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[default]
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool invocation attached to a stream record.
///
/// A later record with the same id and a populated `result` supersedes the
/// earlier one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallPayload {
    pub name: String,
    /// Tool arguments. Structured JSON sent by the producer is re-encoded
    /// as a compact string.
    #[serde(default, deserialize_with = "string_or_json")]
    pub input: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_string_or_json"
    )]
    pub result: Option<String>,
}

impl ToolCallPayload {
    pub fn new(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            result: None,
        }
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    /// The result, treating an empty string as absent.
    pub fn populated_result(&self) -> Option<&str> {
        self.result.as_deref().filter(|r| !r.is_empty())
    }
}

/// A single decoded record of the agent stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEvent {
    pub id: String,
    #[serde(default)]
    pub role: Role,
    /// Full text, or an incremental fragment when `is_delta` is set.
    #[serde(default, deserialize_with = "nullable_string")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_delta: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_in_process: Option<bool>,
    #[serde(default, deserialize_with = "nullable_f64")]
    pub sort: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_path: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_structured_response: Option<bool>,
    /// Conversation snapshot, only populated on the `__state__` record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCallPayload>,
}

impl StreamEvent {
    /// Create a full (non-delta) record.
    pub fn new(id: impl Into<String>, role: Role, content: impl Into<String>, sort: f64) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
            is_delta: None,
            is_in_process: None,
            sort,
            thinking: None,
            graph_path: None,
            is_structured_response: None,
            state: None,
            tool_call: None,
        }
    }

    pub fn assistant(id: impl Into<String>, content: impl Into<String>, sort: f64) -> Self {
        Self::new(id, Role::Assistant, content, sort)
    }

    pub fn user(id: impl Into<String>, content: impl Into<String>, sort: f64) -> Self {
        Self::new(id, Role::User, content, sort)
    }

    pub fn with_delta(mut self, is_delta: bool) -> Self {
        self.is_delta = Some(is_delta);
        self
    }

    pub fn with_in_process(mut self, is_in_process: bool) -> Self {
        self.is_in_process = Some(is_in_process);
        self
    }

    pub fn with_tool_call(mut self, tool_call: ToolCallPayload) -> Self {
        self.tool_call = Some(tool_call);
        self
    }

    pub fn with_thinking(mut self, thinking: impl Into<String>) -> Self {
        self.thinking = Some(thinking.into());
        self
    }

    pub fn is_delta(&self) -> bool {
        self.is_delta.unwrap_or(false)
    }

    pub fn is_in_process(&self) -> bool {
        self.is_in_process.unwrap_or(false)
    }

    /// True for the reserved control ids that are never rendered.
    pub fn is_sentinel(&self) -> bool {
        self.id == STATE_SNAPSHOT_ID || self.id == CUTOFF_ID
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn nullable_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn string_or_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

fn optional_string_or_json<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}
