//! # chat-relay
//!
//! Client-side consumer for conversational-agent chat streams. An agent
//! answers a chat turn with an HTTP response whose body is newline-delimited
//! JSON; each line is a partial or complete update to one message. This
//! crate turns that byte stream into an ordered, de-duplicated message list.
#![deny(unsafe_code)]

//! ## Pipeline
//!
//! ```text
//! bytes -> LineFramer -> decode_event -> classify -> MessageReducer
//!                      (StreamDriver runs the loop and notifies observers)
//! ```
//!
//! - [`framing`] reassembles lines across arbitrary chunk boundaries.
//! - [`decode`] parses one line, logging and skipping malformed ones.
//! - [`classify`] filters the `__state__` / `__cutoff__` control records.
//! - [`reducer`] merges events by id: delta text is appended, everything
//!   else replaces the stored message; the list stays sorted by `sort`.
//! - [`driver`] pulls chunks, supports cancellation, and reports each
//!   mutation with an immutable snapshot.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chat_relay::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::from_env()?;
//!     let mut session = ChatSession::new(AgentClient::new(config)?);
//!
//!     let chat_id = new_chat_id();
//!     let mut print = |_: &Mutation, snapshot: &Snapshot| {
//!         if let Some(text) = snapshot.last().and_then(|m| m.text()) {
//!             println!("{text}");
//!         }
//!     };
//!     session.send(&chat_id, "How many orders shipped last week?", &mut print).await?;
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod classify;
pub mod client;
pub mod config;
pub mod decode;
pub mod driver;
pub mod error;
pub mod framing;
pub mod message;
pub mod observer;
pub mod pipeline;
pub mod reducer;
pub mod session;
pub mod summary;
pub mod telemetry;
pub mod wire;

pub use error::{RelayError, Result};

/// Common imports.
pub mod prelude {
    pub use crate::cancel::{CancelHandle, make_cancellable};
    pub use crate::classify::{ControlKind, Disposition, EventShape, classify};
    pub use crate::client::{AgentClient, ByteStream, ChatRequest, ChatTransport};
    pub use crate::config::ClientConfig;
    pub use crate::decode::{decode_event, try_decode_event};
    pub use crate::driver::StreamDriver;
    pub use crate::error::{DecodeError, ErrorCategory, RelayError};
    pub use crate::framing::LineFramer;
    pub use crate::message::{ContentPart, FunctionCall, Message, ToolCall};
    pub use crate::observer::{MutationObserver, NoopObserver, WatchPublisher};
    pub use crate::pipeline::{DriverConfig, EventPipeline, EventStream, StreamSummary, event_stream};
    pub use crate::reducer::{MessageReducer, Mutation, MutationKind, Snapshot};
    pub use crate::session::{ChatSession, LoadOutcome, new_chat_id};
    pub use crate::summary::ResponseSummary;
    pub use crate::wire::{CUTOFF_ID, Role, STATE_SNAPSHOT_ID, StreamEvent, ToolCallPayload};
}
