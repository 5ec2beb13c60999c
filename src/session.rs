//! Chat session
//!
//! Owns the message list of one open chat view and runs the two flows a
//! view needs: sending a user turn (with a local echo) and replaying stored
//! history. Sessions share nothing with each other.

use std::collections::HashSet;

use crate::cancel::CancelHandle;
use crate::client::{ChatRequest, ChatTransport};
use crate::driver::StreamDriver;
use crate::error::RelayError;
use crate::message::Message;
use crate::observer::{MutationObserver, NoopObserver};
use crate::pipeline::{DriverConfig, StreamSummary};
use crate::reducer::{MessageReducer, Snapshot};

/// Result of [`ChatSession::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(StreamSummary),
    /// The chat was loaded (or is loading) already; nothing was requested.
    AlreadyLoaded,
}

pub struct ChatSession<T> {
    transport: T,
    reducer: MessageReducer,
    /// Chats whose history load has started, so a repeated mount does not
    /// load twice. Failed loads are removed again to allow a retry.
    loaded_chats: HashSet<String>,
    config: DriverConfig,
    cancel: Option<CancelHandle>,
}

/// Fresh id for a chat that does not exist yet.
pub fn new_chat_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl<T: ChatTransport> ChatSession<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, DriverConfig::default())
    }

    pub fn with_config(transport: T, config: DriverConfig) -> Self {
        Self {
            transport,
            reducer: MessageReducer::new(),
            loaded_chats: HashSet::new(),
            config,
            cancel: None,
        }
    }

    /// Stop any running stream once `handle` is cancelled.
    pub fn with_cancel(mut self, handle: CancelHandle) -> Self {
        self.cancel = Some(handle);
        self
    }

    /// Send `input` as a new user turn and stream the reply.
    ///
    /// The input is echoed locally first, so user-role events coming back on
    /// the stream are ignored. On failure an assistant message carrying the
    /// error text is appended and the error is returned. Blank input is
    /// ignored and yields `Ok(None)`.
    pub async fn send<O>(
        &mut self,
        chat_id: &str,
        input: &str,
        observer: &mut O,
    ) -> Result<Option<StreamSummary>, RelayError>
    where
        O: MutationObserver + ?Sized,
    {
        if input.trim().is_empty() {
            return Ok(None);
        }

        let echo = Message::user_input(input, self.reducer.next_local_sort());
        let request = ChatRequest::message(chat_id, input, echo.id.clone());
        let mutation = self.reducer.insert_local(echo);
        observer.on_mutation(&mutation, &self.reducer.snapshot());

        let driver = self.driver(self.config.clone().with_skip_user_events(true));
        let result = match self.transport.open(&request).await {
            Ok(source) => driver.drive(source, &mut self.reducer, &mut *observer).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(summary) => Ok(Some(summary)),
            Err(err) => {
                tracing::error!(chat_id, error = %err, "Chat send failed");
                let mutation = self.reducer.push_error(err.to_string());
                observer.on_mutation(&mutation, &self.reducer.snapshot());
                Err(err)
            }
        }
    }

    /// Replay the stored history of `chat_id` into this session, silently.
    pub async fn load(&mut self, chat_id: &str) -> Result<LoadOutcome, RelayError> {
        if !self.loaded_chats.insert(chat_id.to_string()) {
            tracing::debug!(chat_id, "Chat already loaded, skipping");
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        let driver = self.driver(self.config.clone());
        let result = match self.transport.open(&ChatRequest::load(chat_id)).await {
            Ok(source) => driver.drain_into(source, &mut self.reducer).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(summary) => Ok(LoadOutcome::Loaded(summary)),
            Err(err) => {
                tracing::error!(chat_id, error = %err, "Failed to load chat");
                self.loaded_chats.remove(chat_id);
                Err(err)
            }
        }
    }

    /// Same as [`ChatSession::send`] without live notifications.
    pub async fn send_quiet(
        &mut self,
        chat_id: &str,
        input: &str,
    ) -> Result<Option<StreamSummary>, RelayError> {
        self.send(chat_id, input, &mut NoopObserver).await
    }

    pub fn is_loaded(&self, chat_id: &str) -> bool {
        self.loaded_chats.contains(chat_id)
    }

    pub fn messages(&self) -> &[Message] {
        self.reducer.messages()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.reducer.snapshot()
    }

    /// Forget the displayed messages. Loaded chat ids are kept.
    pub fn clear(&mut self) {
        self.reducer.clear();
    }

    fn driver(&self, config: DriverConfig) -> StreamDriver {
        let driver = StreamDriver::new(config);
        match &self.cancel {
            Some(cancel) => driver.with_cancel(cancel.clone()),
            None => driver,
        }
    }
}
