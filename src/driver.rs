//! Stream Driver
//!
//! Pulls chunks from a byte source, pushes them through the
//! [`EventPipeline`], and folds every resulting event into a caller-owned
//! [`MessageReducer`]. This is the only place that awaits I/O.
//!
//! Two modes are offered:
//! - [`StreamDriver::drive`] reports each mutation to an observer together
//!   with an immutable snapshot (live chat view);
//! - [`StreamDriver::drain`] / [`StreamDriver::drain_into`] fold silently
//!   (history replay).
//!
//! A transport error stops the driver and is returned as-is. Whatever was
//! folded before it stays in the reducer.

use futures::{Stream, StreamExt};

use crate::cancel::CancelHandle;
use crate::error::RelayError;
use crate::message::Message;
use crate::observer::{MutationObserver, NoopObserver};
use crate::pipeline::{DriverConfig, EventPipeline, StreamSummary};
use crate::reducer::MessageReducer;

/// Drives one stream to completion.
#[derive(Debug, Clone, Default)]
pub struct StreamDriver {
    config: DriverConfig,
    cancel: Option<CancelHandle>,
}

impl StreamDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Stop promptly once `handle` is cancelled.
    pub fn with_cancel(mut self, handle: CancelHandle) -> Self {
        self.cancel = Some(handle);
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Fold `source` into `reducer`, notifying `observer` after every
    /// mutation.
    pub async fn drive<S, B, E, O>(
        &self,
        source: S,
        reducer: &mut MessageReducer,
        observer: &mut O,
    ) -> Result<StreamSummary, RelayError>
    where
        S: Stream<Item = Result<B, E>> + Unpin,
        B: AsRef<[u8]>,
        E: Into<RelayError>,
        O: MutationObserver + ?Sized,
    {
        self.run(source, reducer, Some(observer)).await
    }

    /// Fold `source` into `reducer` without notifications.
    pub async fn drain_into<S, B, E>(
        &self,
        source: S,
        reducer: &mut MessageReducer,
    ) -> Result<StreamSummary, RelayError>
    where
        S: Stream<Item = Result<B, E>> + Unpin,
        B: AsRef<[u8]>,
        E: Into<RelayError>,
    {
        self.run::<S, B, E, NoopObserver>(source, reducer, None).await
    }

    /// Fold `source` into a fresh list and return it.
    pub async fn drain<S, B, E>(&self, source: S) -> Result<Vec<Message>, RelayError>
    where
        S: Stream<Item = Result<B, E>> + Unpin,
        B: AsRef<[u8]>,
        E: Into<RelayError>,
    {
        let mut reducer = MessageReducer::new();
        self.drain_into(source, &mut reducer).await?;
        Ok(reducer.into_messages())
    }

    async fn run<S, B, E, O>(
        &self,
        mut source: S,
        reducer: &mut MessageReducer,
        mut observer: Option<&mut O>,
    ) -> Result<StreamSummary, RelayError>
    where
        S: Stream<Item = Result<B, E>> + Unpin,
        B: AsRef<[u8]>,
        E: Into<RelayError>,
        O: MutationObserver + ?Sized,
    {
        let mut pipeline = EventPipeline::new(&self.config);
        let mut applied = 0;

        loop {
            let next = match &self.cancel {
                Some(cancel) => tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Ok(self.cancelled(pipeline, applied)),
                    item = source.next() => item,
                },
                None => source.next().await,
            };

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    let err: RelayError = e.into();
                    tracing::warn!(error = %err, applied, "Chat stream failed");
                    return Err(err);
                }
                None => break,
            };

            for event in pipeline.push(chunk.as_ref())? {
                if self.is_cancelled() {
                    return Ok(self.cancelled(pipeline, applied));
                }

                let Some(mutation) = reducer.apply(&event) else {
                    continue;
                };
                applied += 1;

                if let Some(observer) = observer.as_mut() {
                    observer.on_mutation(&mutation, &reducer.snapshot());
                }
            }
        }

        pipeline.finish();
        let mut summary = pipeline.into_summary();
        summary.events_applied = applied;
        tracing::debug!(
            events = summary.events_applied,
            malformed = summary.malformed,
            "Chat stream completed"
        );
        Ok(summary)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelHandle::is_cancelled)
    }

    fn cancelled(&self, pipeline: EventPipeline, applied: usize) -> StreamSummary {
        tracing::debug!(applied, "Chat stream cancelled");
        let mut summary = pipeline.into_summary();
        summary.events_applied = applied;
        summary.cancelled = true;
        summary
    }
}

static_assertions::assert_impl_all!(StreamDriver: Send, Sync, Clone);
