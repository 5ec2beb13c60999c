//! Record pipeline
//!
//! Chains the line framer, event decoder and event classifier into a single
//! synchronous step: bytes in, forwardable events out. The stream driver and
//! the [`event_stream`] adapter are both thin async loops around it.

use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::classify::{Disposition, classify};
use crate::decode::decode_event;
use crate::error::RelayError;
use crate::framing::{DEFAULT_MAX_LINE_BYTES, LineFramer};
use crate::wire::{Role, StreamEvent};

/// Stream of forwardable events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, RelayError>> + Send>>;

/// Per-stream options shared by the pipeline and the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Drop `role == user` events; used when the user's input has already
    /// been echoed locally.
    pub skip_user_events: bool,
    /// Line budget handed to the framer (`None` disables it).
    pub max_line_bytes: Option<usize>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            skip_user_events: false,
            max_line_bytes: Some(DEFAULT_MAX_LINE_BYTES),
        }
    }
}

impl DriverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_user_events(mut self, skip: bool) -> Self {
        self.skip_user_events = skip;
        self
    }

    pub fn with_max_line_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_line_bytes = limit;
        self
    }
}

/// Counters describing how a stream was consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Non-blank complete lines seen.
    pub lines: usize,
    /// Events folded into the message list.
    pub events_applied: usize,
    /// Lines dropped because they did not decode.
    pub malformed: usize,
    /// `__state__` / `__cutoff__` records filtered out.
    pub control_records: usize,
    /// User-role events dropped by `skip_user_events`.
    pub skipped_user_events: usize,
    /// Bytes of unterminated tail discarded at end of stream.
    pub discarded_tail_bytes: usize,
    /// The stream was stopped through a cancel handle.
    pub cancelled: bool,
}

/// Framer, decoder and classifier for one stream.
#[derive(Debug, Clone)]
pub struct EventPipeline {
    framer: LineFramer,
    skip_user_events: bool,
    summary: StreamSummary,
}

impl EventPipeline {
    pub fn new(config: &DriverConfig) -> Self {
        Self {
            framer: LineFramer::with_max_line_bytes(config.max_line_bytes),
            skip_user_events: config.skip_user_events,
            summary: StreamSummary::default(),
        }
    }

    /// Feed one chunk and return the events it completed, in order.
    ///
    /// Malformed lines and control records are counted and dropped. Only an
    /// oversized line fails.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<StreamEvent>, RelayError> {
        let lines = self.framer.push(chunk)?;
        let mut events = Vec::with_capacity(lines.len());

        for line in lines {
            self.summary.lines += 1;

            let Some(event) = decode_event(&line) else {
                self.summary.malformed += 1;
                continue;
            };

            if let Disposition::Discard(kind) = classify(&event) {
                tracing::debug!(?kind, "Skipping control record");
                self.summary.control_records += 1;
                continue;
            }

            if self.skip_user_events && event.role == Role::User {
                self.summary.skipped_user_events += 1;
                continue;
            }

            events.push(event);
        }

        Ok(events)
    }

    /// End of input: discard whatever unterminated tail is left.
    pub fn finish(&mut self) {
        let dropped = self.framer.finish();
        if dropped > 0 {
            tracing::debug!(bytes = dropped, "Discarding unterminated trailing record");
        }
        self.summary.discarded_tail_bytes += dropped;
    }

    pub fn summary(&self) -> &StreamSummary {
        &self.summary
    }

    pub fn into_summary(self) -> StreamSummary {
        self.summary
    }
}

/// Turn a byte-chunk stream into a stream of forwardable events.
///
/// The first transport error is yielded and ends the stream.
pub fn event_stream<S, B, E>(source: S, config: DriverConfig) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<RelayError> + Send + 'static,
{
    let mut source = source;
    let out = async_stream::stream! {
        let mut pipeline = EventPipeline::new(&config);

        while let Some(item) = source.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(e.into());
                    return;
                }
            };

            match pipeline.push(chunk.as_ref()) {
                Ok(events) => {
                    for event in events {
                        yield Ok(event);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        pipeline.finish();
    };

    Box::pin(out)
}
