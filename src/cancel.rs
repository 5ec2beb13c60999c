//! Cancellation utilities
//!
//! Provides first-class cancellation handles for a running stream. A
//! cancelled driver stops at its next suspension point, emits no further
//! mutations, and leaves already-applied state in place.

use futures::Stream;
use tokio_util::sync::CancellationToken;

/// A handle that can be used to request cancellation.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Any driver observing this handle stops as soon
    /// as possible; dropping its byte source closes the HTTP connection.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once cancellation is requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// A handle that is cancelled together with this one, but can also be
    /// cancelled on its own without affecting the parent.
    pub fn child(&self) -> CancelHandle {
        CancelHandle {
            token: self.token.child_token(),
        }
    }
}

/// Wrap any stream so that it ends as soon as `handle` is cancelled, even
/// while an item is pending.
pub fn make_cancellable<S>(stream: S, handle: CancelHandle) -> impl Stream<Item = S::Item>
where
    S: Stream + Unpin,
{
    let mut inner = stream;
    async_stream::stream! {
        use futures::StreamExt;
        loop {
            let next = tokio::select! {
                biased;
                _ = handle.cancelled() => break,
                item = inner.next() => item,
            };
            match next {
                Some(item) => yield item,
                None => break,
            }
        }
    }
}
