//! Mutation observers
//!
//! Hooks invoked by the stream driver after every change to the message
//! list. Observers only ever see immutable snapshots; the live list stays
//! owned by the driver's caller.

use tokio::sync::watch;

use crate::reducer::{Mutation, Snapshot};

/// Receives every mutation applied during a live stream.
pub trait MutationObserver {
    fn on_mutation(&mut self, mutation: &Mutation, snapshot: &Snapshot);
}

impl<F> MutationObserver for F
where
    F: FnMut(&Mutation, &Snapshot),
{
    fn on_mutation(&mut self, mutation: &Mutation, snapshot: &Snapshot) {
        self(mutation, snapshot)
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl MutationObserver for NoopObserver {
    fn on_mutation(&mut self, _mutation: &Mutation, _snapshot: &Snapshot) {}
}

/// Publishes each snapshot on a `tokio::sync::watch` channel, so readers on
/// other tasks always see the latest consistent list.
#[derive(Debug)]
pub struct WatchPublisher {
    tx: watch::Sender<Snapshot>,
}

impl WatchPublisher {
    /// Create a publisher seeded with `initial` and its receiver.
    pub fn channel(initial: Snapshot) -> (Self, watch::Receiver<Snapshot>) {
        let (tx, rx) = watch::channel(initial);
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }
}

impl MutationObserver for WatchPublisher {
    fn on_mutation(&mut self, _mutation: &Mutation, snapshot: &Snapshot) {
        // send_replace keeps publishing even when every receiver is gone.
        self.tx.send_replace(snapshot.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::{MessageReducer, MutationKind};
    use crate::wire::StreamEvent;

    #[test]
    fn closures_are_observers() {
        let mut seen = Vec::new();
        {
            let mut observer = |m: &Mutation, s: &Snapshot| seen.push((m.kind, s.len()));
            let mut reducer = MessageReducer::new();
            let mutation = reducer.apply(&StreamEvent::assistant("m1", "a", 1.0)).unwrap();
            observer.on_mutation(&mutation, &reducer.snapshot());
        }
        assert_eq!(seen, vec![(MutationKind::Inserted, 1)]);
    }

    #[tokio::test]
    async fn watch_publisher_delivers_latest_snapshot() {
        let mut reducer = MessageReducer::new();
        let (mut publisher, mut rx) = WatchPublisher::channel(reducer.snapshot());
        assert!(rx.borrow().is_empty());

        let mutation = reducer.apply(&StreamEvent::assistant("m1", "a", 1.0)).unwrap();
        publisher.on_mutation(&mutation, &reducer.snapshot());

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update()[0].id, "m1");
    }

    #[test]
    fn publishing_without_receivers_does_not_panic() {
        let reducer = MessageReducer::new();
        let (mut publisher, rx) = WatchPublisher::channel(reducer.snapshot());
        drop(rx);
        let mutation = Mutation {
            id: "m1".into(),
            kind: MutationKind::Inserted,
        };
        publisher.on_mutation(&mutation, &reducer.snapshot());
        assert!(publisher.subscribe().borrow().is_empty());
    }
}
