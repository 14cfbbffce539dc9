//! Subscriber types for replay-1 streams.
//!
//! A Subscriber is the producer-side half of one attached stream. The
//! multicast point keeps one per attached [`ValueStream`](super::ValueStream)
//! and drops it as soon as the consumer goes away.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::UnboundedSender;

/// Unique identifier for a subscriber.
///
/// Each attached stream gets a unique ID when it subscribes. The ID is shared
/// between the producer-side [`Subscriber`] and the consumer-side stream so
/// the two can be correlated in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer-side handle for one attached stream.
pub(crate) struct Subscriber<T> {
    id: SubscriberId,
    tx: UnboundedSender<T>,
}

impl<T> Subscriber<T> {
    pub(crate) fn new(id: SubscriberId, tx: UnboundedSender<T>) -> Self {
        Self { id, tx }
    }

    pub(crate) fn id(&self) -> SubscriberId {
        self.id
    }

    /// Deliver a value. Returns `false` once the consumer has detached.
    pub(crate) fn notify(&self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn subscriber_ids_are_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        let id3 = SubscriberId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn notify_reports_detachment() {
        let (tx, mut rx) = unbounded_channel();
        let subscriber = Subscriber::new(SubscriberId::new(), tx);

        assert!(subscriber.notify(1));
        assert_eq!(rx.try_recv().ok(), Some(1));
        assert!(!subscriber.is_detached());

        drop(rx);
        assert!(subscriber.is_detached());
        assert!(!subscriber.notify(2));
    }
}
