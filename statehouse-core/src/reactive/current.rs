//! Current-Value Streams
//!
//! A [`CurrentValue`] is a multicast point that always holds a value. Every
//! stream attached to it first receives that value and then every value sent
//! afterwards, in order. This is "replay-1" semantics: nothing sent after the
//! attach is missed and nothing before it is repeated beyond the replay.
//!
//! # Implementation
//!
//! Each attached stream owns the receiving end of an unbounded queue. The
//! replay value is pushed into the queue under the same lock that `send`
//! takes, so an attach can never fall between a value being stored and it
//! being fanned out. Detached streams are pruned lazily on the next send;
//! a slow consumer never holds up the producer or other subscribers.

use std::fmt::Debug;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::trace;

use super::subscriber::{Subscriber, SubscriberId};

struct Shared<T> {
    value: T,
    subscribers: Vec<Subscriber<T>>,
}

/// A replay-1 multicast point.
///
/// Cloning a `CurrentValue` yields another handle to the same point.
pub struct CurrentValue<T> {
    shared: Arc<Mutex<Shared<T>>>,
}

impl<T> CurrentValue<T>
where
    T: Clone + Send + 'static,
{
    /// Create a new multicast point holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                value,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Get a clone of the latest value.
    pub fn value(&self) -> T {
        self.shared.lock().value.clone()
    }

    /// Store `value` as the latest value and deliver it to every attached
    /// stream.
    pub fn send(&self, value: T) {
        let mut shared = self.shared.lock();
        shared.subscribers.retain(|subscriber| {
            let attached = subscriber.notify(value.clone());
            if !attached {
                trace!(subscriber = subscriber.id().raw(), "pruned detached stream");
            }
            attached
        });
        shared.value = value;
    }

    /// Attach a new stream. It yields the latest value first.
    pub fn subscribe(&self) -> ValueStream<T> {
        let id = SubscriberId::new();
        let (tx, rx) = unbounded_channel();
        let mut shared = self.shared.lock();

        let subscriber = Subscriber::new(id, tx);
        subscriber.notify(shared.value.clone());
        shared.subscribers.retain(|s| !s.is_detached());
        shared.subscribers.push(subscriber);

        ValueStream { id, rx }
    }

    /// Number of attached streams that have not been detached.
    pub fn subscriber_count(&self) -> usize {
        self.shared
            .lock()
            .subscribers
            .iter()
            .filter(|s| !s.is_detached())
            .count()
    }
}

impl<T> Clone for CurrentValue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Debug for CurrentValue<T>
where
    T: Clone + Send + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("CurrentValue")
            .field("value", &shared.value)
            .field("subscriber_count", &shared.subscribers.len())
            .finish()
    }
}

/// Consumer side of a replay-1 stream.
///
/// Dropping the stream detaches it; the producer and other subscribers are
/// unaffected. The stream ends only when the multicast point itself is
/// dropped.
#[derive(Debug)]
pub struct ValueStream<T> {
    id: SubscriberId,
    rx: UnboundedReceiver<T>,
}

impl<T> ValueStream<T> {
    /// The subscriber ID of this stream.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Take a value that is already buffered without waiting.
    pub fn try_next(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> Stream for ValueStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_recv(cx)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
