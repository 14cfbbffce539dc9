//! Single-owner store.
//!
//! [`ActorStore`] hands the container to a dedicated Tokio task. Dispatchers
//! send commands through a bounded queue and await a reply, so mutation is
//! confined to one owner rather than arbitrated by a lock. Observation goes
//! through a publisher shared with the owner; it is only locked for the
//! short, non-suspending publish and subscribe steps.
//!
//! The external contract matches [`Store`](super::Store): states are applied
//! in queue order and published in that same order.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use super::action::{StoreAction, StoreState};
use super::container::{Container, Publisher};
use super::reducer::Reducer;
use super::{DispatchMode, ReactiveStore};
use crate::config::ActorConfig;
use crate::error::{Result, StoreError};
use crate::reactive::{Field, ValueStream};

enum Command<S, A> {
    Dispatch {
        action: A,
        reply: oneshot::Sender<S>,
    },
    Refresh,
}

/// A store whose state is owned by a single task.
///
/// The owner task stops once every handle has been dropped.
pub struct ActorStore<S, A> {
    tx: mpsc::Sender<Command<S, A>>,
    publisher: Arc<Mutex<Publisher<S>>>,
}

impl<S, A> ActorStore<S, A>
where
    S: StoreState,
    A: StoreAction,
{
    /// Spawn the owner task with the default configuration.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(reducer: Reducer<S, A>, state: S) -> Self {
        Self::spawn_with_config(reducer, state, ActorConfig::default())
    }

    /// Spawn the owner task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_with_config(reducer: Reducer<S, A>, state: S, config: ActorConfig) -> Self {
        let mailbox = config.mailbox.max(1);
        let (tx, rx) = mpsc::channel(mailbox);
        let publisher = Arc::new(Mutex::new(Publisher::new(state.clone())));
        let container = Container::new(reducer, state);

        tokio::spawn(run(container, Arc::clone(&publisher), rx));
        debug!(mailbox, "spawned actor store");

        Self { tx, publisher }
    }

    /// Re-emit the current state on every stream, ignoring equality.
    ///
    /// Queued behind any dispatches already sent.
    pub async fn refresh(&self) -> Result<()> {
        self.tx
            .send(Command::Refresh)
            .await
            .map_err(|_| StoreError::Closed)
    }
}

async fn run<S, A>(
    mut container: Container<S, A>,
    publisher: Arc<Mutex<Publisher<S>>>,
    mut rx: mpsc::Receiver<Command<S, A>>,
) where
    S: StoreState,
{
    while let Some(command) = rx.recv().await {
        match command {
            // A dispatcher that gave up before its turn cancels the command.
            Command::Dispatch { reply, .. } if reply.is_closed() => {
                trace!("skipping dispatch abandoned by its caller");
            }
            Command::Dispatch { action, reply } => {
                let transition = container.reduce(&action);
                publisher.lock().publish(&transition);
                if reply.send(transition.next).is_err() {
                    trace!("dispatcher went away before the reply");
                }
            }
            Command::Refresh => publisher.lock().refresh(container.state()),
        }
    }
    debug!("actor store owner stopped");
}

impl<S, A> Clone for ActorStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            publisher: Arc::clone(&self.publisher),
        }
    }
}

impl<S, A> ReactiveStore for ActorStore<S, A>
where
    S: StoreState,
    A: StoreAction,
{
    type State = S;
    type Action = A;

    fn state(&self) -> S {
        self.publisher.lock().state()
    }

    fn current_state(&self) -> ValueStream<S> {
        self.publisher.lock().current_state()
    }

    fn observe<V>(&self, field: Field<S, V>) -> Result<ValueStream<V>>
    where
        V: PartialEq + Clone + Send + Sync + 'static,
    {
        self.publisher.lock().observe(field)
    }

    fn observe_reacting<V, R>(
        &self,
        field: Field<S, V>,
        reacting_to: Field<S, R>,
    ) -> Result<ValueStream<V>>
    where
        V: Clone + Send + Sync + 'static,
        R: PartialEq + Send + Sync + 'static,
    {
        self.publisher.lock().observe_reacting(field, reacting_to)
    }

    fn dispatch_mode(&self) -> DispatchMode {
        DispatchMode::Suspending
    }

    fn dispatch(&self, action: A) -> impl Future<Output = Result<S>> + Send {
        async move {
            let (reply, response) = oneshot::channel();
            self.tx
                .send(Command::Dispatch { action, reply })
                .await
                .map_err(|_| StoreError::Closed)?;
            response.await.map_err(|_| StoreError::Closed)
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::reducer::reducer;
    use futures_util::{FutureExt, StreamExt};

    fn adder() -> Reducer<i64, i64> {
        reducer(|n: &i64, total: &i64| {
            assert!(*n >= 0, "negative increments are not allowed");
            total + n
        })
    }

    #[tokio::test]
    async fn dispatch_applies_in_owner_task() {
        let store = ActorStore::spawn(adder(), 0);
        assert_eq!(store.dispatch(2).await.unwrap(), 2);
        assert_eq!(store.dispatch(3).await.unwrap(), 5);
        assert_eq!(store.state(), 5);
    }

    #[tokio::test]
    async fn blocking_dispatch_is_not_offered() {
        let store = ActorStore::spawn(adder(), 0);
        assert_eq!(store.dispatch_mode(), DispatchMode::Suspending);
        assert!(matches!(
            store.dispatch_blocking(1),
            Err(StoreError::UnsupportedCapability)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_dispatches_publish_a_total_order() {
        let store = ActorStore::spawn(adder(), 0);
        let states = store.current_state();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.dispatch(1).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let seen: Vec<i64> = states.take(17).collect().await;
        assert_eq!(seen, (0..=16).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn field_streams_follow_the_owner() {
        let store = ActorStore::spawn(adder(), 1);
        let parity: Field<i64, bool> = Field::new("odd", |n| n % 2 == 1);
        let mut odd = store.observe(parity).unwrap();

        store.dispatch(2).await.unwrap();
        store.dispatch(1).await.unwrap();

        assert_eq!(odd.next().await, Some(true));
        assert_eq!(odd.next().await, Some(false));
        assert_eq!(odd.try_next(), None);
    }

    #[tokio::test]
    async fn refresh_is_queued_behind_dispatches() {
        let store = ActorStore::spawn(adder(), 0);
        let mut states = store.current_state();
        store.dispatch(4).await.unwrap();
        store.refresh().await.unwrap();

        assert_eq!(states.next().await, Some(0));
        assert_eq!(states.next().await, Some(4));
        assert_eq!(states.next().await, Some(4));
    }

    #[tokio::test]
    async fn zero_mailbox_is_raised_to_one() {
        let store = ActorStore::spawn_with_config(adder(), 0, ActorConfig { mailbox: 0 });
        assert_eq!(store.tx.max_capacity(), 1);
        assert_eq!(store.dispatch(2).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn abandoned_dispatch_is_not_applied() {
        let store = ActorStore::spawn(adder(), 0);
        let mut states = store.current_state();

        // Queued, then dropped before the owner task gets to run.
        assert!(store.dispatch(5).now_or_never().is_none());
        assert_eq!(store.dispatch(3).await.unwrap(), 3);

        assert_eq!(states.next().await, Some(0));
        assert_eq!(states.next().await, Some(3));
        assert_eq!(states.try_next(), None);
    }

    #[tokio::test]
    async fn dead_owner_reports_closed() {
        let store = ActorStore::spawn(adder(), 0);

        let err = store.dispatch(-1).await.unwrap_err();
        assert!(matches!(err, StoreError::Closed));

        let err = store.dispatch(1).await.unwrap_err();
        assert!(matches!(err, StoreError::Closed));
    }
}
