//! Lock-confined store.
//!
//! [`Store`] keeps the container and publisher behind one
//! `parking_lot::Mutex`. Each dispatch reduces and publishes inside that
//! critical section, which never suspends, so it is safe to call from any
//! thread or task and the order of published states is the order in which
//! dispatchers acquired the lock.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::action::{StoreAction, StoreState};
use super::container::{Container, Publisher};
use super::reducer::{self, Input, Reducer};
use super::{DispatchMode, ReactiveStore};
use crate::error::Result;
use crate::reactive::{Field, ValueStream};

struct Inner<S, A> {
    container: Container<S, A>,
    publisher: Publisher<S>,
}

/// The base store.
///
/// Cloning a `Store` yields another handle to the same state.
///
/// # Example
///
/// ```rust,ignore
/// let store = Store::reducing(|action: &Action, state: &mut Phase| match action {
///     Action::Start => *state = Phase::Running,
///     Action::Finish => *state = Phase::Finished,
/// }, Phase::Idle);
///
/// assert_eq!(store.dispatch_blocking(Action::Start)?, Phase::Running);
/// ```
pub struct Store<S, A> {
    inner: Arc<Mutex<Inner<S, A>>>,
}

impl<S, A> Store<S, A>
where
    S: StoreState,
    A: StoreAction,
{
    /// Create a store from a reducer and an initial state.
    pub fn new(reducer: Reducer<S, A>, state: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                container: Container::new(reducer, state.clone()),
                publisher: Publisher::new(state),
            })),
        }
    }

    /// Create a store from a closure that mutates the state in place.
    pub fn reducing<F>(f: F, state: S) -> Self
    where
        F: Fn(&A, &mut S) + Send + Sync + 'static,
    {
        Self::new(reducer::reducing(f), state)
    }

    /// Create a store whose initial state is produced by the reducer itself.
    pub fn initializing<F>(f: F) -> Self
    where
        F: Fn(Input<'_, A>, Option<&S>) -> S + Send + Sync + 'static,
    {
        let (reducer, state) = reducer::initializing(f);
        Self::new(reducer, state)
    }

    /// Re-emit the current state on every stream, ignoring equality.
    pub fn refresh(&self) {
        let inner = self.inner.lock();
        debug!("refreshing all streams");
        inner.publisher.refresh(inner.container.state());
    }

    /// Number of channels created so far.
    pub fn channel_count(&self) -> usize {
        self.inner.lock().publisher.channel_count()
    }
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> std::fmt::Debug for Store<S, A>
where
    S: StoreState + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Store")
            .field("state", inner.container.state())
            .field("channel_count", &inner.publisher.channel_count())
            .finish()
    }
}

impl<S, A> ReactiveStore for Store<S, A>
where
    S: StoreState,
    A: StoreAction,
{
    type State = S;
    type Action = A;

    fn state(&self) -> S {
        self.inner.lock().container.state().clone()
    }

    fn current_state(&self) -> ValueStream<S> {
        self.inner.lock().publisher.current_state()
    }

    fn observe<V>(&self, field: Field<S, V>) -> Result<ValueStream<V>>
    where
        V: PartialEq + Clone + Send + Sync + 'static,
    {
        self.inner.lock().publisher.observe(field)
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
        self.inner.lock().publisher.observe_reacting(field, reacting_to)
    }

    fn dispatch_mode(&self) -> DispatchMode {
        DispatchMode::Blocking
    }

    fn dispatch_blocking(&self, action: A) -> Result<S> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let transition = inner.container.reduce(&action);
        inner.publisher.publish(&transition);
        Ok(transition.next)
    }

    fn dispatch(&self, action: A) -> impl Future<Output = Result<S>> + Send {
        async move { self.dispatch_blocking(action) }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
