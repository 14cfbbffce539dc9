//! State Container
//!
//! The container is the single writer: it owns the canonical state and the
//! reducer, and turns each action into a [`Transition`]. The [`Publisher`]
//! owns what observers see, the main state stream and the channel registry,
//! and turns transitions into notifications.
//!
//! The two halves are kept apart so a store variant can decide how each is
//! confined. [`Store`](super::Store) guards both with one lock;
//! [`ActorStore`](super::ActorStore) gives the container to an owner task
//! and shares only the publisher.

use tracing::trace;

use super::action::StoreState;
use super::reducer::Reducer;
use crate::error::Result;
use crate::reactive::{CurrentValue, Field, Registry, ValueStream};

/// The result of applying one action.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    pub next: S,
    pub previous: S,
}

impl<S: PartialEq> Transition<S> {
    pub fn changed(&self) -> bool {
        self.next != self.previous
    }
}

pub(crate) struct Container<S, A> {
    reducer: Reducer<S, A>,
    state: S,
}

impl<S, A> Container<S, A>
where
    S: StoreState,
{
    pub(crate) fn new(reducer: Reducer<S, A>, state: S) -> Self {
        Self { reducer, state }
    }

    pub(crate) fn state(&self) -> &S {
        &self.state
    }

    /// Apply the reducer and store the result as the new state.
    ///
    /// Never suspends.
    pub(crate) fn reduce(&mut self, action: &A) -> Transition<S> {
        let next = (self.reducer)(action, &self.state);
        let previous = std::mem::replace(&mut self.state, next.clone());
        Transition { next, previous }
    }
}

pub(crate) struct Publisher<S> {
    main: CurrentValue<S>,
    registry: Registry<S>,
}

impl<S> Publisher<S>
where
    S: StoreState,
{
    pub(crate) fn new(initial: S) -> Self {
        Self {
            main: CurrentValue::new(initial),
            registry: Registry::new(),
        }
    }

    /// The last published state.
    pub(crate) fn state(&self) -> S {
        self.main.value()
    }

    pub(crate) fn current_state(&self) -> ValueStream<S> {
        self.main.subscribe()
    }

    pub(crate) fn observe<V>(&mut self, field: Field<S, V>) -> Result<ValueStream<V>>
    where
        V: PartialEq + Clone + Send + Sync + 'static,
    {
        let current = self.main.value();
        self.registry.observe(field, &current)
    }

    pub(crate) fn observe_reacting<V, R>(
        &mut self,
        field: Field<S, V>,
        reacting_to: Field<S, R>,
    ) -> Result<ValueStream<V>>
    where
        V: Clone + Send + Sync + 'static,
        R: PartialEq + Send + Sync + 'static,
    {
        let current = self.main.value();
        self.registry.observe_reacting(field, reacting_to, &current)
    }

    /// Publish a transition. Unchanged states publish nothing.
    pub(crate) fn publish(&self, transition: &Transition<S>) {
        if !transition.changed() {
            trace!("state unchanged, nothing published");
            return;
        }
        self.main.send(transition.next.clone());
        let emitted = self
            .registry
            .notify(&transition.next, &transition.previous, false);
        trace!(channels = emitted, "state published");
    }

    /// Re-emit `current` on the main stream and on every channel, ignoring
    /// equality.
    pub(crate) fn refresh(&self, current: &S) {
        self.main.send(current.clone());
        self.registry.notify(current, current, true);
    }

    pub(crate) fn channel_count(&self) -> usize {
        self.registry.len()
    }
}
