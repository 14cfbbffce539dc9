//! Stores
//!
//! A store composes a state container with a publisher behind the
//! [`ReactiveStore`] capability interface: a snapshot of the state, a
//! replay-1 stream of it, field-scoped streams, and dispatch.
//!
//! Decorators such as [`Effects`](crate::effect::Effects) and
//! [`Persistent`](crate::persist::Persistent) implement the same trait and
//! wrap anything that implements it, so they nest in any order.
//!
//! # Dispatch capabilities
//!
//! A store advertises how it can be dispatched to through
//! [`ReactiveStore::dispatch_mode`]. [`Store`] mutates under a lock and
//! dispatches without suspending; [`ActorStore`] and the decorators suspend.
//! [`ReadOnly`] offers no dispatch at all. Decorators check the mode of the
//! store they wrap and fail with
//! [`StoreError::UnsupportedCapability`] when there is nothing to call.

use std::future::Future;
use std::sync::Arc;

use tracing::trace;

mod action;
mod reducer;
mod container;
mod base;
mod actor;
mod readonly;

pub use action::{AnyAction, StoreAction, StoreState};
pub use reducer::{initializing, reducer, reducing, with_context, Input, Reducer};
pub use container::Transition;
pub use base::Store;
pub use actor::ActorStore;
pub use readonly::ReadOnly;

use crate::error::{Result, StoreError};
use crate::reactive::{Field, ValueStream};

/// How a store accepts actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// `dispatch_blocking` applies the action without suspending.
    Blocking,
    /// `dispatch` must be awaited.
    Suspending,
    /// The store cannot be dispatched to.
    Unsupported,
}

/// The capability set shared by stores and decorators.
pub trait ReactiveStore: Send + Sync {
    type State: StoreState;
    type Action: StoreAction;

    /// Snapshot of the current state.
    fn state(&self) -> Self::State;

    /// Replay-1 stream of the state. Emits only on effective changes.
    fn current_state(&self) -> ValueStream<Self::State>;

    /// Replay-1 stream of one field, emitting when its projection changes.
    fn observe<V>(&self, field: Field<Self::State, V>) -> Result<ValueStream<V>>
    where
        V: PartialEq + Clone + Send + Sync + 'static;

    /// Replay-1 stream of `field`, emitting when `reacting_to` changes.
    fn observe_reacting<V, R>(
        &self,
        field: Field<Self::State, V>,
        reacting_to: Field<Self::State, R>,
    ) -> Result<ValueStream<V>>
    where
        V: Clone + Send + Sync + 'static,
        R: PartialEq + Send + Sync + 'static;

    fn dispatch_mode(&self) -> DispatchMode;

    /// Apply an action without suspending.
    fn dispatch_blocking(&self, action: Self::Action) -> Result<Self::State> {
        let _ = action;
        Err(StoreError::UnsupportedCapability)
    }

    /// Apply an action, suspending as needed.
    fn dispatch(&self, action: Self::Action) -> impl Future<Output = Result<Self::State>> + Send {
        let _ = action;
        std::future::ready(Err(StoreError::UnsupportedCapability))
    }
}

/// Dispatch to `store` through whichever capability it advertises,
/// preferring the suspending one.
pub(crate) async fn dispatch_inner<St>(store: &St, action: St::Action) -> Result<St::State>
where
    St: ReactiveStore,
{
    match store.dispatch_mode() {
        DispatchMode::Suspending => store.dispatch(action).await,
        DispatchMode::Blocking => store.dispatch_blocking(action),
        DispatchMode::Unsupported => {
            trace!("wrapped store has no dispatch capability");
            Err(StoreError::UnsupportedCapability)
        }
    }
}

impl<T> ReactiveStore for Arc<T>
where
    T: ReactiveStore,
{
    type State = T::State;
    type Action = T::Action;

    fn state(&self) -> Self::State {
        (**self).state()
    }

    fn current_state(&self) -> ValueStream<Self::State> {
        (**self).current_state()
    }

    fn observe<V>(&self, field: Field<Self::State, V>) -> Result<ValueStream<V>>
    where
        V: PartialEq + Clone + Send + Sync + 'static,
    {
        (**self).observe(field)
    }

    fn observe_reacting<V, R>(
        &self,
        field: Field<Self::State, V>,
        reacting_to: Field<Self::State, R>,
    ) -> Result<ValueStream<V>>
    where
        V: Clone + Send + Sync + 'static,
        R: PartialEq + Send + Sync + 'static,
    {
        (**self).observe_reacting(field, reacting_to)
    }

    fn dispatch_mode(&self) -> DispatchMode {
        (**self).dispatch_mode()
    }

    fn dispatch_blocking(&self, action: Self::Action) -> Result<Self::State> {
        (**self).dispatch_blocking(action)
    }

    fn dispatch(&self, action: Self::Action) -> impl Future<Output = Result<Self::State>> + Send {
        (**self).dispatch(action)
    }
}
