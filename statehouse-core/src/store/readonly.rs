//! Observation-only view of a store.

use super::{DispatchMode, ReactiveStore};
use crate::error::Result;
use crate::reactive::{Field, ValueStream};

/// Wraps a store and exposes only its streams.
///
/// Useful to hand to consumers that must not mutate state. Wrapping a
/// `ReadOnly` in a decorator yields
/// [`StoreError::UnsupportedCapability`](crate::StoreError::UnsupportedCapability)
/// on dispatch.
#[derive(Debug, Clone)]
pub struct ReadOnly<St> {
    inner: St,
}

impl<St> ReadOnly<St>
where
    St: ReactiveStore,
{
    pub fn new(inner: St) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> St {
        self.inner
    }
}

impl<St> ReactiveStore for ReadOnly<St>
where
    St: ReactiveStore,
{
    type State = St::State;
    type Action = St::Action;

    fn state(&self) -> Self::State {
        self.inner.state()
    }

    fn current_state(&self) -> ValueStream<Self::State> {
        self.inner.current_state()
    }

    fn observe<V>(&self, field: Field<Self::State, V>) -> Result<ValueStream<V>>
    where
        V: PartialEq + Clone + Send + Sync + 'static,
    {
        self.inner.observe(field)
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
        self.inner.observe_reacting(field, reacting_to)
    }

    fn dispatch_mode(&self) -> DispatchMode {
        DispatchMode::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::Store;

    #[tokio::test]
    async fn read_only_view_observes_but_cannot_dispatch() {
        let store: Store<u8, u8> = Store::reducing(|n, state| *state += n, 0);
        let view = ReadOnly::new(store.clone());
        let mut states = view.current_state();

        store.dispatch_blocking(3).unwrap();

        assert_eq!(view.state(), 3);
        assert_eq!(states.try_next(), Some(0));
        assert_eq!(states.try_next(), Some(3));
        assert!(matches!(view.dispatch(1).await, Err(StoreError::UnsupportedCapability)));
        assert!(matches!(view.dispatch_blocking(1), Err(StoreError::UnsupportedCapability)));
    }
}
