//! Persistence
//!
//! [`Persistent`] wraps a store and writes the resulting state to a
//! [`Storage`] collaborator after every dispatch, optionally passing it
//! through a pure transform first.
//!
//! Dispatches are serialised by the decorator's own episode lock,
//! independent of any lock held by the store it wraps. Write-through is
//! best effort: the in-memory state has already advanced when a write
//! fails, and the failure is returned to the caller. Callers that need
//! memory and storage to agree after a crash reconcile on restart through
//! [`Persistent::persisted`].

use std::future::Future;

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::Mutex;
use tracing::{debug, warn};

mod storage;

pub use storage::{Codec, FileStorage, Json, MemoryStorage, MessagePack, Storage};

use crate::error::Result;
use crate::reactive::{Field, ValueStream};
use crate::store::{dispatch_inner, DispatchMode, ReactiveStore};

type Transform<S> = Box<dyn Fn(S) -> S + Send + Sync>;

/// Decorator that persists state after each dispatch.
pub struct Persistent<St, P>
where
    St: ReactiveStore,
{
    inner: St,
    storage: P,
    transform: Option<Transform<St::State>>,
    episode: Mutex<()>,
}

/// Wrap `store` so every dispatch result is written to `storage`.
pub fn with_persistence<St, P>(store: St, storage: P) -> Persistent<St, P>
where
    St: ReactiveStore,
    P: Storage<St::State>,
{
    Persistent::new(store, storage)
}

impl<St, P> Persistent<St, P>
where
    St: ReactiveStore,
    P: Storage<St::State>,
{
    pub fn new(inner: St, storage: P) -> Self {
        Self {
            inner,
            storage,
            transform: None,
            episode: Mutex::new(()),
        }
    }

    /// Apply `transform` to each dispatch result before it is written and
    /// returned.
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(St::State) -> St::State + Send + Sync + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }

    pub fn inner(&self) -> &St {
        &self.inner
    }

    pub fn storage(&self) -> &P {
        &self.storage
    }

    /// The record currently held by the storage collaborator.
    pub fn persisted(&self) -> Option<St::State> {
        self.storage.read()
    }

    /// Remove the persisted record. In-memory state is untouched.
    pub fn destroy(&self) {
        debug!("destroying persisted state");
        self.storage.destroy();
    }

    async fn persist(&self, action: St::Action) -> Result<St::State> {
        let _episode = self.episode.lock().await;

        let mut state = dispatch_inner(&self.inner, action).await?;
        if let Some(transform) = &self.transform {
            state = transform(state);
        }

        if let Err(error) = off_worker(|| self.storage.write(&state)) {
            warn!(%error, "failed to persist state");
            return Err(error.into());
        }
        Ok(state)
    }
}

/// Run synchronous storage I/O. On a multi-thread runtime the worker's other
/// tasks are handed off first so a slow write does not stall them.
fn off_worker<R>(io: impl FnOnce() -> R) -> R {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(io),
        _ => io(),
    }
}

impl<St, P> ReactiveStore for Persistent<St, P>
where
    St: ReactiveStore,
    P: Storage<St::State>,
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
        DispatchMode::Suspending
    }

    fn dispatch(&self, action: Self::Action) -> impl Future<Output = Result<Self::State>> + Send {
        self.persist(action)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StorageError, StoreError};
    use crate::store::{ReadOnly, Store};

    struct RejectingStorage;

    impl Storage<u32> for RejectingStorage {
        fn read(&self) -> Option<u32> {
            None
        }

        fn write(&self, _value: &u32) -> std::result::Result<(), StorageError> {
            Err(StorageError::Backend("quota exceeded".into()))
        }

        fn destroy(&self) {}
    }

    fn counter() -> Store<u32, u32> {
        Store::reducing(|n, total| *total += n, 0)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn file_writes_on_a_multi_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counter.json");
        let storage: FileStorage<u32> = FileStorage::new(&path);
        let store = with_persistence(counter(), storage);

        // Keeps the other worker busy alongside the writes.
        let ticker = tokio::spawn(async {
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
        });

        for _ in 0..5 {
            store.dispatch(2).await.unwrap();
        }
        ticker.await.unwrap();

        assert_eq!(store.persisted(), Some(10));
        let reopened: FileStorage<u32> = FileStorage::new(&path);
        assert_eq!(reopened.read(), Some(10));
    }

    #[tokio::test]
    async fn file_writes_on_a_current_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let storage: FileStorage<u32> = FileStorage::new(dir.path().join("n.json"));
        let store = with_persistence(counter(), storage);

        assert_eq!(store.dispatch(3).await.unwrap(), 3);
        assert_eq!(store.persisted(), Some(3));
    }

    #[tokio::test]
    async fn transform_applies_before_write() {
        let store = with_persistence(counter(), MemoryStorage::default())
            .with_transform(|n| n.min(10));

        assert_eq!(store.dispatch(4).await.unwrap(), 4);
        assert_eq!(store.dispatch(20).await.unwrap(), 10);
        assert_eq!(store.persisted(), Some(10));
        // The wrapped store keeps the untransformed value.
        assert_eq!(store.state(), 24);
    }

    #[tokio::test]
    async fn write_failure_surfaces_after_state_advanced() {
        let store = with_persistence(counter(), RejectingStorage);

        let err = store.dispatch(3).await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(StorageError::Backend(_))));
        assert_eq!(store.state(), 3);
    }

    #[tokio::test]
    async fn destroy_clears_record_only() {
        let store = with_persistence(counter(), MemoryStorage::default());
        store.dispatch(1).await.unwrap();
        store.destroy();

        assert_eq!(store.persisted(), None);
        assert_eq!(store.state(), 1);
    }

    #[tokio::test]
    async fn read_only_inner_store_is_unsupported() {
        let store = with_persistence(ReadOnly::new(counter()), MemoryStorage::default());
        let err = store.dispatch(1).await.unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedCapability));
        assert_eq!(store.storage().write_count(), 0);
    }
}
