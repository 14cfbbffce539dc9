//! Storage Collaborators
//!
//! The persistence decorator only needs somewhere to read, write and destroy
//! one record. [`Storage`] is that contract. Two implementations ship with
//! the crate:
//!
//! - [`MemoryStorage`]: a mutex-guarded slot, for tests and ephemeral use.
//! - [`FileStorage`]: one file, replaced atomically on every write, encoded
//!   with a [`Codec`] ([`Json`] or [`MessagePack`]).

use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{trace, warn};

use crate::error::StorageError;

/// Where persisted state goes.
///
/// Methods are synchronous and are called from inside a dispatch.
/// Implementations doing blocking I/O are run through
/// `tokio::task::block_in_place` on multi-thread runtimes; on a
/// current-thread runtime they block the runtime for their duration.
pub trait Storage<T>: Send + Sync {
    /// The last record written, if any.
    fn read(&self) -> Option<T>;

    fn write(&self, value: &T) -> Result<(), StorageError>;

    /// Remove the record.
    fn destroy(&self);
}

impl<T, P> Storage<T> for Arc<P>
where
    P: Storage<T> + ?Sized,
{
    fn read(&self) -> Option<T> {
        (**self).read()
    }

    fn write(&self, value: &T) -> Result<(), StorageError> {
        (**self).write(value)
    }

    fn destroy(&self) {
        (**self).destroy()
    }
}

/// In-memory storage slot.
#[derive(Debug)]
pub struct MemoryStorage<T> {
    value: Mutex<Option<T>>,
    writes: AtomicUsize,
}

impl<T> MemoryStorage<T> {
    pub fn new(value: Option<T>) -> Self {
        Self {
            value: Mutex::new(value),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl<T> Default for MemoryStorage<T> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<T> Storage<T> for MemoryStorage<T>
where
    T: Clone + Send,
{
    fn read(&self) -> Option<T> {
        self.value.lock().clone()
    }

    fn write(&self, value: &T) -> Result<(), StorageError> {
        *self.value.lock() = Some(value.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn destroy(&self) {
        *self.value.lock() = None;
    }
}

/// Serialisation format used by [`FileStorage`].
pub trait Codec {
    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError>;

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError>;
}

/// JSON via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Codec for Json {
    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
        Ok(serde_json::to_vec_pretty(value)?)
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// MessagePack via `rmp-serde`, with named struct fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessagePack;

impl Codec for MessagePack {
    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// Stores one record in a file.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so a reader never sees a half-written record. An unreadable or
/// undecodable file reads as `None` and is logged.
#[derive(Debug)]
pub struct FileStorage<T, C = Json> {
    path: PathBuf,
    _marker: PhantomData<fn() -> (T, C)>,
}

impl<T, C> FileStorage<T, C> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl<T, C> Storage<T> for FileStorage<T, C>
where
    T: Serialize + DeserializeOwned,
    C: Codec,
{
    fn read(&self) -> Option<T> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return None,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "failed to read persisted state");
                return None;
            }
        };

        match C::decode(&bytes) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(path = %self.path.display(), %error, "failed to decode persisted state");
                None
            }
        }
    }

    fn write(&self, value: &T) -> Result<(), StorageError> {
        let bytes = C::encode(value)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp = self.temp_path();
        fs::write(&temp, &bytes)?;
        fs::rename(&temp, &self.path)?;
        trace!(path = %self.path.display(), bytes = bytes.len(), "persisted state");
        Ok(())
    }

    fn destroy(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => {
                warn!(path = %self.path.display(), %error, "failed to remove persisted state");
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
