//! Error types shared by stores, decorators and storage collaborators.

use thiserror::Error;

/// Boxed error used for effect failures and user-defined storage backends.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Crate-wide result alias.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Errors surfaced by `dispatch` and channel registration.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A decorator found neither a blocking nor a suspending dispatch on the
    /// store it wraps.
    #[error("wrapped store exposes no dispatch capability")]
    UnsupportedCapability,

    /// The effect function returned an explicit `Fail` outcome.
    #[error("effect failed: {0}")]
    Effect(#[source] BoxError),

    /// The effect function itself returned an error while being evaluated.
    #[error("effect raised an error: {0}")]
    EffectRaised(#[source] BoxError),

    /// The storage collaborator rejected a write. The in-memory state has
    /// already advanced when this is returned.
    #[error("storage write failed: {0}")]
    Storage(#[from] StorageError),

    /// A channel with the same key pair already exists with different
    /// value types.
    #[error("channel ({reaction}, {value}) already registered with different types")]
    FieldTypeMismatch {
        reaction: &'static str,
        value: &'static str,
    },

    /// The configured bound on reducer/effect steps in one episode was hit.
    #[error("effect chain exceeded {limit} steps")]
    ChainLimitExceeded { limit: usize },

    /// The owner task of an actor store has stopped.
    #[error("store owner task is no longer running")]
    Closed,
}

impl StoreError {
    /// The error produced by the effect function, whether it was reported
    /// through `Fail` or raised.
    pub fn effect_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            StoreError::Effect(error) | StoreError::EffectRaised(error) => Some(error.as_ref()),
            _ => None,
        }
    }
}

/// Errors reported by storage collaborators.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("messagepack encode error: {0}")]
    MessagePackEncode(#[from] rmp_serde::encode::Error),

    #[error("messagepack decode error: {0}")]
    MessagePackDecode(#[from] rmp_serde::decode::Error),

    /// Failure from a storage backend defined outside this crate.
    #[error("storage backend error: {0}")]
    Backend(#[source] BoxError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn effect_error_exposes_source() {
        let err = StoreError::Effect(Box::new(Boom));
        let source = err.effect_error().and_then(|e| e.downcast_ref::<Boom>());
        assert_eq!(source, Some(&Boom));

        let raised = StoreError::EffectRaised(Box::new(Boom));
        assert!(raised.effect_error().is_some());

        assert!(StoreError::Closed.effect_error().is_none());
    }

    #[test]
    fn storage_error_converts_into_store_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err: StoreError = StorageError::from(io).into();
        assert!(matches!(err, StoreError::Storage(StorageError::Io(_))));
        assert!(err.to_string().contains("disk full"));
    }
}
