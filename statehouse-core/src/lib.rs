//! Statehouse Core
//!
//! This crate provides a reactive state container: a single-writer store
//! that applies pure state transitions and exposes the current state and
//! field-scoped change notifications to any number of observers.
//!
//! It implements:
//!
//! - Stores that serialise every mutation ([`Store`], [`ActorStore`])
//! - Replay-1 streams of the state and of individual fields
//! - An effect pipeline that chains reducer and effect steps atomically
//! - A persistence layer that writes state through after each dispatch
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: replay-1 streams, field projectors and the channel registry
//! - `store`: the capability trait, reducers, and the two store variants
//! - `effect`: the effect pipeline decorator
//! - `persist`: the persistence decorator and storage collaborators
//!
//! Decorators implement [`ReactiveStore`] themselves, so they nest in any
//! order: persistence around effects around a base store, or the reverse.
//!
//! # Example
//!
//! ```rust,ignore
//! use statehouse_core::{with_effect, EffectOutcome, ReactiveStore, Store};
//!
//! let store = with_effect(
//!     Store::reducing(reduce, Phase::Idle),
//!     |action, state, _previous| async move {
//!         match state {
//!             Phase::Running => Ok(EffectOutcome::Continue(Action::Finish)),
//!             _ => Ok(EffectOutcome::Stop),
//!         }
//!     },
//! );
//!
//! // Runs Start, then the effect chains Finish.
//! assert_eq!(store.dispatch(Action::Start).await?, Phase::Finished);
//! ```

pub mod config;
pub mod effect;
pub mod error;
pub mod persist;
pub mod reactive;
pub mod store;

pub use config::{ActorConfig, EffectConfig};
pub use effect::{with_effect, with_state_effect, Effect, EffectOutcome, Effects};
pub use error::{BoxError, Result, StorageError, StoreError};
pub use persist::{with_persistence, FileStorage, MemoryStorage, Persistent, Storage};
pub use reactive::{Field, FieldKey, ValueStream};
pub use store::{
    ActorStore, AnyAction, DispatchMode, Input, ReactiveStore, ReadOnly, Reducer, Store,
    Transition,
};
