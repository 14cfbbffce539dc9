//! Configuration
//!
//! Tunables for the store variants and decorators. Every struct has a
//! `Default` and can be deserialised from any serde format, with missing
//! fields falling back to their defaults.

use serde::{Deserialize, Serialize};

/// Configuration for [`ActorStore`](crate::store::ActorStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Capacity of the owner task's command queue. Dispatchers wait for a
    /// free slot once it is full.
    pub mailbox: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self { mailbox: 64 }
    }
}

/// Configuration for [`Effects`](crate::effect::Effects).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Maximum number of effect invocations in one dispatch episode.
    /// `None` leaves chains unbounded.
    pub max_steps: Option<usize>,
}
