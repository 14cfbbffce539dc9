//! Channel Registry
//!
//! A channel is a replay-1 multicast point tied to a reaction field and a
//! value field. On every state transition the registry compares the reaction
//! field's projection of the previous and next state; when they differ, the
//! channel emits the value field's projection of the next state.
//!
//! Two shapes are supported:
//!
//! - "observe X": reaction field and value field are the same. This is the
//!   same channel as "observe X whenever X changes".
//! - "observe Y whenever X changes": the value field is projected on the
//!   next state only when the reaction field moved. Unrelated changes to Y
//!   stay silent.
//!
//! Channels are created lazily on first request, seeded with the current
//! projection of their value field, and live as long as the registry.

use std::any::Any;

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::current::{CurrentValue, ValueStream};
use super::field::{Field, FieldKey};
use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ChannelKey {
    reaction: FieldKey,
    value: FieldKey,
}

/// Type-erased view of a channel, evaluated on every transition.
trait Notify<S>: Send {
    /// Emit if the reaction field changed (or `force` is set). Returns
    /// whether anything was emitted.
    fn notify(&self, next: &S, previous: &S, force: bool) -> bool;

    fn as_any(&self) -> &dyn Any;
}

/// Channel that emits its value field whenever its reaction field changes.
///
/// "Observe X" is the same channel with X as both fields, so both request
/// shapes for one key pair resolve to one entry.
struct Channel<S, R, V> {
    reaction: Field<S, R>,
    value: Field<S, V>,
    output: CurrentValue<V>,
}

impl<S, R, V> Notify<S> for Channel<S, R, V>
where
    S: 'static,
    R: PartialEq + 'static,
    V: Clone + Send + 'static,
{
    fn notify(&self, next: &S, previous: &S, force: bool) -> bool {
        if !force && self.reaction.project(next) == self.reaction.project(previous) {
            return false;
        }
        self.output.send(self.value.project(next));
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Map from channel identity to channel, populated on demand.
pub struct Registry<S> {
    channels: IndexMap<ChannelKey, Box<dyn Notify<S>>>,
}

impl<S> Registry<S>
where
    S: 'static,
{
    pub fn new() -> Self {
        Self {
            channels: IndexMap::new(),
        }
    }

    /// Stream of `field`, emitting whenever its projection changes.
    ///
    /// `current` seeds the channel if it does not exist yet.
    pub fn observe<V>(&mut self, field: Field<S, V>, current: &S) -> Result<ValueStream<V>>
    where
        V: PartialEq + Clone + Send + 'static,
    {
        self.observe_reacting(field, field, current)
    }

    /// Stream of `field`, emitting whenever `reacting_to` changes.
    pub fn observe_reacting<V, R>(
        &mut self,
        field: Field<S, V>,
        reacting_to: Field<S, R>,
        current: &S,
    ) -> Result<ValueStream<V>>
    where
        V: Clone + Send + 'static,
        R: PartialEq + Send + 'static,
    {
        let key = ChannelKey {
            reaction: reacting_to.key(),
            value: field.key(),
        };

        if let Some(existing) = self.channels.get(&key) {
            return existing
                .as_any()
                .downcast_ref::<Channel<S, R, V>>()
                .map(|channel| channel.output.subscribe())
                .ok_or_else(|| mismatch(key));
        }

        debug!(
            field = %field.key(),
            reacting_to = %reacting_to.key(),
            "creating channel"
        );
        let output = CurrentValue::new(field.project(current));
        let stream = output.subscribe();
        self.channels.insert(
            key,
            Box::new(Channel {
                reaction: reacting_to,
                value: field,
                output,
            }),
        );
        Ok(stream)
    }

    /// Evaluate every channel for the transition `previous -> next`.
    ///
    /// Returns the number of channels that emitted.
    pub fn notify(&self, next: &S, previous: &S, force: bool) -> usize {
        let mut emitted = 0;
        for (key, channel) in &self.channels {
            if channel.notify(next, previous, force) {
                trace!(reaction = %key.reaction, value = %key.value, "channel emitted");
                emitted += 1;
            }
        }
        emitted
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl<S> Default for Registry<S>
where
    S: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn mismatch(key: ChannelKey) -> StoreError {
    StoreError::FieldTypeMismatch {
        reaction: key.reaction.name(),
        value: key.value.name(),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
