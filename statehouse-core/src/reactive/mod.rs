//! Reactive Primitives
//!
//! This module implements the observation side of a store: replay-1
//! multicast streams, field projectors, and the channel registry that turns
//! state transitions into field-scoped notifications.
//!
//! # Concepts
//!
//! ## Current values
//!
//! A [`CurrentValue`] always holds a value. Streams attached to it receive
//! that value immediately and then every later one, in order.
//!
//! ## Fields
//!
//! A [`Field`] is a projection of the state keyed by a stable name. The key,
//! not the projector, decides identity.
//!
//! ## Channels
//!
//! A channel pairs a reaction field with a value field. When a transition
//! changes the reaction field's projection, the channel emits the value
//! field's projection of the new state. The [`Registry`] creates channels on
//! first request and evaluates all of them on every transition.

mod subscriber;
mod current;
mod field;
mod channel;

pub use subscriber::SubscriberId;
pub use current::{CurrentValue, ValueStream};
pub use field::{Field, FieldKey};
pub use channel::Registry;
