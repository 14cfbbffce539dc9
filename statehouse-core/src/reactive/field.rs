//! Field Projectors
//!
//! A [`Field`] projects one part of a state value. Fields are identified by
//! an explicit [`FieldKey`] rather than by the projector itself: two fields
//! with the same key are treated as the same field, and two channel requests
//! for the same key pair resolve to the same channel.

use std::fmt::Debug;

/// Stable identifier of a field, e.g. `"user.age"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// A statically identified projection from a state `S` to a value `V`.
///
/// # Example
///
/// ```rust,ignore
/// fn age() -> Field<AppState, Option<u32>> {
///     Field::new("user.age", |state| state.user.as_ref().and_then(|u| u.age))
/// }
/// ```
pub struct Field<S, V> {
    key: FieldKey,
    project: fn(&S) -> V,
}

impl<S, V> Field<S, V> {
    /// Create a field from a key and a non-capturing projector.
    pub const fn new(key: &'static str, project: fn(&S) -> V) -> Self {
        Self {
            key: FieldKey::new(key),
            project,
        }
    }

    pub fn key(&self) -> FieldKey {
        self.key
    }

    /// Apply the projector.
    pub fn project(&self, state: &S) -> V {
        (self.project)(state)
    }
}

impl<S, V> Clone for Field<S, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, V> Copy for Field<S, V> {}

impl<S, V> Debug for Field<S, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Field").field(&self.key).finish()
    }
}
