//! State and action bounds, plus the type-erasing action envelope.

use std::any::{type_name, Any};
use std::fmt::Debug;
use std::sync::Arc;

/// Values a store can hold. Equality decides whether a transition happened.
pub trait StoreState: Clone + PartialEq + Send + Sync + 'static {}

impl<T> StoreState for T where T: Clone + PartialEq + Send + Sync + 'static {}

/// Values a reducer consumes.
pub trait StoreAction: Clone + Send + Sync + 'static {}

impl<T> StoreAction for T where T: Clone + Send + Sync + 'static {}

/// An action of any concrete type.
///
/// Lets unrelated action families flow through one store. The reducer
/// recovers the concrete action with [`AnyAction::downcast_ref`].
#[derive(Clone)]
pub struct AnyAction {
    action: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl AnyAction {
    pub fn new<A>(action: A) -> Self
    where
        A: Any + Send + Sync,
    {
        Self {
            action: Arc::new(action),
            type_name: type_name::<A>(),
        }
    }

    /// Borrow the wrapped action if it is an `A`.
    pub fn downcast_ref<A: Any>(&self) -> Option<&A> {
        self.action.downcast_ref::<A>()
    }

    pub fn is<A: Any>(&self) -> bool {
        self.action.is::<A>()
    }

    /// Name of the wrapped action's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl Debug for AnyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AnyAction").field(&self.type_name).finish()
    }
}
