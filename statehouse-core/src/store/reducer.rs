//! Reducers
//!
//! A reducer is a pure function from an action and the current state to the
//! next state. Stores hold it as a shared trait object so the same reducer
//! can back several stores.
//!
//! Besides plain `(action, state) -> state` closures this module offers:
//!
//! - [`reducing`]: mutate a copy of the state in place.
//! - [`initializing`]: a reducer that also produces the initial state when
//!   called with [`Input::Initialize`] and no previous state.
//! - [`with_context`]: a reducer that receives an optional, non-owning
//!   reference to some surrounding object.

use std::sync::{Arc, Weak};

/// Shared reducer trait object.
pub type Reducer<S, A> = Arc<dyn Fn(&A, &S) -> S + Send + Sync>;

/// What a self-initialising reducer is asked to reduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a, A> {
    /// Synthetic action used once to derive the initial state.
    Initialize,
    Action(&'a A),
}

/// Wrap a `(action, state) -> state` closure.
pub fn reducer<S, A, F>(f: F) -> Reducer<S, A>
where
    F: Fn(&A, &S) -> S + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure that mutates a copy of the state.
pub fn reducing<S, A, F>(f: F) -> Reducer<S, A>
where
    S: Clone,
    F: Fn(&A, &mut S) + Send + Sync + 'static,
{
    Arc::new(move |action, state| {
        let mut next = state.clone();
        f(action, &mut next);
        next
    })
}

/// Build a reducer that tolerates an absent state, and derive the initial
/// state by reducing [`Input::Initialize`] against `None`.
pub fn initializing<S, A, F>(f: F) -> (Reducer<S, A>, S)
where
    F: Fn(Input<'_, A>, Option<&S>) -> S + Send + Sync + 'static,
{
    let initial = f(Input::Initialize, None);
    let reducer: Reducer<S, A> = Arc::new(move |action, state| f(Input::Action(action), Some(state)));
    (reducer, initial)
}

/// Build a reducer that can reach `context` without keeping it alive.
///
/// The closure receives `None` once the context has been dropped.
pub fn with_context<C, S, A, F>(context: &Arc<C>, f: F) -> Reducer<S, A>
where
    C: Send + Sync + 'static,
    F: Fn(&A, &S, Option<Arc<C>>) -> S + Send + Sync + 'static,
{
    let context: Weak<C> = Arc::downgrade(context);
    Arc::new(move |action, state| f(action, state, context.upgrade()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn reducing_mutates_a_copy() {
        let add = reducing(|n: &i32, total: &mut i32| *total += n);
        let before = 10;
        assert_eq!(add(&5, &before), 15);
        assert_eq!(before, 10);
    }

    #[test]
    fn initializing_reduces_initialize_against_none() {
        let (reduce, initial) = initializing(|input: Input<'_, i32>, state: Option<&i32>| {
            let state = state.copied().unwrap_or(100);
            match input {
                Input::Initialize => state,
                Input::Action(n) => state + n,
            }
        });

        assert_eq!(initial, 100);
        assert_eq!(reduce(&1, &initial), 101);
    }

    #[test]
    fn context_is_not_kept_alive() {
        let context = Arc::new(AtomicI32::new(7));
        let reduce = with_context(&context, |_: &(), state: &i32, ctx| {
            state + ctx.map(|c| c.load(Ordering::SeqCst)).unwrap_or(0)
        });

        assert_eq!(reduce(&(), &1), 8);

        drop(context);
        assert_eq!(reduce(&(), &1), 1);
    }
}
