//! Effect Pipeline
//!
//! [`Effects`] wraps a store and runs an effect function after every
//! effective state transition. The effect sees the action, the new state and
//! the previous state, may suspend (to perform I/O, say), and answers with an
//! [`EffectOutcome`]:
//!
//! - `Continue(next)`: dispatch `next` to the wrapped store and run the
//!   effect again on the resulting transition.
//! - `Fail(error, settle)`: optionally dispatch `settle` so the state can
//!   reach a terminal value, then return `error` to the caller.
//! - `Stop`: return the current state.
//!
//! # Episodes
//!
//! One call to `dispatch`, including every chained dispatch and effect run
//! it triggers, is an episode. An async mutex held for the whole episode
//! guarantees that at most one is in flight per decorator; concurrent
//! callers queue in FIFO order and their steps never interleave. The guard
//! is dropped on every exit path, cancellation included.
//!
//! # Errors
//!
//! When `dispatch` returns an error the state streams already reflect every
//! transition applied before the failure, including a settling action.
//! Read the state to learn the terminal value.

use std::future::Future;

use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::config::EffectConfig;
use crate::error::{BoxError, Result, StoreError};
use crate::reactive::{Field, ValueStream};
use crate::store::{dispatch_inner, DispatchMode, ReactiveStore};

/// What the effect pipeline does after an effect has run.
#[derive(Debug)]
pub enum EffectOutcome<A> {
    /// Dispatch the action and run the effect again.
    Continue(A),
    /// Abort the episode with the error, after dispatching the optional
    /// settling action.
    Fail(BoxError, Option<A>),
    /// End the episode normally.
    Stop,
}

impl<A> EffectOutcome<A> {
    /// Shorthand for `Fail` with any error type.
    pub fn fail<E>(error: E, settle: Option<A>) -> Self
    where
        E: Into<BoxError>,
    {
        EffectOutcome::Fail(error.into(), settle)
    }
}

/// An absent outcome stops the chain.
impl<A> From<Option<EffectOutcome<A>>> for EffectOutcome<A> {
    fn from(outcome: Option<EffectOutcome<A>>) -> Self {
        outcome.unwrap_or(EffectOutcome::Stop)
    }
}

/// An effect function run after each effective transition.
///
/// Implemented for every `Fn(action, state, previous) -> Future` whose
/// output is `Result<O, BoxError>` with `O: Into<EffectOutcome<A>>`.
pub trait Effect<S, A>: Send + Sync {
    fn run(
        &self,
        action: A,
        state: S,
        previous: S,
    ) -> impl Future<Output = Result<EffectOutcome<A>, BoxError>> + Send;
}

impl<S, A, F, Fut, O> Effect<S, A> for F
where
    F: Fn(A, S, S) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, BoxError>> + Send,
    O: Into<EffectOutcome<A>>,
{
    fn run(
        &self,
        action: A,
        state: S,
        previous: S,
    ) -> impl Future<Output = Result<EffectOutcome<A>, BoxError>> + Send {
        let pending = self(action, state, previous);
        async move { pending.await.map(Into::into) }
    }
}

/// Decorator running an effect chain on every dispatch.
pub struct Effects<St, E> {
    inner: St,
    effect: E,
    config: EffectConfig,
    episode: Mutex<()>,
}

/// Wrap `store` with an effect taking `(action, state, previous)`.
pub fn with_effect<St, F, Fut, O>(store: St, effect: F) -> Effects<St, F>
where
    St: ReactiveStore,
    F: Fn(St::Action, St::State, St::State) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, BoxError>> + Send,
    O: Into<EffectOutcome<St::Action>>,
{
    Effects::new(store, effect)
}

/// Wrap `store` with an effect taking `(action, state)`.
pub fn with_state_effect<St, F, Fut, O>(
    store: St,
    effect: F,
) -> Effects<St, impl Effect<St::State, St::Action>>
where
    St: ReactiveStore,
    F: Fn(St::Action, St::State) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, BoxError>> + Send,
    O: Into<EffectOutcome<St::Action>>,
{
    Effects::new(
        store,
        move |action: St::Action, state: St::State, _previous: St::State| effect(action, state),
    )
}

impl<St, E> Effects<St, E>
where
    St: ReactiveStore,
    E: Effect<St::State, St::Action>,
{
    pub fn new(inner: St, effect: E) -> Self {
        Self::with_config(inner, effect, EffectConfig::default())
    }

    pub fn with_config(inner: St, effect: E, config: EffectConfig) -> Self {
        Self {
            inner,
            effect,
            config,
            episode: Mutex::new(()),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &St {
        &self.inner
    }

    async fn run_episode(&self, action: St::Action) -> Result<St::State> {
        let _episode = self.episode.lock().await;

        let mut action = action;
        let mut previous = self.inner.state();
        let mut steps = 0usize;

        loop {
            let state = dispatch_inner(&self.inner, action.clone()).await?;

            if state == previous {
                trace!(steps, "no effective change, episode complete");
                return Ok(state);
            }

            if let Some(limit) = self.config.max_steps {
                if steps >= limit {
                    warn!(limit, "effect chain limit reached");
                    return Err(StoreError::ChainLimitExceeded { limit });
                }
            }
            steps += 1;

            let outcome = match self.effect.run(action, state.clone(), previous).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    debug!(steps, %error, "effect raised an error");
                    return Err(StoreError::EffectRaised(error));
                }
            };

            match outcome {
                EffectOutcome::Continue(next) => {
                    trace!(steps, "effect continued the chain");
                    action = next;
                    previous = state;
                }
                EffectOutcome::Fail(error, settle) => {
                    debug!(steps, %error, settling = settle.is_some(), "effect failed");
                    if let Some(settle) = settle {
                        if let Err(settle_error) = dispatch_inner(&self.inner, settle).await {
                            warn!(%settle_error, "settling dispatch failed");
                        }
                    }
                    return Err(StoreError::Effect(error));
                }
                EffectOutcome::Stop => {
                    trace!(steps, "effect stopped the chain");
                    return Ok(state);
                }
            }
        }
    }
}

impl<St, E> std::fmt::Debug for Effects<St, E>
where
    St: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effects")
            .field("inner", &self.inner)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<St, E> ReactiveStore for Effects<St, E>
where
    St: ReactiveStore,
    E: Effect<St::State, St::Action>,
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
        self.run_episode(action)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
