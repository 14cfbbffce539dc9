//! Sample application types shared by the integration tests.

#![allow(dead_code)]

use std::time::Duration;

use serde::{Deserialize, Serialize};
use statehouse_core::{BoxError, EffectOutcome, Field, Store};

// ----------------------------------------------------------------------------
// Account state
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub age: Option<u32>,
    pub address: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthenticationPhase {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub phase: AuthenticationPhase,
    pub user: Option<User>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AccountAction {
    Login { username: String },
    SetAge(Option<u32>),
    MoveTo(&'static str),
}

impl Default for AccountState {
    fn default() -> Self {
        Self {
            phase: AuthenticationPhase::Unauthenticated,
            user: Some(User {
                name: "Trevor".into(),
                age: Some(35),
                address: Address {
                    street: "1 Infinite Loop".into(),
                    city: "Cupertino".into(),
                    state: "CA".into(),
                    zip_code: 95014,
                },
            }),
        }
    }
}

pub fn account_store() -> Store<AccountState, AccountAction> {
    Store::reducing(
        |action: &AccountAction, state: &mut AccountState| match action {
            AccountAction::Login { .. } => state.phase = AuthenticationPhase::Authenticating,
            AccountAction::SetAge(age) => {
                if let Some(user) = state.user.as_mut() {
                    user.age = *age;
                }
            }
            AccountAction::MoveTo(city) => {
                if let Some(user) = state.user.as_mut() {
                    user.address.city = city.to_string();
                }
            }
        },
        AccountState::default(),
    )
}

pub fn age() -> Field<AccountState, Option<u32>> {
    Field::new("user.age", |state| state.user.as_ref().and_then(|u| u.age))
}

pub fn address() -> Field<AccountState, Option<Address>> {
    Field::new("user.address", |state| {
        state.user.as_ref().map(|u| u.address.clone())
    })
}

pub fn phase() -> Field<AccountState, AuthenticationPhase> {
    Field::new("phase", |state| state.phase)
}

// ----------------------------------------------------------------------------
// Long-running task state machine
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Initializing,
    Running,
    Finished,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Start,
    FinishLongRunningTask,
    Cleanup,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("standard error")]
    Standard,
}

pub fn task_store() -> Store<TaskState, TaskAction> {
    Store::reducing(
        |action: &TaskAction, state: &mut TaskState| {
            *state = match action {
                TaskAction::Start => TaskState::Running,
                TaskAction::FinishLongRunningTask => TaskState::Finished,
                TaskAction::Cleanup => TaskState::Failed,
            }
        },
        TaskState::Initializing,
    )
}

/// Finishes a running task after a short delay, otherwise stops.
pub async fn finish_running(
    _action: TaskAction,
    state: TaskState,
    _previous: TaskState,
) -> Result<EffectOutcome<TaskAction>, BoxError> {
    match state {
        TaskState::Running => {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(EffectOutcome::Continue(TaskAction::FinishLongRunningTask))
        }
        _ => Ok(EffectOutcome::Stop),
    }
}
