//! # Registration set.
//!
//! Ordered, append-only list of tasks registered before a run. It flips exactly once
//! from *open* to *frozen* when [`Supervisor::run`](crate::Supervisor::run) starts;
//! after that, registering and running again are both rejected.
//!
//! ```text
//! Open(vec![..]) ──push()──► Open(vec![.., task])
//!        │
//!        └──freeze()──► Frozen      (entries handed to the run)
//!                         ├─ push()   → RuntimeError::RegistrationClosed
//!                         └─ freeze() → RuntimeError::AlreadyStarted
//! ```
//!
//! The mutex only makes freeze/register races deterministic; it is never held
//! while tasks run.

use std::sync::{Arc, Mutex, PoisonError};

use crate::{error::RuntimeError, tasks::TaskRef};

/// A registered task with its position and diagnostic label.
pub(crate) struct Entry {
    /// Registration order, starting at 0.
    pub index: usize,
    /// Name if one was given, otherwise `#<index>`.
    pub label: Arc<str>,
    pub task: TaskRef,
}

enum State {
    Open(Vec<Entry>),
    Frozen,
}

pub(crate) struct Registrations {
    state: Mutex<State>,
}

impl Registrations {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State::Open(Vec::new())),
        }
    }

    /// Appends a task. `name` overrides [`Task::name`](crate::Task::name) when given.
    pub(crate) fn push(&self, task: TaskRef, name: Option<String>) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let name = name.unwrap_or_else(|| task.name().to_owned());

        match &mut *state {
            State::Open(entries) => {
                let index = entries.len();
                let label: Arc<str> = if name.is_empty() {
                    Arc::from(format!("#{index}"))
                } else {
                    Arc::from(name)
                };
                entries.push(Entry { index, label, task });
                Ok(())
            }
            State::Frozen => Err(RuntimeError::RegistrationClosed { task: name }),
        }
    }

    /// Freezes the set and hands out its entries. Succeeds exactly once.
    pub(crate) fn freeze(&self) -> Result<Vec<Entry>, RuntimeError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *state, State::Frozen) {
            State::Open(entries) => Ok(entries),
            State::Frozen => Err(RuntimeError::AlreadyStarted),
        }
    }

    /// Number of registrations not yet handed to a run (0 once frozen, whatever the
    /// handed-off tasks are doing).
    pub(crate) fn len(&self) -> usize {
        match &*self.state.lock().unwrap_or_else(PoisonError::into_inner) {
            State::Open(entries) => entries.len(),
            State::Frozen => 0,
        }
    }
}
