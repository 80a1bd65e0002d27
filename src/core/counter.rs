//! # In-flight task counter.
//!
//! [`InFlight`] counts tasks that were spawned and have not yet returned.
//! It is the only state shared between task completion handlers and the drain waiter.
//!
//! ## Rules
//! - `enter()` is called immediately **before** a task is spawned.
//! - `leave()` is called immediately when the task returns, **before** its
//!   completion record is published. A consumer that has seen a record therefore
//!   sees a count that already excludes that task.
//! - The count never goes below zero: an unmatched `leave()` saturates.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// Shared count of outstanding tasks.
#[derive(Clone, Debug, Default)]
pub(crate) struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    /// Records a task about to be spawned.
    pub(crate) fn enter(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }

    /// Records a task that returned; yields the remaining count.
    pub(crate) fn leave(&self) -> usize {
        match self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(prev) => prev - 1,
            Err(_) => {
                debug_assert!(false, "in-flight counter underflow");
                0
            }
        }
    }

    /// Current number of outstanding tasks.
    pub(crate) fn load(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}
