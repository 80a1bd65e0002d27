//! # Runtime events emitted by the supervisor and task runners.
//!
//! The [`EventKind`] enum classifies events into three groups:
//! - **Task events**: one `TaskStarting` per spawn and exactly one terminal
//!   `TaskStopped`/`TaskFailed` per task completion
//! - **Stop events**: what ended the run and how the drain went
//! - **Subscriber events**: delivery problems in the fan-out layer
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use groupvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task("db")
//!     .with_reason("execution failed: boom");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("db"));
//! assert_eq!(ev.reason.as_deref(), Some("execution failed: boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets `task` (subscriber name) and `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `task` (subscriber name) and `reason` (`full` or `closed`).
    SubscriberOverflow,

    // === Stop events ===
    /// An OS stop signal ended the run.
    ///
    /// Sets `reason` (signal name).
    ShutdownRequested,

    /// The parent scope was cancelled and ended the run.
    ///
    /// Sets `reason` (the parent's cause).
    ParentCanceled,

    /// Every task returned within the stop timeout.
    ///
    /// Sets `timeout_ms`.
    AllStoppedWithin,

    /// The stop timeout passed with tasks still running.
    ///
    /// Sets `timeout_ms` and `reason` (labels of the stuck tasks).
    ShutdownTimeout,

    // === Task events ===
    /// A task is about to be spawned.
    ///
    /// Sets `task`.
    TaskStarting,

    /// A task returned `Ok(())` or reported cancellation.
    ///
    /// Sets `task`, and `reason` when the task reported cancellation.
    TaskStopped,

    /// A task returned an error (including a caught panic).
    ///
    /// Sets `task` and `reason` (error message).
    TaskFailed,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Task label (or subscriber name for subscriber events).
    pub task: Option<Arc<str>>,
    /// Human-readable reason (errors, signal names, stuck tasks).
    pub reason: Option<Arc<str>>,
    /// Stop timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            reason: None,
            timeout_ms: None,
        }
    }

    /// Attaches a task label.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout (stored as milliseconds, saturating).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// True for the per-task terminal events.
    #[inline]
    pub fn is_task_completion(&self) -> bool {
        matches!(self.kind, EventKind::TaskStopped | EventKind::TaskFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_increases() {
        let a = Event::new(EventKind::TaskStarting);
        let b = Event::new(EventKind::TaskStopped);
        assert!(b.seq > a.seq);
        assert!(b.is_task_completion());
        assert!(!a.is_task_completion());
    }

    #[test]
    fn timeout_saturates() {
        let ev = Event::new(EventKind::ShutdownTimeout).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }
}
