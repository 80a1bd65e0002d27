//! # LogWriter: runtime events as `tracing` records
//!
//! Renders each [`Event`] as one structured `tracing` record. Install any
//! `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! | Event                | Level   | Fields                  |
//! |----------------------|---------|-------------------------|
//! | `TaskStarting`       | `debug` | `task`                  |
//! | `TaskStopped`        | `info`  | `task`, `reason`        |
//! | `TaskFailed`         | `warn`  | `task`, `error`         |
//! | `ShutdownRequested`  | `info`  | `signal`                |
//! | `ParentCanceled`     | `info`  | `cause`                 |
//! | `AllStoppedWithin`   | `debug` | `timeout_ms`            |
//! | `ShutdownTimeout`    | `error` | `timeout_ms`, `stuck`   |
//! | subscriber events    | `warn`/`error` | `subscriber`, `reason` |

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default, Debug, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::TaskStarting => tracing::debug!(task, "task starting"),
            EventKind::TaskStopped => tracing::info!(task, reason, "task stopped"),
            EventKind::TaskFailed => tracing::warn!(task, error = reason, "task failed"),
            EventKind::ShutdownRequested => {
                tracing::info!(signal = reason, "stopping on signal");
            }
            EventKind::ParentCanceled => {
                tracing::info!(cause = reason, "stopping on parent cancellation");
            }
            EventKind::AllStoppedWithin => {
                tracing::debug!(timeout_ms = e.timeout_ms, "all tasks stopped within timeout");
            }
            EventKind::ShutdownTimeout => {
                tracing::error!(timeout_ms = e.timeout_ms, stuck = reason, "shutdown timeout exceeded");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(subscriber = task, reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(subscriber = task, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
