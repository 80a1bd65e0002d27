//! Error types used by the groupvisor runtime and tasks.
//!
//! This module defines three enums:
//!
//! - [`RuntimeError`] — the single terminal outcome of [`Supervisor::run`](crate::Supervisor::run),
//!   plus the misuse errors returned by registration.
//! - [`TaskError`] — errors returned by individual task executions.
//! - [`StopCause`] — why a supervised group stopped; visible to every task through its
//!   [`Scope`](crate::Scope).
//!
//! All of them provide `as_label` for logs/metrics.

use std::{sync::Arc, time::Duration};

use thiserror::Error;

/// # Errors produced by the groupvisor runtime.
///
/// At most one of these is surfaced per run. Misuse variants
/// ([`AlreadyStarted`](RuntimeError::AlreadyStarted),
/// [`RegistrationClosed`](RuntimeError::RegistrationClosed)) signal a wiring defect
/// and are returned before any task is spawned.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A task returned an error and its failure ended the group.
    #[error("task {task} failed: {source}")]
    TaskFailed {
        /// Label of the failing task (its name, or `#<index>` when unnamed).
        task: Arc<str>,
        /// The error the task returned.
        #[source]
        source: TaskError,
    },

    /// Tasks did not drain within the stop timeout after cancellation was broadcast.
    #[error("shutdown timeout {timeout:?} exceeded; stuck: {stuck:?}{}", describe_cause(.cause))]
    ShutdownTimeout {
        /// The configured stop timeout.
        timeout: Duration,
        /// Labels of the tasks that were still running at the deadline.
        stuck: Vec<String>,
        /// The cause the group was stopping for, if there was one.
        #[source]
        cause: Option<StopCause>,
    },

    /// [`Supervisor::run`](crate::Supervisor::run) was called more than once.
    #[error("supervisor already started")]
    AlreadyStarted,

    /// A task was registered after the supervisor started running.
    #[error("cannot register task {task:?}: supervisor already started")]
    RegistrationClosed {
        /// Name given to the rejected task (may be empty).
        task: String,
    },
}

fn describe_cause(cause: &Option<StopCause>) -> String {
    match cause {
        Some(c) => format!("; stopping on: {c}"),
        None => String::new(),
    }
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use groupvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::ShutdownTimeout { timeout: Duration::from_secs(5), stuck: vec![], cause: None };
    /// assert_eq!(err.as_label(), "runtime_shutdown_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::TaskFailed { .. } => "runtime_task_failed",
            RuntimeError::ShutdownTimeout { .. } => "runtime_shutdown_timeout",
            RuntimeError::AlreadyStarted => "runtime_already_started",
            RuntimeError::RegistrationClosed { .. } => "runtime_registration_closed",
        }
    }

    /// True for the errors that indicate incorrect use of the supervisor
    /// rather than a runtime condition.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            RuntimeError::AlreadyStarted | RuntimeError::RegistrationClosed { .. }
        )
    }
}

/// # Errors produced by task execution.
///
/// String-backed so that a task error can be carried as a [`StopCause`] to every
/// other task in the group.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    /// Execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// An operation bounded by a deadline did not finish in time.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The task panicked; the panic was caught by the runtime.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The task stopped because its scope was cancelled.
    ///
    /// Treated as a graceful exit, never as a failure.
    #[error("context cancelled: {cause}")]
    Canceled {
        /// Why the scope was cancelled.
        cause: Box<StopCause>,
    },
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use groupvisor::TaskError;
    ///
    /// assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled { .. } => "task_canceled",
        }
    }

    /// True if this error only reports that the task observed cancellation.
    pub fn is_canceled(&self) -> bool {
        matches!(self, TaskError::Canceled { .. })
    }
}

/// # Why a supervised group stopped.
///
/// Exactly one cause is adopted per run (first one wins). It is broadcast to every
/// task through [`Scope::cause`](crate::Scope::cause).
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum StopCause {
    /// Cancelled from outside: the parent scope, or a clean group stop.
    #[error("context cancelled")]
    Canceled,

    /// An OS stop signal was received.
    #[error("received {signal}")]
    Signal {
        /// Signal name (`SIGINT`, `SIGTERM`, `ctrl-c`).
        signal: &'static str,
    },

    /// A task failed.
    #[error("task {task} failed: {error}")]
    TaskFailed {
        /// Label of the failing task.
        task: Arc<str>,
        /// The error it returned.
        #[source]
        error: TaskError,
    },
}

impl StopCause {
    /// Builds the cause for a task that returned `error`.
    ///
    /// A task reporting [`TaskError::Canceled`] passes on the cause it observed
    /// instead of being treated as a failure.
    pub fn from_task(task: Arc<str>, error: TaskError) -> Self {
        match error {
            TaskError::Canceled { cause } => *cause,
            error => StopCause::TaskFailed { task, error },
        }
    }

    /// True when the group was stopped from outside (parent or signal) with no task error.
    pub fn is_pure_cancellation(&self) -> bool {
        matches!(self, StopCause::Canceled | StopCause::Signal { .. })
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StopCause::Canceled => "stop_canceled",
            StopCause::Signal { .. } => "stop_signal",
            StopCause::TaskFailed { .. } => "stop_task_failed",
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
