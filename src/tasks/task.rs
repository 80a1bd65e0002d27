//! # Task abstraction.
//!
//! A [`Task`] is a unit of work with one cancellable entry point. It receives a
//! [`Scope`] and must treat the scope's cancellation as its only external stop
//! signal, returning promptly after observing it.
//!
//! The common handle type is [`TaskRef`], an `Arc<dyn Task>` owned by the
//! supervisor once registered.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{error::TaskError, scope::Scope};

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cancelable unit.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use groupvisor::{Scope, Task, TaskError};
///
/// struct Ticker;
///
/// #[async_trait]
/// impl Task for Ticker {
///     fn name(&self) -> &str { "ticker" }
///
///     async fn run(&self, scope: Scope) -> Result<(), TaskError> {
///         loop {
///             tokio::select! {
///                 _ = scope.cancelled() => return Ok(()),
///                 _ = tokio::time::sleep(std::time::Duration::from_millis(250)) => {}
///             }
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Advisory name used in diagnostics. Empty means "unnamed".
    fn name(&self) -> &str {
        ""
    }

    /// Runs until completion or until `scope` is cancelled.
    ///
    /// Return `Ok(())`, `Err(scope.err())` after observing cancellation, or an error
    /// describing why the task stopped.
    async fn run(&self, scope: Scope) -> Result<(), TaskError>;
}
