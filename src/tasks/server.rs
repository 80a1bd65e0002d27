//! # Server adapter: long-lived resources as tasks.
//!
//! [`ServerTask`] turns anything that can *serve until told to stop* and *stop within a
//! deadline* (the [`Serve`] contract) into a [`Task`].
//!
//! ```text
//! ServerTask::run(scope)
//!   ├─► spawn server.serve()
//!   └─► select:
//!         ├─ serve returned            → its result
//!         └─ scope cancelled           → timeout(stop_timeout, server.shutdown(stop_timeout))
//!                                          ├─ Ok        → Err(scope.err())  (graceful)
//!                                          ├─ Err(e)    → Err(e)
//!                                          └─ elapsed   → Err(TaskError::Timeout)
//! ```
//!
//! The serve future runs on its own tokio task; if it has not returned after a
//! successful shutdown it is left to finish on its own.

use std::{borrow::Cow, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::task::JoinError;

use crate::{
    error::{TaskError, panic_message},
    scope::Scope,
    tasks::task::Task,
};

/// A resource with a blocking serve loop and a separate bounded graceful stop.
#[async_trait]
pub trait Serve: Send + Sync + 'static {
    /// Serves until stopped or failed.
    async fn serve(&self) -> Result<(), TaskError>;

    /// Asks a running `serve` to return, finishing within `timeout`.
    async fn shutdown(&self, timeout: Duration) -> Result<(), TaskError>;
}

/// [`Task`] wrapping a [`Serve`] resource.
pub struct ServerTask<S> {
    name: Cow<'static, str>,
    server: Arc<S>,
    stop_timeout: Duration,
}

impl<S: Serve> ServerTask<S> {
    /// Graceful-stop deadline used unless overridden.
    pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

    /// Wraps `server` with the default stop timeout.
    pub fn new(name: impl Into<Cow<'static, str>>, server: Arc<S>) -> Self {
        Self {
            name: name.into(),
            server,
            stop_timeout: Self::DEFAULT_STOP_TIMEOUT,
        }
    }

    /// Overrides the graceful-stop deadline.
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Returns the task as a shared handle.
    pub fn into_ref(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl<S: Serve> Task for ServerTask<S> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, scope: Scope) -> Result<(), TaskError> {
        let server = Arc::clone(&self.server);
        let mut serving = tokio::spawn(async move { server.serve().await });

        tokio::select! {
            res = &mut serving => flatten(res),
            _ = scope.cancelled() => {
                let stop = self.server.shutdown(self.stop_timeout);
                match tokio::time::timeout(self.stop_timeout, stop).await {
                    Ok(Ok(())) => Err(scope.err()),
                    Ok(Err(e)) => Err(e),
                    Err(_elapsed) => Err(TaskError::Timeout { timeout: self.stop_timeout }),
                }
            }
        }
    }
}

fn flatten(res: Result<Result<(), TaskError>, JoinError>) -> Result<(), TaskError> {
    match res {
        Ok(r) => r,
        Err(e) if e.is_panic() => Err(TaskError::Panicked {
            info: panic_message(&*e.into_panic()),
        }),
        Err(e) => Err(TaskError::fail(e)),
    }
}
