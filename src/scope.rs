//! # Cancellable execution scope with a stop cause.
//!
//! [`Scope`] pairs a [`CancellationToken`] with a first-writer-wins [`StopCause`].
//! The supervisor derives one child scope per run and hands clones of it to every
//! task; cancelling it is how the group stop is broadcast.
//!
//! ## Rules
//! - Cancelling a scope cancels all of its children (token semantics).
//! - The cause is recorded **before** the token is cancelled, so any task that
//!   observes cancellation also observes the cause.
//! - Once cancelled, later `cancel_with` calls are no-ops: the first cause sticks.
//! - A child cancelled through its parent reports the parent's cause.
//! - Whatever `cause()` returns first, it returns forever. `cancel_with` racing a
//!   parent cancellation reports `false` whenever its cause was not the one recorded.
//!
//! ```text
//! parent Scope ──child()──► run Scope ──clone──► task #0, task #1, ...
//!      │                        ▲
//!      └── cancel_with(c) ──────┘ cause() on the child falls back to `c`
//! ```

use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

use crate::error::{StopCause, TaskError};

/// Cancellable scope handed to every [`Task`](crate::Task).
///
/// Cheap to clone; clones share the same token and cause.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    token: CancellationToken,
    cause: OnceLock<StopCause>,
    parent: Option<Scope>,
}

impl Scope {
    /// Creates a new root scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing token. Cancelling the token externally reads as
    /// [`StopCause::Canceled`].
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            inner: Arc::new(Inner {
                token,
                cause: OnceLock::new(),
                parent: None,
            }),
        }
    }

    /// Derives a child scope: cancelled whenever `self` is, and cancellable on its own
    /// without affecting `self`.
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(Inner {
                token: self.inner.token.child_token(),
                cause: OnceLock::new(),
                parent: Some(self.clone()),
            }),
        }
    }

    /// Cancels with [`StopCause::Canceled`].
    pub fn cancel(&self) {
        self.cancel_with(StopCause::Canceled);
    }

    /// Cancels with an explicit cause.
    ///
    /// Returns `false` if the scope was already cancelled, in which case the
    /// existing cause is kept.
    pub fn cancel_with(&self, cause: StopCause) -> bool {
        if self.inner.token.is_cancelled() {
            return false;
        }
        let recorded = self.inner.cause.set(cause).is_ok();
        self.inner.token.cancel();
        recorded
    }

    /// True once the scope (or any ancestor) has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Completes when the scope is cancelled.
    pub async fn cancelled(&self) {
        self.inner.token.cancelled().await;
    }

    /// Why the scope was cancelled, or `None` while it is still live.
    ///
    /// The first answer is final: a cause inherited from the parent is recorded on
    /// first read, so a later `cancel_with` on this scope cannot replace it.
    pub fn cause(&self) -> Option<StopCause> {
        if !self.is_cancelled() {
            return None;
        }
        let cause = self.inner.cause.get_or_init(|| match &self.inner.parent {
            Some(parent) if parent.is_cancelled() => {
                parent.cause().unwrap_or(StopCause::Canceled)
            }
            _ => StopCause::Canceled,
        });
        Some(cause.clone())
    }

    /// The error a task should return after observing cancellation.
    ///
    /// ```
    /// use groupvisor::{Scope, StopCause, TaskError};
    ///
    /// let scope = Scope::new();
    /// scope.cancel_with(StopCause::Signal { signal: "SIGTERM" });
    /// assert!(matches!(scope.err(), TaskError::Canceled { .. }));
    /// ```
    pub fn err(&self) -> TaskError {
        TaskError::Canceled {
            cause: Box::new(self.cause().unwrap_or(StopCause::Canceled)),
        }
    }

    /// The underlying token, for APIs that take a [`CancellationToken`] directly.
    pub fn token(&self) -> &CancellationToken {
        &self.inner.token
    }
}
