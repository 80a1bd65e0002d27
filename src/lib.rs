//! # groupvisor
//!
//! **groupvisor** runs a fixed group of async tasks under one lifecycle: they start
//! together, the first decisive event stops all of them, and the supervisor waits a
//! bounded time for them to return.
//!
//! ## Architecture
//! ```text
//!     ┌──────────┐   ┌──────────┐   ┌──────────────┐
//!     │  TaskFn  │   │ Task impl│   │  ServerTask  │
//!     └────┬─────┘   └────┬─────┘   └──────┬───────┘
//!          └──────────────┼────────────────┘
//!                         ▼  register()
//! ┌───────────────────────────────────────────────────────────┐
//! │ Supervisor                                                │
//! │  - Registrations (open → frozen on run)                   │
//! │  - InFlight counter                                       │
//! │  - Bus ──► SubscriberSet ──► LogWriter / custom observers │
//! └──────┬───────────────────────────┬────────────────────────┘
//!        │ spawn(run_task)           │ select_cause
//!        ▼                           ▼
//!   task #0 .. task #N-1     { signal | parent cancelled | completion }
//!        │                           │
//!        └── Completion ────────────►┤
//!                                    ▼
//!                     scope.cancel_with(cause) ──► every task
//!                                    ▼
//!                     wait_drained(stop_timeout) ──► Ok / Err
//! ```
//!
//! ## Stop rules
//! | Trigger                               | Run returns                          |
//! |---------------------------------------|--------------------------------------|
//! | task error                            | `Err(RuntimeError::TaskFailed)`      |
//! | task success, `StopOnFirstExit`       | `Ok(())`                             |
//! | last task success, `ContinueUntil..`  | `Ok(())`                             |
//! | parent scope cancelled / OS signal    | `Ok(())`                             |
//! | drain exceeds `stop_timeout`          | `Err(RuntimeError::ShutdownTimeout)` |
//!
//! ## Features
//! | Area            | Key types                                              |
//! |-----------------|--------------------------------------------------------|
//! | **Supervision** | [`Supervisor`], [`SupervisorConfig`], [`StopPolicy`]   |
//! | **Tasks**       | [`Task`], [`TaskFn`], [`TaskRef`], [`ServerTask`], [`Serve`] |
//! | **Cancellation**| [`Scope`], [`StopCause`]                               |
//! | **Errors**      | [`RuntimeError`], [`TaskError`]                        |
//! | **Events**      | [`Event`], [`EventKind`], [`Subscribe`]                |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a subscriber that renders events
//!   through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use groupvisor::{Scope, StopPolicy, Supervisor, SupervisorConfig, TaskError, TaskFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = SupervisorConfig {
//!         stop_timeout: Duration::from_secs(5),
//!         stop_policy: StopPolicy::ContinueUntilDrainedOnSuccess,
//!         ..SupervisorConfig::default()
//!     };
//!     let sup = Supervisor::new(cfg);
//!
//!     for name in ["fetch-a", "fetch-b"] {
//!         sup.register(TaskFn::arc(name, |_scope: Scope| async move {
//!             tokio::time::sleep(Duration::from_millis(5)).await;
//!             Ok::<(), TaskError>(())
//!         }))?;
//!     }
//!
//!     // Both tasks run to completion before `run` returns.
//!     sup.run(Scope::new()).await?;
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod scope;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{StopPolicy, Supervisor, SupervisorBuilder, SupervisorConfig};
pub use error::{RuntimeError, StopCause, TaskError};
pub use events::{Bus, Event, EventKind};
pub use scope::Scope;
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{Serve, ServerTask, Task, TaskFn, TaskRef};

#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
