//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor` (task starts, stop reason, drain result),
//!   `runner::run_task` (one terminal event per task), `SubscriberSet` workers
//!   (overflow/panic).
//! - **Consumers**: the per-run subscriber listener (fans out to `SubscriberSet`) and
//!   any receiver obtained from [`Supervisor::subscribe`](crate::Supervisor::subscribe).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
