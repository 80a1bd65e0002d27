//! # Task abstractions.
//!
//! - [`Task`] - trait for implementing async cancelable tasks
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`TaskFn`] - closure-backed task
//! - [`ServerTask`] / [`Serve`] - adapter for long-lived serve/stop resources

mod server;
mod task;
mod task_fn;

pub use server::{Serve, ServerTask};
pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
