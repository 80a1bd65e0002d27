//! Runtime core: registration, supervision and shutdown.
//!
//! The public API from this module is [`Supervisor`] (with its builder and
//! configuration). Internal modules:
//! - [`supervisor`]: freezes registration, spawns tasks, picks the stop cause, drains;
//! - [`runner`]: body of one spawned task (accounting, events, completion record);
//! - [`registry`]: the open/frozen registration set;
//! - [`counter`]: in-flight task counter;
//! - [`drain`]: bounded polling wait on the counter;
//! - [`shutdown`]: OS signal bridge.

mod builder;
mod config;
mod counter;
mod drain;
mod registry;
mod runner;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::{StopPolicy, SupervisorConfig};
pub use supervisor::Supervisor;
