//! # Event subscribers: the observer side of the runtime.
//!
//! ```text
//! runner / Supervisor ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                   ├──► LogWriter
//!                                                                   ├──► Metrics
//!                                                                   └──► Custom ...
//! ```
//!
//! - [`Subscribe`]: trait to implement for custom observers
//! - [`SubscriberSet`]: bounded, panic-isolated fan-out
//! - [`LogWriter`] (feature `logging`): renders events through `tracing`

#[cfg(feature = "logging")]
mod log;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
