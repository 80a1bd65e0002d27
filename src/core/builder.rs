use std::sync::Arc;

use super::{config::SupervisorConfig, supervisor::Supervisor};
use crate::{
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for a [`Supervisor`] with observers attached.
///
/// ```rust
/// use std::sync::Arc;
/// use groupvisor::{Subscribe, Supervisor, SupervisorConfig};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let subs: Vec<Arc<dyn Subscribe>> = Vec::new();
///     let sup = Supervisor::builder(SupervisorConfig::default())
///         .with_subscribers(subs)
///         .build();
///     assert_eq!(sup.pending(), 0);
/// }
/// ```
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Each subscriber receives runtime events (task starts, completions, stop
    /// reason, drain result) through its own bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds a single subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the supervisor and starts the subscriber workers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Supervisor {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        Supervisor::new_internal(self.cfg, bus, subs)
    }
}
