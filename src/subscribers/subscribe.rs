//! # Core subscriber trait
//!
//! `Subscribe` is the observer capability injected into a
//! [`Supervisor`](crate::Supervisor) at construction. Each subscriber is driven by
//! its own worker fed through a bounded queue owned by the
//! [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they never block the supervisor, the tasks, or
//!   other subscribers.
//! - Each subscriber declares its queue capacity via [`Subscribe::queue_capacity`].
//!   On overflow the event is dropped for that subscriber only.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use groupvisor::{Event, EventKind, Subscribe};
///
/// struct FailureCounter(std::sync::atomic::AtomicUsize);
///
/// #[async_trait]
/// impl Subscribe for FailureCounter {
///     async fn on_event(&self, ev: &Event) {
///         if ev.kind == EventKind::TaskFailed {
///             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///         }
///     }
///
///     fn name(&self) -> &'static str {
///         "failure-counter"
///     }
/// }
/// ```
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
