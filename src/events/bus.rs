//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] so that task runners, the supervisor and
//! subscriber workers can publish without ever blocking.
//!
//! ```text
//! Publishers (many):                 Listener (one per run):
//!   runner #0 ──┐
//!   runner #1 ──┼──────► Bus ───────► subscriber listener ────► SubscriberSet
//!   Supervisor ─┘  (broadcast chan)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never waits.
//! - **Bounded capacity**: one ring buffer shared by all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` items.
//! - **No persistence**: events sent while nobody listens are dropped.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Cheap to clone (an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers; dropped if there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver for events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn publish_without_receivers_is_fine() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::TaskStarting));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::TaskStopped).with_task("a"));
        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::TaskStopped);
        assert_eq!(ev.task.as_deref(), Some("a"));
    }
}
