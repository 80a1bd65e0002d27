//! # Non-blocking event fan-out to multiple subscribers.
//!
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - `emit()` returns immediately (`try_send`); a full or closed queue drops the event
//!   for that subscriber and publishes `SubscriberOverflow`.
//! - Overflow events that themselves overflow are not re-published.
//! - Per-subscriber FIFO; no ordering across subscribers.
//! - `flush()` queues a marker behind everything already emitted and resolves once
//!   every worker has reached it.
//! - A panicking subscriber is reported as `SubscriberPanicked` and keeps receiving
//!   events. `AssertUnwindSafe` is used, so state behind a lock the subscriber held
//!   while panicking may be left inconsistent.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::join_all;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::error::panic_message;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

enum Msg {
    Event(Arc<Event>),
    Flush(oneshot::Sender<()>),
}

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Msg>,
}

/// Fan-out coordinator: one bounded queue and one worker per subscriber.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker per subscriber.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (sender, rx) = mpsc::channel::<Msg>(sub.queue_capacity().max(1));
            workers.push(tokio::spawn(drive(sub, rx, bus.clone())));
            channels.push(SubscriberChannel { name, sender });
        }
        Self {
            channels,
            workers,
            bus,
        }
    }

    /// True when no subscribers are attached.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: &Event) {
        if self.channels.is_empty() {
            return;
        }
        let event = Arc::new(event.clone());
        let is_overflow_evt = matches!(event.kind, EventKind::SubscriberOverflow);

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Msg::Event(Arc::clone(&event))) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !is_overflow_evt {
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Waits until every subscriber has handled the events emitted before this call.
    ///
    /// Unbounded on its own; callers wrap it in a timeout.
    pub async fn flush(&self) {
        let acks = self.channels.iter().map(|channel| async move {
            let (tx, rx) = oneshot::channel();
            if channel.sender.send(Msg::Flush(tx)).await.is_ok() {
                let _ = rx.await;
            }
        });
        join_all(acks).await;
    }

    /// Closes every queue and waits for the workers to finish what is queued.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }
}

async fn drive(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Msg>, bus: Bus) {
    while let Some(msg) = rx.recv().await {
        let ev = match msg {
            Msg::Event(ev) => ev,
            Msg::Flush(ack) => {
                let _ = ack.send(());
                continue;
            }
        };
        let fut = sub.on_event(ev.as_ref());
        if let Err(payload) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
            bus.publish(Event::subscriber_panicked(sub.name(), panic_message(&*payload)));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct Collect(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push(ev.kind);
        }
        fn name(&self) -> &'static str {
            "collect"
        }
    }

    struct Explode;

    #[async_trait]
    impl Subscribe for Explode {
        async fn on_event(&self, _ev: &Event) {
            panic!("subscriber blew up");
        }
        fn name(&self) -> &'static str {
            "explode"
        }
    }

    #[tokio::test]
    async fn delivers_in_order_and_drains_on_shutdown() {
        let bus = Bus::new(16);
        let collect = Arc::new(Collect::default());
        let set = SubscriberSet::new(vec![collect.clone()], bus);

        set.emit(&Event::new(EventKind::TaskStarting));
        set.emit(&Event::new(EventKind::TaskStopped));
        set.shutdown().await;

        assert_eq!(
            *collect.0.lock().unwrap(),
            [EventKind::TaskStarting, EventKind::TaskStopped]
        );
    }

    struct Slow(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Slow {
        async fn on_event(&self, ev: &Event) {
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.0.lock().unwrap().push(ev.kind);
        }
        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn flush_waits_for_queued_events() {
        let bus = Bus::new(16);
        let slow = Arc::new(Slow(Mutex::new(Vec::new())));
        let collect = Arc::new(Collect::default());
        let set = SubscriberSet::new(vec![slow.clone() as Arc<dyn Subscribe>, collect.clone()], bus);

        set.emit(&Event::new(EventKind::TaskStarting));
        set.emit(&Event::new(EventKind::ShutdownTimeout));
        set.flush().await;

        assert_eq!(
            *slow.0.lock().unwrap(),
            [EventKind::TaskStarting, EventKind::ShutdownTimeout]
        );
        assert_eq!(collect.0.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn panics_are_reported_on_the_bus() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Explode)], bus.clone());

        set.emit(&Event::new(EventKind::TaskStarting));

        let ev = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("panic event in time")
            .expect("bus open");
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.task.as_deref(), Some("explode"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber blew up"));
    }
}
