//! # Run one registered task to completion.
//!
//! [`run_task`] is the body spawned for every registered task. It runs the task once,
//! accounts for its return, and reports it.
//!
//! ```text
//! task.run(scope) ──► (panic caught → TaskError::Panicked)
//!        │
//!        ├─1─► publish TaskStopped / TaskFailed
//!        ├─2─► in_flight.leave()
//!        └─3─► done.try_send(Completion { index, result })
//! ```
//!
//! ## Rules
//! - Step 1 happens-before step 2: once the drain reads zero, every completion event
//!   is already on the bus.
//! - Step 2 happens-before step 3: whoever receives the completion sees a counter
//!   that already excludes this task.
//! - Exactly one completion and one terminal event per task, panics included.
//! - `Ok(())` and `TaskError::Canceled` publish `TaskStopped`; any other error
//!   publishes `TaskFailed`.
//! - The completion queue has one slot per task, so `try_send` never sees it full;
//!   a closed queue (the run already returned) is ignored.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;

use super::counter::InFlight;
use crate::{
    error::{TaskError, panic_message},
    events::{Bus, Event, EventKind},
    scope::Scope,
    tasks::TaskRef,
};

/// One-shot report of a task's return.
#[derive(Debug)]
pub(crate) struct Completion {
    /// Registration index of the task.
    pub index: usize,
    pub result: Result<(), TaskError>,
}

/// Everything a spawned task body needs besides the task itself.
pub(crate) struct RunContext {
    pub scope: Scope,
    pub in_flight: InFlight,
    pub done: mpsc::Sender<Completion>,
    pub bus: Bus,
}

pub(crate) async fn run_task(index: usize, label: Arc<str>, task: TaskRef, ctx: RunContext) {
    let fut = task.run(ctx.scope);
    let result = match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
        Ok(r) => r,
        Err(payload) => Err(TaskError::Panicked {
            info: panic_message(&*payload),
        }),
    };

    publish_completion(&ctx.bus, label, &result);
    ctx.in_flight.leave();
    let _ = ctx.done.try_send(Completion { index, result });
}

fn publish_completion(bus: &Bus, label: Arc<str>, result: &Result<(), TaskError>) {
    let ev = match result {
        Ok(()) => Event::new(EventKind::TaskStopped),
        Err(e) if e.is_canceled() => Event::new(EventKind::TaskStopped).with_reason(e.to_string()),
        Err(e) => Event::new(EventKind::TaskFailed).with_reason(e.to_string()),
    };
    bus.publish(ev.with_task(label));
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::tasks::TaskFn;

    fn context(bus: &Bus) -> (RunContext, mpsc::Receiver<Completion>, InFlight) {
        let (done, rx) = mpsc::channel(1);
        let in_flight = InFlight::default();
        in_flight.enter();
        let ctx = RunContext {
            scope: Scope::new(),
            in_flight: in_flight.clone(),
            done,
            bus: bus.clone(),
        };
        (ctx, rx, in_flight)
    }

    #[tokio::test]
    async fn counter_is_released_before_completion_is_visible() {
        let bus = Bus::new(8);
        let (ctx, mut rx, in_flight) = context(&bus);
        let task = TaskFn::arc("slow", |_s: Scope| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<(), TaskError>(())
        });

        tokio::spawn(run_task(3, Arc::from("slow"), task, ctx));
        let rec = rx.recv().await.expect("completion");
        assert_eq!(rec.index, 3);
        assert!(rec.result.is_ok());
        assert_eq!(in_flight.load(), 0);
    }

    #[tokio::test]
    async fn panic_becomes_failed_completion() {
        let bus = Bus::new(8);
        let mut events = bus.subscribe();
        let (ctx, mut rx, in_flight) = context(&bus);
        let task = TaskFn::arc("bad", |_s: Scope| async {
            if true {
                panic!("kaboom");
            }
            Ok::<(), TaskError>(())
        });

        run_task(0, Arc::from("bad"), task, ctx).await;

        let rec = rx.recv().await.expect("completion");
        assert!(matches!(rec.result, Err(TaskError::Panicked { ref info }) if info == "kaboom"));
        assert_eq!(in_flight.load(), 0);

        let ev = events.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::TaskFailed);
        assert_eq!(ev.task.as_deref(), Some("bad"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn completion_event_is_published_before_counter_drops() {
        let bus = Bus::new(8);
        let mut events = bus.subscribe();
        let (ctx, _rx, in_flight) = context(&bus);
        let task = TaskFn::arc("quick", |_s: Scope| async { Ok::<(), TaskError>(()) });

        tokio::spawn(run_task(0, Arc::from("quick"), task, ctx));
        while in_flight.load() != 0 {
            tokio::task::yield_now().await;
        }

        let ev = events.try_recv().expect("event already published");
        assert_eq!(ev.kind, EventKind::TaskStopped);
    }

    #[tokio::test]
    async fn cancellation_is_reported_as_stopped() {
        let bus = Bus::new(8);
        let mut events = bus.subscribe();
        let (ctx, _rx, _in_flight) = context(&bus);
        ctx.scope.cancel();
        let task = TaskFn::arc("polite", |s: Scope| async move { Err::<(), TaskError>(s.err()) });

        run_task(0, Arc::from("polite"), task, ctx).await;

        let ev = events.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::TaskStopped);
        assert!(ev.reason.is_some());
    }
}
