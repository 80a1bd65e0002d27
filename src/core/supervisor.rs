//! # Supervisor: one group of tasks, one lifecycle.
//!
//! The [`Supervisor`] owns the registration set, the event bus and the subscriber
//! fan-out. [`Supervisor::run`] starts every registered task, decides *why* the
//! group stops, broadcasts that cause to every task, and waits a bounded time for
//! them to return.
//!
//! ## High-level flow
//! ```text
//! run(parent)
//!   ├─► registry.freeze()                      (second run → AlreadyStarted)
//!   ├─► scope = parent.child()
//!   ├─► for each task: in_flight.enter(); spawn run_task(scope.clone())
//!   │
//!   ├─► select_cause (biased, loops only for successes under ContinueUntilDrained):
//!   │     ├─ OS signal (if enabled)     → Some(Signal)
//!   │     ├─ parent cancelled           → Some(parent cause)
//!   │     └─ completion record
//!   │          ├─ Err(e)                → Some(TaskFailed) (or the observed cause if Canceled)
//!   │          ├─ Ok, StopOnFirstExit   → None
//!   │          └─ Ok, ContinueUntil...  → keep waiting until in_flight == 0 → None
//!   │
//!   ├─► scope.cancel_with(cause)            (broadcast, before the drain starts)
//!   ├─► wait_drained(in_flight, now + stop_timeout)
//!   │     ├─ Drained  → publish AllStoppedWithin
//!   │     └─ TimedOut → publish ShutdownTimeout → Err(ShutdownTimeout { cause })
//!   ├─► flush subscribers (bounded by event_flush_timeout)
//!   └─► None / pure cancellation → Ok(()), TaskFailed → Err(TaskFailed)
//! ```
//!
//! ## Rules
//! - Single use: registration freezes when `run` starts.
//! - At most one error is surfaced; other completions only reach subscribers.
//! - Tasks still running after the stop timeout are detached, not aborted.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use groupvisor::{Scope, Supervisor, SupervisorConfig, TaskError, TaskFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = Supervisor::new(SupervisorConfig::default());
//!
//!     sup.register(TaskFn::arc("job", |_scope: Scope| async move {
//!         tokio::time::sleep(Duration::from_millis(10)).await;
//!         Ok::<(), TaskError>(())
//!     }))?;
//!     sup.register(TaskFn::arc("server", |scope: Scope| async move {
//!         scope.cancelled().await;
//!         Err::<(), TaskError>(scope.err())
//!     }))?;
//!
//!     // "job" finishes first, which stops "server" too.
//!     sup.run(Scope::new()).await?;
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Weak};

use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
};

use super::{
    builder::SupervisorBuilder,
    config::{StopPolicy, SupervisorConfig},
    counter::InFlight,
    drain::{self, Drain},
    registry::{Entry, Registrations},
    runner::{Completion, RunContext, run_task},
    shutdown,
};
use crate::{
    error::{RuntimeError, StopCause},
    events::{Bus, Event, EventKind},
    scope::Scope,
    subscribers::SubscriberSet,
    tasks::TaskRef,
};

/// Flush requests for the subscriber listener.
type FlushRequests = mpsc::Sender<oneshot::Sender<()>>;

/// A spawned task as seen by the supervisor after spawn.
struct Spawned {
    label: Arc<str>,
    handle: JoinHandle<()>,
}

/// Coordinates a group of tasks: start together, stop together, drain within a bound.
pub struct Supervisor {
    cfg: SupervisorConfig,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    registry: Registrations,
}

impl Supervisor {
    /// Creates a supervisor without subscribers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(cfg: SupervisorConfig) -> Self {
        SupervisorBuilder::new(cfg).build()
    }

    /// Starts a builder for attaching subscribers.
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(super) fn new_internal(cfg: SupervisorConfig, bus: Bus, subs: Arc<SubscriberSet>) -> Self {
        Self {
            cfg,
            bus,
            subs,
            registry: Registrations::new(),
        }
    }

    /// The configuration this supervisor was built with.
    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }

    /// Registers a task under its own [`Task::name`](crate::Task::name).
    ///
    /// Returns [`RuntimeError::RegistrationClosed`] once `run` has started.
    pub fn register(&self, task: TaskRef) -> Result<(), RuntimeError> {
        self.registry.push(task, None)
    }

    /// Registers a task under an explicit diagnostic name.
    ///
    /// Returns [`RuntimeError::RegistrationClosed`] once `run` has started.
    pub fn register_named(&self, task: TaskRef, name: impl Into<String>) -> Result<(), RuntimeError> {
        self.registry.push(task, Some(name.into()))
    }

    /// Number of registrations waiting to be started by `run`.
    ///
    /// Drops to 0 as soon as `run` takes them over; it does not count tasks that are
    /// still running.
    pub fn pending(&self) -> usize {
        self.registry.len()
    }

    /// Raw receiver of runtime events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Runs every registered task until the group stops, then drains.
    ///
    /// Returns `Ok(())` when the group stopped cleanly or was cancelled from outside
    /// (parent scope or OS signal), [`RuntimeError::TaskFailed`] for the first task
    /// error, and [`RuntimeError::ShutdownTimeout`] when tasks did not return within
    /// [`SupervisorConfig::stop_timeout`]. A second call returns
    /// [`RuntimeError::AlreadyStarted`].
    pub async fn run(&self, parent: Scope) -> Result<(), RuntimeError> {
        let entries = self.registry.freeze()?;
        let listener = self.subscriber_listener();

        let scope = parent.child();
        let in_flight = InFlight::default();
        let (done_tx, mut done_rx) = mpsc::channel(entries.len().max(1));

        let spawned = self.spawn_tasks(entries, &scope, &in_flight, done_tx);
        let cause = self.select_cause(&parent, &spawned, &in_flight, &mut done_rx).await;

        let recorded = scope.cancel_with(cause.clone().unwrap_or(StopCause::Canceled));
        // Lost the race to the parent: report what the tasks observed.
        let cause = if recorded { cause } else { scope.cause() };

        let result = self.drain(&in_flight, &spawned, cause).await;
        self.flush_subscribers(listener).await;
        result
    }

    /// Forwards bus events to the subscriber set until the supervisor is dropped.
    ///
    /// Returns the flush channel: a request is acknowledged once every event already
    /// on the bus has been handed to the subscriber queues.
    fn subscriber_listener(&self) -> Option<FlushRequests> {
        if self.subs.is_empty() {
            return None;
        }
        let mut rx = self.bus.subscribe();
        let set: Weak<SubscriberSet> = Arc::downgrade(&self.subs);
        let (flush_tx, mut flush_rx) = mpsc::channel::<oneshot::Sender<()>>(1);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    Some(ack) = flush_rx.recv() => {
                        loop {
                            match rx.try_recv() {
                                Ok(ev) => {
                                    if !forward(&set, &ev) {
                                        return;
                                    }
                                }
                                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                                Err(_) => break,
                            }
                        }
                        let _ = ack.send(());
                    }

                    ev = rx.recv() => match ev {
                        Ok(ev) => {
                            if !forward(&set, &ev) {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });
        Some(flush_tx)
    }

    /// Waits, up to `event_flush_timeout`, until subscribers have handled every event
    /// published during the run.
    async fn flush_subscribers(&self, listener: Option<FlushRequests>) {
        let Some(listener) = listener else {
            return;
        };
        let flush = async {
            let (ack, done) = oneshot::channel();
            if listener.send(ack).await.is_ok() {
                let _ = done.await;
            }
            self.subs.flush().await;
        };
        let timeout = self.cfg.event_flush_timeout;
        if tokio::time::timeout(timeout, flush).await.is_err() {
            tracing::warn!(?timeout, "subscribers did not catch up before run returned");
        }
    }

    fn spawn_tasks(
        &self,
        entries: Vec<Entry>,
        scope: &Scope,
        in_flight: &InFlight,
        done: mpsc::Sender<Completion>,
    ) -> Vec<Spawned> {
        let mut spawned = Vec::with_capacity(entries.len());
        for Entry { index, label, task } in entries {
            self.bus
                .publish(Event::new(EventKind::TaskStarting).with_task(Arc::clone(&label)));
            let ctx = RunContext {
                scope: scope.clone(),
                in_flight: in_flight.clone(),
                done: done.clone(),
                bus: self.bus.clone(),
            };
            in_flight.enter();
            let handle = tokio::spawn(run_task(index, Arc::clone(&label), task, ctx));
            spawned.push(Spawned { label, handle });
        }
        spawned
    }

    /// Waits for whatever ends the group and returns it (`None` for a clean stop).
    ///
    /// The completion queue closes once every task has reported, which also covers
    /// an empty group.
    async fn select_cause(
        &self,
        parent: &Scope,
        spawned: &[Spawned],
        in_flight: &InFlight,
        done: &mut mpsc::Receiver<Completion>,
    ) -> Option<StopCause> {
        let mut signals = self.cfg.handle_signals;
        let signal = shutdown::wait_for_shutdown_signal();
        tokio::pin!(signal);

        loop {
            tokio::select! {
                biased;

                res = &mut signal, if signals => match res {
                    Ok(name) => {
                        self.bus.publish(Event::new(EventKind::ShutdownRequested).with_reason(name));
                        return Some(StopCause::Signal { signal: name });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to install signal listeners; continuing without them");
                        signals = false;
                    }
                },

                _ = parent.cancelled() => {
                    let cause = parent.cause().unwrap_or(StopCause::Canceled);
                    self.bus.publish(Event::new(EventKind::ParentCanceled).with_reason(cause.to_string()));
                    return Some(cause);
                }

                rec = done.recv() => match rec {
                    None => return None,
                    Some(Completion { index, result: Err(e) }) => {
                        return Some(StopCause::from_task(Arc::clone(&spawned[index].label), e));
                    }
                    Some(Completion { result: Ok(()), .. }) => match self.cfg.stop_policy {
                        StopPolicy::StopOnFirstExit => return None,
                        StopPolicy::ContinueUntilDrainedOnSuccess => {
                            if in_flight.load() == 0 {
                                return first_error(spawned, done).await;
                            }
                        }
                    },
                },
            }
        }
    }

    async fn drain(
        &self,
        in_flight: &InFlight,
        spawned: &[Spawned],
        cause: Option<StopCause>,
    ) -> Result<(), RuntimeError> {
        let timeout = self.cfg.stop_timeout;
        let deadline = drain::deadline_after(timeout);

        match drain::wait_drained(in_flight, deadline, self.cfg.drain_poll_clamped()).await {
            Drain::Drained => {
                self.bus
                    .publish(Event::new(EventKind::AllStoppedWithin).with_timeout(timeout));
                match cause {
                    Some(StopCause::TaskFailed { task, error }) => {
                        Err(RuntimeError::TaskFailed { task, source: error })
                    }
                    _ => Ok(()),
                }
            }
            Drain::TimedOut { outstanding } => {
                let stuck: Vec<String> = spawned
                    .iter()
                    .filter(|s| !s.handle.is_finished())
                    .map(|s| s.label.to_string())
                    .collect();
                self.bus.publish(
                    Event::new(EventKind::ShutdownTimeout)
                        .with_timeout(timeout)
                        .with_reason(format!("outstanding={outstanding} stuck={stuck:?}")),
                );
                Err(RuntimeError::ShutdownTimeout {
                    timeout,
                    stuck,
                    cause,
                })
            }
        }
    }
}

fn forward(set: &Weak<SubscriberSet>, ev: &Event) -> bool {
    match set.upgrade() {
        Some(set) => {
            set.emit(ev);
            true
        }
        None => false,
    }
}

/// Reads the remaining completions once every task has returned, keeping the first error.
///
/// Every task has already released the counter, so the queue closes promptly.
async fn first_error(
    spawned: &[Spawned],
    done: &mut mpsc::Receiver<Completion>,
) -> Option<StopCause> {
    while let Some(rec) = done.recv().await {
        if let Err(e) = rec.result {
            return Some(StopCause::from_task(Arc::clone(&spawned[rec.index].label), e));
        }
    }
    None
}
