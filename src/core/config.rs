//! # Supervisor configuration.
//!
//! [`SupervisorConfig`] is fixed at construction and read-only afterwards.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1
//! - `drain_poll = 0s` → clamped to 1ms

use std::time::Duration;

/// What a *successful* task completion means for the group.
///
/// A task error always ends the group immediately, under either policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StopPolicy {
    /// Any task completion, including success, ends the group.
    #[default]
    StopOnFirstExit,
    /// A successful completion only ends the group once it was the last task running.
    ContinueUntilDrainedOnSuccess,
}

/// Configuration for a [`Supervisor`](crate::Supervisor).
///
/// ## Field semantics
/// - `handle_signals`: subscribe to SIGINT/SIGTERM for the duration of a run
/// - `stop_timeout`: bound on the drain wait after cancellation is broadcast
/// - `stop_policy`: see [`StopPolicy`]
/// - `drain_poll`: sampling interval of the drain wait
/// - `bus_capacity`: event bus ring buffer size
/// - `event_flush_timeout`: bound on delivering the run's events to subscribers
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Treat an OS stop signal as one more shutdown trigger.
    ///
    /// When `false`, the supervisor installs no signal listeners.
    ///
    /// When `true`, the listeners are dropped when `run` returns, but tokio keeps its
    /// process-wide SIGINT/SIGTERM handler installed for the life of the process: a
    /// later Ctrl-C no longer terminates the process by default. Install your own
    /// handler (or exit explicitly) if the process outlives the run.
    pub handle_signals: bool,

    /// Maximum time to wait for tasks to return after cancellation.
    ///
    /// If exceeded, the run ends with `RuntimeError::ShutdownTimeout` and the stuck
    /// tasks are left running detached.
    pub stop_timeout: Duration,

    /// How a successful task completion affects the group.
    pub stop_policy: StopPolicy,

    /// Interval at which the drain wait samples the in-flight counter.
    pub drain_poll: Duration,

    /// Capacity of the event bus broadcast channel.
    ///
    /// Receivers lagging more than this many events skip the oldest ones.
    pub bus_capacity: usize,

    /// How long `run` waits, before returning, for subscribers to handle the
    /// events published during the run (task completions, drain result).
    ///
    /// Subscribers that are still behind after this are left to catch up on their own.
    pub event_flush_timeout: Duration,
}

impl SupervisorConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the drain poll interval clamped to a minimum of 1ms.
    #[inline]
    pub fn drain_poll_clamped(&self) -> Duration {
        self.drain_poll.max(Duration::from_millis(1))
    }
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `handle_signals = false`
    /// - `stop_timeout = 10s`
    /// - `stop_policy = StopPolicy::StopOnFirstExit`
    /// - `drain_poll = 10ms`
    /// - `bus_capacity = 1024`
    /// - `event_flush_timeout = 1s`
    fn default() -> Self {
        Self {
            handle_signals: false,
            stop_timeout: Duration::from_secs(10),
            stop_policy: StopPolicy::default(),
            drain_poll: Duration::from_millis(10),
            bus_capacity: 1024,
            event_flush_timeout: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = SupervisorConfig::default();
        assert!(!cfg.handle_signals);
        assert_eq!(cfg.stop_timeout, Duration::from_secs(10));
        assert_eq!(cfg.stop_policy, StopPolicy::StopOnFirstExit);
        assert_eq!(cfg.drain_poll, Duration::from_millis(10));
        assert_eq!(cfg.event_flush_timeout, Duration::from_secs(1));
    }

    #[test]
    fn clamps_sentinels() {
        let cfg = SupervisorConfig {
            bus_capacity: 0,
            drain_poll: Duration::ZERO,
            ..SupervisorConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.drain_poll_clamped(), Duration::from_millis(1));
    }
}
