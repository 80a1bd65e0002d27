//! # Bounded drain wait.
//!
//! After cancellation is broadcast, the supervisor waits for every task to return.
//! Tasks are trusted but not forced to honor cancellation, so the wait is bounded by
//! a deadline: [`wait_drained`] samples the [`InFlight`] counter at a fixed interval
//! and returns as soon as it reads zero or the deadline passes.
//!
//! ```text
//! t0 ── tick ── tick ── tick ──► count == 0  → Drain::Drained
//!                          └────► deadline  → Drain::TimedOut { outstanding }
//! ```
//!
//! Polling trades up to one `poll` interval of latency for simplicity.

use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};

use super::counter::InFlight;

/// Result of a drain wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Drain {
    /// Every task returned before the deadline.
    Drained,
    /// The deadline passed with tasks still running.
    TimedOut {
        /// Tasks still outstanding when the deadline was hit.
        outstanding: usize,
    },
}

/// Far enough ahead to never fire in practice, small enough to add to any `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + timeout`, saturating to a far-future instant instead of overflowing.
pub(crate) fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or(now + FAR_FUTURE)
}

/// Waits until `counter` reads zero or `deadline` passes, whichever comes first.
///
/// A zero count observed at the deadline still counts as drained.
pub(crate) async fn wait_drained(counter: &InFlight, deadline: Instant, poll: Duration) -> Drain {
    let mut ticker = time::interval(poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if counter.load() == 0 {
            return Drain::Drained;
        }
        if Instant::now() >= deadline {
            return Drain::TimedOut {
                outstanding: counter.load(),
            };
        }
        tokio::select! {
            _ = ticker.tick() => {}
            _ = time::sleep_until(deadline) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn returns_immediately_when_empty() {
        let c = InFlight::default();
        let start = Instant::now();
        let res = wait_drained(&c, start + Duration::from_secs(10), Duration::from_millis(10)).await;
        assert_eq!(res, Drain::Drained);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn observes_zero_within_one_tick() {
        let c = InFlight::default();
        c.enter();
        {
            let c = c.clone();
            tokio::spawn(async move {
                time::sleep(Duration::from_millis(35)).await;
                c.leave();
            });
        }
        let start = Instant::now();
        let res = wait_drained(&c, start + Duration::from_secs(10), Duration::from_millis(10)).await;
        assert_eq!(res, Drain::Drained);
        assert!(start.elapsed() >= Duration::from_millis(35));
        assert!(start.elapsed() <= Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn huge_timeout_saturates() {
        let start = Instant::now();
        let deadline = deadline_after(Duration::MAX);
        assert!(deadline >= start + FAR_FUTURE);

        let c = InFlight::default();
        assert_eq!(wait_drained(&c, deadline, Duration::from_millis(10)).await, Drain::Drained);
        assert_eq!(deadline_after(Duration::from_millis(5)), start + Duration::from_millis(5));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_at_deadline() {
        let c = InFlight::default();
        c.enter();
        c.enter();
        let start = Instant::now();
        let res = wait_drained(&c, start + Duration::from_millis(100), Duration::from_millis(10)).await;
        assert_eq!(res, Drain::TimedOut { outstanding: 2 });
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(150));
    }
}
