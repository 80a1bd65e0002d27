//! # OS stop signal bridge.
//!
//! Provides [`wait_for_shutdown_signal`], an async helper that completes when the
//! process receives a stop signal. The supervisor only polls it when
//! [`SupervisorConfig::handle_signals`](crate::SupervisorConfig::handle_signals) is set;
//! listeners are installed on first poll and dropped when the run ends.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//!
//! **Other platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]
//!
//! Note that tokio keeps its process-level handler registered once a signal kind has
//! been listened for; only the per-run listeners go away with the run.

/// Waits for a stop signal and returns its name.
///
/// Returns `Err` if the listeners cannot be installed.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv()  => Ok("SIGINT"),
        _ = sigterm.recv() => Ok("SIGTERM"),
    }
}

/// Waits for a stop signal and returns its name.
///
/// Returns `Err` if the listener cannot be installed.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
