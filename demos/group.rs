//! # Group Example
//!
//! Runs three tasks as one group:
//! - `ticker` logs every 300ms until the group stops
//! - `batch` finishes after ~1s, which stops the group (default policy)
//! - `flusher` observes the stop cause and cleans up
//!
//! Pass `fail` as the first argument to make `batch` fail instead.
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example group
//! RUST_LOG=debug cargo run --example group -- fail
//! ```

use std::{sync::Arc, time::Duration};

use groupvisor::{LogWriter, Scope, Subscribe, Supervisor, SupervisorConfig, TaskError, TaskFn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let should_fail = std::env::args().nth(1).as_deref() == Some("fail");

    let cfg = SupervisorConfig {
        handle_signals: true,
        stop_timeout: Duration::from_secs(2),
        ..SupervisorConfig::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let sup = Supervisor::builder(cfg).with_subscribers(subs).build();

    sup.register(TaskFn::arc("ticker", |scope: Scope| async move {
        let mut tick = tokio::time::interval(Duration::from_millis(300));
        let mut n = 0u32;
        loop {
            tokio::select! {
                _ = scope.cancelled() => return Err::<(), TaskError>(scope.err()),
                _ = tick.tick() => {
                    n += 1;
                    tracing::info!(n, "tick");
                }
            }
        }
    }))?;

    sup.register(TaskFn::arc("batch", move |_scope: Scope| async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        if should_fail {
            return Err(TaskError::fail("upstream returned 503"));
        }
        tracing::info!("batch complete");
        Ok::<(), TaskError>(())
    }))?;

    sup.register(TaskFn::arc("flusher", |scope: Scope| async move {
        scope.cancelled().await;
        let cause = scope.cause().map(|c| c.to_string()).unwrap_or_default();
        tracing::info!(%cause, "flushing buffers");
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok::<(), TaskError>(())
    }))?;

    match sup.run(Scope::new()).await {
        Ok(()) => tracing::info!("group stopped cleanly"),
        Err(e) => tracing::error!(error = %e, label = e.as_label(), "group failed"),
    }
    // Let the subscriber drain its queue before exit.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
