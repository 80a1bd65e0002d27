//! # TCP Server Example
//!
//! An echo server wrapped in [`ServerTask`] next to a periodic health reporter.
//! Press Ctrl-C (or send SIGTERM) to stop both: the server closes its listener and
//! waits for open connections within the stop timeout.
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example tcp_server
//! # in another shell
//! nc 127.0.0.1 7878
//! ```

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use groupvisor::{
    LogWriter, Scope, Serve, ServerTask, Supervisor, SupervisorConfig, TaskError, TaskFn,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::Notify,
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

struct EchoServer {
    addr: &'static str,
    stop: CancellationToken,
    closed: Notify,
}

impl EchoServer {
    fn new(addr: &'static str) -> Self {
        Self {
            addr,
            stop: CancellationToken::new(),
            closed: Notify::new(),
        }
    }

    async fn accept_loop(&self, listener: TcpListener) {
        let mut conns = JoinSet::new();
        loop {
            tokio::select! {
                _ = self.stop.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::info!(%peer, "connection opened");
                        conns.spawn(echo(stream, self.stop.child_token()));
                    }
                    Err(e) => tracing::warn!(error = %e, "accept failed"),
                },
            }
        }
        drop(listener);
        while conns.join_next().await.is_some() {}
    }
}

#[async_trait]
impl Serve for EchoServer {
    async fn serve(&self) -> Result<(), TaskError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| TaskError::fail(format!("bind {}: {e}", self.addr)))?;
        tracing::info!(addr = self.addr, "listening");

        self.accept_loop(listener).await;
        self.closed.notify_one();
        Ok(())
    }

    async fn shutdown(&self, timeout: Duration) -> Result<(), TaskError> {
        tracing::info!(?timeout, "closing listener");
        self.stop.cancel();
        self.closed.notified().await;
        Ok(())
    }
}

async fn echo(mut stream: TcpStream, stop: CancellationToken) {
    let mut buf = [0u8; 1024];
    loop {
        let n = tokio::select! {
            _ = stop.cancelled() => return,
            read = stream.read(&mut buf) => match read {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            },
        };
        if stream.write_all(&buf[..n]).await.is_err() {
            return;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = SupervisorConfig {
        handle_signals: true,
        stop_timeout: Duration::from_secs(5),
        ..SupervisorConfig::default()
    };
    let sup = Supervisor::builder(cfg)
        .with_subscriber(Arc::new(LogWriter::new()))
        .build();

    let server = ServerTask::new("echo", Arc::new(EchoServer::new("127.0.0.1:7878")))
        .with_stop_timeout(Duration::from_secs(3));
    sup.register(server.into_ref())?;

    sup.register(TaskFn::arc("health", |scope: Scope| async move {
        let mut tick = tokio::time::interval(Duration::from_secs(5));
        loop {
            tokio::select! {
                _ = scope.cancelled() => return Err::<(), TaskError>(scope.err()),
                _ = tick.tick() => tracing::info!("healthy"),
            }
        }
    }))?;

    sup.run(Scope::new()).await?;
    tracing::info!("bye");
    Ok(())
}
