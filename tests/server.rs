use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use groupvisor::{
    EventKind, RuntimeError, Scope, Serve, ServerTask, StopCause, Supervisor, SupervisorConfig,
    Task, TaskError,
};
use tokio::{sync::Notify, time::Instant};

/// Serves until `shutdown` is called; how shutdown behaves is configurable.
struct FakeServer {
    stop: Notify,
    stops: AtomicUsize,
    on_stop: StopBehavior,
}

enum StopBehavior {
    Graceful,
    Fails,
    Hangs,
}

impl FakeServer {
    fn new(on_stop: StopBehavior) -> Arc<Self> {
        Arc::new(Self {
            stop: Notify::new(),
            stops: AtomicUsize::new(0),
            on_stop,
        })
    }
}

#[async_trait]
impl Serve for FakeServer {
    async fn serve(&self) -> Result<(), TaskError> {
        self.stop.notified().await;
        Ok(())
    }

    async fn shutdown(&self, _timeout: Duration) -> Result<(), TaskError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        match self.on_stop {
            StopBehavior::Graceful => {
                self.stop.notify_one();
                Ok(())
            }
            StopBehavior::Fails => Err(TaskError::fail("listener close failed")),
            StopBehavior::Hangs => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

struct BindFails;

#[async_trait]
impl Serve for BindFails {
    async fn serve(&self) -> Result<(), TaskError> {
        Err(TaskError::fail("address already in use"))
    }

    async fn shutdown(&self, _timeout: Duration) -> Result<(), TaskError> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn cancelled_server_stops_gracefully() {
    let server = FakeServer::new(StopBehavior::Graceful);
    let sup = Supervisor::new(SupervisorConfig::default());
    let mut events = sup.subscribe();
    sup.register(ServerTask::new("http", server.clone()).into_ref())
        .unwrap();

    let parent = Scope::new();
    {
        let parent = parent.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            parent.cancel();
        });
    }

    let start = Instant::now();
    sup.run(parent).await.expect("graceful stop");
    assert!(start.elapsed() < Duration::from_millis(50));
    assert_eq!(server.stops.load(Ordering::SeqCst), 1);

    let mut stopped = None;
    while let Ok(ev) = events.try_recv() {
        if ev.kind == EventKind::TaskStopped {
            stopped = Some(ev);
        }
    }
    let stopped = stopped.expect("server reported its stop");
    assert_eq!(stopped.task.as_deref(), Some("http"));
    assert!(stopped.reason.as_deref().unwrap().contains("context cancelled"));
}

#[tokio::test(start_paused = true)]
async fn graceful_stop_reports_the_scope_cause() {
    let task = ServerTask::new("http", FakeServer::new(StopBehavior::Graceful));
    let scope = Scope::new();
    scope.cancel_with(StopCause::Signal { signal: "SIGINT" });

    let err = task.run(scope).await.unwrap_err();
    match err {
        TaskError::Canceled { cause } => {
            assert!(matches!(*cause, StopCause::Signal { signal: "SIGINT" }))
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn failed_stop_is_returned() {
    let task = ServerTask::new("http", FakeServer::new(StopBehavior::Fails));
    let scope = Scope::new();
    scope.cancel();

    let err = task.run(scope).await.unwrap_err();
    assert!(matches!(err, TaskError::Fail { ref error } if error == "listener close failed"));
}

#[tokio::test(start_paused = true)]
async fn hanging_stop_times_out() {
    let task = ServerTask::new("http", FakeServer::new(StopBehavior::Hangs))
        .with_stop_timeout(Duration::from_millis(50));
    let scope = Scope::new();
    scope.cancel();

    let start = Instant::now();
    let err = task.run(scope).await.unwrap_err();
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(50), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(60), "{elapsed:?}");
    assert!(matches!(err, TaskError::Timeout { timeout } if timeout == Duration::from_millis(50)));
}

#[tokio::test(start_paused = true)]
async fn serve_failure_fails_the_group() {
    let sup = Supervisor::new(SupervisorConfig::default());
    let other = FakeServer::new(StopBehavior::Graceful);
    sup.register(ServerTask::new("grpc", other.clone()).into_ref())
        .unwrap();
    sup.register(ServerTask::new("http", Arc::new(BindFails)).into_ref())
        .unwrap();

    let err = sup.run(Scope::new()).await.unwrap_err();
    match err {
        RuntimeError::TaskFailed { task, source } => {
            assert_eq!(&*task, "http");
            assert!(source.to_string().contains("address already in use"));
        }
        e => panic!("unexpected error: {e}"),
    }
    // The healthy server was still stopped through its own shutdown.
    assert_eq!(other.stops.load(Ordering::SeqCst), 1);
}
