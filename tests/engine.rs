use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::time;

use recoverwatch::{
    Credential, CredentialPool, Destination, EngineBuilder, EngineConfig, EngineError,
    EntityId, EntityRegistry, Event, EventKind, MemoryRegistry, MonitorEngine,
    NotificationSink, NotifyError, RawResponse, RecoveryEvent, RegistryEntry, StartOutcome,
    Transport, TransportError,
};

#[derive(Clone)]
enum Step {
    Respond(u16, String),
    Fail(TransportError),
    Hang,
}

/// Per-entity scripted responses; an exhausted script answers 404.
#[derive(Default)]
struct Scripted {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    forever: Mutex<HashMap<String, Step>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl Scripted {
    fn script(self: &Arc<Self>, id: &str, steps: Vec<Step>) -> Arc<Self> {
        self.scripts.lock().insert(id.to_string(), steps.into());
        self.clone()
    }

    fn always(self: &Arc<Self>, id: &str, step: Step) -> Arc<Self> {
        self.forever.lock().insert(id.to_string(), step);
        self.clone()
    }

    fn calls_for(&self, id: &str) -> usize {
        self.calls.lock().iter().filter(|(e, _)| e == id).count()
    }
}

#[async_trait]
impl Transport for Scripted {
    async fn issue_status_request(
        &self,
        entity: &EntityId,
        credential: &Credential,
    ) -> Result<RawResponse, TransportError> {
        self.calls
            .lock()
            .push((entity.to_string(), credential.expose().to_string()));

        let step = self
            .scripts
            .lock()
            .get_mut(entity.as_str())
            .and_then(VecDeque::pop_front)
            .or_else(|| self.forever.lock().get(entity.as_str()).cloned())
            .unwrap_or(Step::Respond(404, String::new()));

        match step {
            Step::Respond(status, body) => Ok(RawResponse::new(status, body)),
            Step::Fail(e) => Err(e),
            Step::Hang => std::future::pending().await,
        }
    }
}

#[derive(Default)]
struct Recording {
    events: Mutex<Vec<RecoveryEvent>>,
    fail: bool,
    panic: bool,
    delay: Duration,
}

#[async_trait]
impl NotificationSink for Recording {
    async fn notify_recovered(&self, event: &RecoveryEvent) -> Result<(), NotifyError> {
        self.events.lock().push(event.clone());
        if !self.delay.is_zero() {
            time::sleep(self.delay).await;
        }
        if self.panic {
            panic!("sink exploded");
        }
        if self.fail {
            return Err(NotifyError::Delivery {
                error: "chat unreachable".into(),
            });
        }
        Ok(())
    }
}

fn id(raw: &str) -> EntityId {
    EntityId::parse(raw).unwrap()
}

fn active(username: &str, followers: u64) -> Step {
    Step::Respond(
        200,
        format!(
            r#"{{"data":{{"user":{{"username":"{username}","edge_followed_by":{{"count":{followers}}}}}}}}}"#
        ),
    )
}

struct Harness {
    engine: Arc<MonitorEngine>,
    pool: Arc<CredentialPool>,
    registry: Arc<MemoryRegistry>,
    sink: Arc<Recording>,
    transport: Arc<Scripted>,
}

fn harness_with(
    cfg: EngineConfig,
    transport: Arc<Scripted>,
    sink: Recording,
    registry: MemoryRegistry,
) -> Harness {
    let pool = Arc::new(CredentialPool::new(["t1", "t2", "t3"]));
    let registry = Arc::new(registry);
    let sink = Arc::new(sink);
    let engine = EngineBuilder::new(cfg)
        .with_credentials(pool.clone())
        .with_transport(transport.clone())
        .with_registry(registry.clone())
        .with_sink(sink.clone())
        .without_log_writer()
        .build()
        .unwrap();
    Harness {
        engine,
        pool,
        registry,
        sink,
        transport,
    }
}

fn harness(transport: Arc<Scripted>) -> Harness {
    harness_with(
        EngineConfig::default(),
        transport,
        Recording::default(),
        MemoryRegistry::new(),
    )
}

/// Advances virtual time in 1s steps until `cond` holds (max ~2h).
async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..7200 {
        if cond() {
            return;
        }
        time::sleep(Duration::from_secs(1)).await;
    }
    panic!("condition not reached");
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

#[tokio::test(start_paused = true)]
async fn rate_limited_twice_then_active_recovers() {
    let transport = Arc::new(Scripted::default()).script(
        "foo",
        vec![
            Step::Respond(429, String::new()),
            Step::Respond(429, String::new()),
            active("foo", 12345),
        ],
    );
    let h = harness(transport);

    let started = h
        .engine
        .start_monitoring(id("foo"), Destination::from("chat-1"))
        .await;
    assert_eq!(started, StartOutcome::Started);

    let registry = h.registry.clone();
    wait_until(|| !registry.contains(&id("foo"))).await;

    assert_eq!(h.pool.cursor(), 2);
    let delivered = h.sink.events.lock().clone();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].entity, id("foo"));
    assert_eq!(delivered[0].destination, Destination::from("chat-1"));
    assert_eq!(delivered[0].attributes.follower_count, 12345);
    assert_eq!(delivered[0].checks, 1);

    let calls: Vec<String> = h.transport.calls.lock().iter().map(|(_, c)| c.clone()).collect();
    assert_eq!(calls, vec!["t1", "t2", "t3"]);

    time::sleep(Duration::from_secs(1)).await;
    assert!(h.engine.active().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_all_with_clear_interrupts_sleeping_task() {
    let transport = Arc::new(Scripted::default());
    let h = harness(transport);

    h.engine
        .start_monitoring(id("foo"), Destination::from("chat"))
        .await;

    // First check done, task is in its 300-600s inter-check sleep.
    let t = h.transport.clone();
    wait_until(|| t.calls_for("foo") == 1).await;
    time::sleep(Duration::from_secs(60)).await;

    let before = time::Instant::now();
    h.engine.stop_all_monitoring(true).await.unwrap();
    assert!(before.elapsed() <= h.engine.config().grace);

    assert!(!h.registry.contains(&id("foo")));
    assert!(h.engine.active().await.is_empty());
    assert!(h.sink.events.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn exhausted_timeouts_fall_back_to_next_check() {
    let transport = Arc::new(Scripted::default())
        .always("foo", Step::Fail(TransportError::Timeout));
    let h = harness(transport);
    let mut rx = h.engine.subscribe();

    h.engine
        .start_monitoring(id("foo"), Destination::from("chat"))
        .await;

    let t = h.transport.clone();
    wait_until(|| t.calls_for("foo") == 4).await;
    time::sleep(Duration::from_secs(10)).await;

    let events = drain(&mut rx);
    let completed: Vec<_> = events
        .iter()
        .filter(|e| e.kind == EventKind::CheckCompleted)
        .collect();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].outcome, Some("timeout"));
    assert!(events.iter().any(|e| e.kind == EventKind::NextCheckScheduled));
    assert!(!events.iter().any(|e| e.kind == EventKind::CredentialRotated));

    assert_eq!(h.pool.cursor(), 0);
    assert_eq!(h.engine.active().await, vec![id("foo")]);
    assert!(h.registry.contains(&id("foo")));
}

#[tokio::test(start_paused = true)]
async fn stuck_entity_does_not_delay_others() {
    let transport = Arc::new(Scripted::default()).always("slow", Step::Hang);
    let cfg = EngineConfig {
        request_timeout: Duration::ZERO,
        ..EngineConfig::default()
    };
    let h = harness_with(cfg, transport, Recording::default(), MemoryRegistry::new());

    h.engine
        .start_monitoring(id("slow"), Destination::from("a"))
        .await;
    h.engine
        .start_monitoring(id("fast"), Destination::from("b"))
        .await;

    time::sleep(Duration::from_secs(2000)).await;

    assert_eq!(h.transport.calls_for("slow"), 1);
    assert!(h.transport.calls_for("fast") >= 3);

    // The in-flight request of "slow" is dropped on cancellation.
    h.engine.stop_all_monitoring(false).await.unwrap();
    assert!(h.engine.active().await.is_empty());
    assert_eq!(h.registry.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn stop_without_task_is_noop() {
    let h = harness(Arc::new(Scripted::default()));
    h.registry.add(id("bar"), Destination::from("x"));

    assert!(!h.engine.stop_monitoring(&id("foo")).await);
    assert!(!h.engine.stop_monitoring(&id("foo")).await);
    assert!(h.registry.contains(&id("bar")));
}

#[tokio::test(start_paused = true)]
async fn start_then_stop_leaves_nothing_behind() {
    let h = harness(Arc::new(Scripted::default()));

    h.engine
        .start_monitoring(id("foo"), Destination::from("chat"))
        .await;
    assert!(h.engine.is_monitoring(&id("foo")).await);

    assert!(h.engine.stop_monitoring(&id("foo")).await);
    assert!(!h.registry.contains(&id("foo")));
    assert!(h.engine.active().await.is_empty());
    assert!(h.sink.events.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn duplicate_start_is_ignored() {
    let h = harness(Arc::new(Scripted::default()));

    let first = h
        .engine
        .start_monitoring(id("Foo"), Destination::from("chat"))
        .await;
    let second = h
        .engine
        .start_monitoring(id("@foo"), Destination::from("other"))
        .await;

    assert_eq!(first, StartOutcome::Started);
    assert_eq!(second, StartOutcome::AlreadyMonitoring);
    assert_eq!(h.engine.active().await, vec![id("foo")]);
    assert_eq!(
        h.registry.get(&id("foo")).unwrap().destination,
        Destination::from("chat")
    );
}

#[tokio::test(start_paused = true)]
async fn failing_sink_still_deregisters() {
    let transport = Arc::new(Scripted::default()).script("foo", vec![active("foo", 1)]);
    let sink = Recording {
        fail: true,
        ..Default::default()
    };
    let h = harness_with(EngineConfig::default(), transport, sink, MemoryRegistry::new());
    let mut rx = h.engine.subscribe();

    h.engine
        .start_monitoring(id("foo"), Destination::from("chat"))
        .await;
    let registry = h.registry.clone();
    wait_until(|| !registry.contains(&id("foo"))).await;

    assert_eq!(h.sink.events.lock().len(), 1);
    let failed = drain(&mut rx)
        .into_iter()
        .find(|e| e.kind == EventKind::NotificationFailed)
        .unwrap();
    assert!(failed.reason.as_deref().unwrap().contains("chat unreachable"));
}

#[tokio::test(start_paused = true)]
async fn panicking_sink_still_deregisters() {
    let transport = Arc::new(Scripted::default()).script("foo", vec![active("foo", 1)]);
    let sink = Recording {
        panic: true,
        ..Default::default()
    };
    let h = harness_with(EngineConfig::default(), transport, sink, MemoryRegistry::new());

    h.engine
        .start_monitoring(id("foo"), Destination::from("chat"))
        .await;
    let registry = h.registry.clone();
    wait_until(|| !registry.contains(&id("foo"))).await;

    time::sleep(Duration::from_secs(1)).await;
    assert!(h.engine.active().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn resume_spawns_tasks_for_registered_entities() {
    let now = Utc::now();
    let entries = ["alice", "bob"].map(|name| {
        (
            id(name),
            RegistryEntry {
                destination: Destination::from(name),
                added_at: now,
            },
        )
    });
    let h = harness_with(
        EngineConfig::default(),
        Arc::new(Scripted::default()),
        Recording::default(),
        MemoryRegistry::with_entries(entries),
    );

    assert_eq!(h.engine.resume_all_monitoring().await, 2);
    assert_eq!(h.engine.active().await, vec![id("alice"), id("bob")]);
    assert_eq!(h.engine.resume_all_monitoring().await, 0);

    // Graceful shutdown keeps the registry for the next resume.
    h.engine.stop_all_monitoring(false).await.unwrap();
    assert_eq!(h.registry.len(), 2);
    assert_eq!(h.engine.resume_all_monitoring().await, 2);
}

#[tokio::test(start_paused = true)]
async fn externally_deregistered_entity_is_cancelled() {
    let h = harness(Arc::new(Scripted::default()));
    let mut rx = h.engine.subscribe();

    h.engine
        .start_monitoring(id("foo"), Destination::from("chat"))
        .await;
    let t = h.transport.clone();
    wait_until(|| t.calls_for("foo") == 1).await;

    h.registry.remove(&id("foo"));
    time::sleep(Duration::from_secs(601)).await;

    assert!(h.engine.active().await.is_empty());
    assert_eq!(h.transport.calls_for("foo"), 1);
    assert!(
        drain(&mut rx)
            .iter()
            .any(|e| e.kind == EventKind::MonitorCancelled)
    );
}

#[tokio::test(start_paused = true)]
async fn status_reflects_checks() {
    let h = harness(Arc::new(Scripted::default()));
    h.engine
        .start_monitoring(id("foo"), Destination::from("chat"))
        .await;

    let engine = h.engine.clone();
    wait_until(|| {
        engine
            .status()
            .first()
            .is_some_and(|s| s.last_outcome == Some("suspended"))
    })
    .await;

    let status = h.engine.status();
    assert_eq!(status.len(), 1);
    assert!(status[0].running);
    assert!(status[0].checks >= 1);
}

#[tokio::test]
async fn empty_pool_is_fatal_at_build() {
    let err = EngineBuilder::new(EngineConfig::default())
        .with_credentials(Arc::new(CredentialPool::new(["", "  "])))
        .with_transport(Arc::new(Scripted::default()))
        .with_sink(Arc::new(Recording::default()))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, EngineError::EmptyPool));
}

#[tokio::test]
async fn invalid_config_is_rejected_at_build() {
    let cfg = EngineConfig {
        min_check_interval: Duration::from_secs(900),
        ..EngineConfig::default()
    };
    let err = EngineBuilder::new(cfg)
        .with_credentials(Arc::new(CredentialPool::new(["t1"])))
        .with_transport(Arc::new(Scripted::default()))
        .with_sink(Arc::new(Recording::default()))
        .build()
        .err()
        .unwrap();
    assert_eq!(err.as_label(), "engine_invalid_config");
}

#[tokio::test(start_paused = true)]
async fn stop_all_reports_tasks_stuck_past_grace() {
    let transport = Arc::new(Scripted::default()).script("foo", vec![active("foo", 7)]);
    let sink = Recording {
        delay: Duration::from_secs(60),
        ..Recording::default()
    };
    let h = harness_with(EngineConfig::default(), transport, sink, MemoryRegistry::new());

    h.engine
        .start_monitoring(id("foo"), Destination::from("chat"))
        .await;
    let sink = h.sink.clone();
    wait_until(|| !sink.events.lock().is_empty()).await;

    let before = time::Instant::now();
    let err = h.engine.stop_all_monitoring(false).await.unwrap_err();
    let grace = h.engine.config().grace;
    assert!(before.elapsed() >= grace);
    assert!(before.elapsed() < grace + Duration::from_secs(1));

    match err {
        EngineError::GraceExceeded { grace, stuck } => {
            assert_eq!(grace, Duration::from_secs(5));
            assert_eq!(stuck, vec!["foo".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Aborted mid-notification: the entry survives for the next resume.
    assert!(h.registry.contains(&id("foo")));
    assert!(h.engine.active().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn start_during_recovery_never_strands_a_registration() {
    let transport = Arc::new(Scripted::default()).script("foo", vec![active("foo", 7)]);
    let sink = Recording {
        delay: Duration::from_secs(30),
        ..Recording::default()
    };
    let h = harness_with(EngineConfig::default(), transport, sink, MemoryRegistry::new());

    h.engine
        .start_monitoring(id("foo"), Destination::from("chat"))
        .await;
    let sink = h.sink.clone();
    wait_until(|| !sink.events.lock().is_empty()).await;

    // The recovering task still owns the entity.
    let again = h
        .engine
        .start_monitoring(id("foo"), Destination::from("chat"))
        .await;
    assert_eq!(again, StartOutcome::AlreadyMonitoring);

    let registry = h.registry.clone();
    wait_until(|| !registry.contains(&id("foo"))).await;
    assert!(!h.engine.is_monitoring(&id("foo")).await);

    // Registry and task table agree, so a fresh start goes through.
    let fresh = h
        .engine
        .start_monitoring(id("foo"), Destination::from("chat"))
        .await;
    assert_eq!(fresh, StartOutcome::Started);
    assert!(h.registry.contains(&id("foo")));
    assert!(h.engine.is_monitoring(&id("foo")).await);
}
