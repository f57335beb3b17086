// File: livecord-core/tests/poll_task_tests.rs

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use twilight_model::id::Id;

use livecord_common::models::{BroadcastSnapshot, ConfigDefaults, Configuration, TrackedEntity};
use livecord_common::traits::{StatusProvider, SystemClock};
use livecord_core::Error;
use livecord_core::presence::{NotificationEngine, PersistenceBridge};
use livecord_core::repositories::ConfigHandle;
use livecord_core::tasks::spawn_live_poll_task;
use livecord_core::test_utils::{
    snapshot, MemoryConfigStore, RecordingGateway, ScriptedStatusProvider,
};

/// Provider whose every call takes `delay` and tracks overlap.
struct SlowProvider {
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl SlowProvider {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl StatusProvider for SlowProvider {
    async fn live_broadcasts(
        &self,
        _entities: &BTreeSet<TrackedEntity>,
    ) -> Result<Vec<BroadcastSnapshot>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(vec![snapshot("alice", "slow")])
    }
}

fn tracked_config() -> Configuration {
    let mut doc = Configuration::default();
    doc.add_streamer(TrackedEntity::new("alice").unwrap());
    doc.channel_id = Some(Id::new(1));
    doc
}

fn engine_with(
    provider: Arc<dyn StatusProvider>,
    gateway: Arc<RecordingGateway>,
) -> NotificationEngine {
    let store = Arc::new(MemoryConfigStore::new(tracked_config()));
    NotificationEngine::new(
        provider,
        gateway,
        PersistenceBridge::new(ConfigHandle::new(store)),
        Arc::new(SystemClock),
        ConfigDefaults::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_slow_passes_never_overlap() {
    let provider = Arc::new(SlowProvider::new(Duration::from_secs(150)));
    let gateway = Arc::new(RecordingGateway::new());
    let engine = engine_with(provider.clone(), gateway.clone());

    let (tx, rx) = watch::channel(false);
    let handle = spawn_live_poll_task(engine, Duration::from_secs(60), rx);

    tokio::time::sleep(Duration::from_secs(600)).await;
    tx.send(true).unwrap();
    handle.await.unwrap();

    assert_eq!(provider.max_in_flight.load(Ordering::SeqCst), 1);
    let calls = provider.calls.load(Ordering::SeqCst);
    assert!(
        (3..=5).contains(&calls),
        "missed ticks must be skipped, not queued (got {calls} passes)"
    );
    assert_eq!(gateway.sends().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_first_pass_runs_immediately_then_on_interval() {
    let provider = Arc::new(ScriptedStatusProvider::new());
    let gateway = Arc::new(RecordingGateway::new());
    let engine = engine_with(provider.clone(), gateway.clone());

    let (tx, rx) = watch::channel(false);
    let handle = spawn_live_poll_task(engine, Duration::from_secs(60), rx);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(provider.calls(), 1);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(provider.calls(), 3);

    tx.send(true).unwrap();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failed_pass_does_not_stop_the_loop() {
    let provider = Arc::new(ScriptedStatusProvider::new());
    provider.set_live(vec![snapshot("alice", "a")]);
    provider.fail_next(Error::TransientNetwork("connection reset".into()));
    let gateway = Arc::new(RecordingGateway::new());
    let engine = engine_with(provider.clone(), gateway.clone());

    let (tx, rx) = watch::channel(false);
    let handle = spawn_live_poll_task(engine, Duration::from_secs(60), rx);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(gateway.calls().is_empty());

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(gateway.sends().len(), 1);

    tx.send(true).unwrap();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_sender_stops_the_task() {
    let provider = Arc::new(ScriptedStatusProvider::new());
    let engine = engine_with(provider.clone(), Arc::new(RecordingGateway::new()));

    let (tx, rx) = watch::channel(false);
    let handle = spawn_live_poll_task(engine, Duration::from_secs(60), rx);
    tokio::time::sleep(Duration::from_secs(1)).await;
    drop(tx);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("task should stop")
        .unwrap();
}
