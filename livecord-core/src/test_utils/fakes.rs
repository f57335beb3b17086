// File: livecord-core/src/test_utils/fakes.rs

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, MessageMarker};
use twitch_oauth2::AccessToken;

use livecord_common::models::broadcast::UNKNOWN_CATEGORY;
use livecord_common::models::{
    AppToken, BroadcastSnapshot, Configuration, LiveAnnouncement, TrackedEntity,
};
use livecord_common::traits::{
    AnnouncementGateway, Clock, ConfigStore, StatusProvider, TokenExchange,
};

use crate::Error;

/// Builds a live snapshot for `login` with the given title.
pub fn snapshot(login: &str, title: &str) -> BroadcastSnapshot {
    let entity = TrackedEntity::new(login).expect("valid test login");
    let mut display_name = entity.as_str().to_string();
    if let Some(first) = display_name.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    BroadcastSnapshot {
        id: format!("session-{login}"),
        account_id: format!("id-{login}"),
        account_name: entity,
        display_name,
        title: title.to_string(),
        category_id: String::new(),
        category_name: UNKNOWN_CATEGORY.to_string(),
        viewer_count: 0,
        thumbnail_url_template: format!("https://cdn/live_user_{login}-{{width}}x{{height}}.jpg"),
        started_at: None,
    }
}

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Token exchange that counts calls and optionally takes a while to answer.
pub struct CountingExchange {
    calls: AtomicUsize,
    delay: StdDuration,
    lifetime: Duration,
}

impl CountingExchange {
    pub fn new(delay: StdDuration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
            lifetime: Duration::hours(1),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenExchange for CountingExchange {
    async fn exchange(&self) -> Result<AppToken, Error> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(AppToken {
            access_token: AccessToken::new(format!("token-{n}")),
            expires_at: Utc::now() + self.lifetime,
        })
    }
}

/// Status provider whose answer is set by the test.
#[derive(Default)]
pub struct ScriptedStatusProvider {
    live: Mutex<Vec<BroadcastSnapshot>>,
    fail_next: Mutex<Option<Error>>,
    calls: AtomicUsize,
    last_request: Mutex<BTreeSet<TrackedEntity>>,
}

impl ScriptedStatusProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_live(&self, snapshots: Vec<BroadcastSnapshot>) {
        *self.live.lock() = snapshots;
    }

    pub fn fail_next(&self, err: Error) {
        *self.fail_next.lock() = Some(err);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> BTreeSet<TrackedEntity> {
        self.last_request.lock().clone()
    }
}

#[async_trait]
impl StatusProvider for ScriptedStatusProvider {
    async fn live_broadcasts(
        &self,
        entities: &BTreeSet<TrackedEntity>,
    ) -> Result<Vec<BroadcastSnapshot>, Error> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = entities.clone();
        if let Some(err) = self.fail_next.lock().take() {
            return Err(err);
        }
        Ok(self
            .live
            .lock()
            .iter()
            .filter(|s| entities.contains(s.entity()))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Send {
        channel_id: Id<ChannelMarker>,
        content: String,
        announcement: LiveAnnouncement,
        message_id: Id<MessageMarker>,
    },
    Edit {
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        announcement: LiveAnnouncement,
    },
}

/// Gateway that records every call and hands out sequential message ids.
pub struct RecordingGateway {
    calls: Mutex<Vec<GatewayCall>>,
    next_id: AtomicU64,
    failing: Mutex<HashSet<String>>,
}

impl Default for RecordingGateway {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1000),
            failing: Mutex::new(HashSet::new()),
        }
    }
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends and edits for this display name fail until `recover` is called.
    pub fn fail_for(&self, display_name: &str) {
        self.failing.lock().insert(display_name.to_string());
    }

    pub fn recover(&self, display_name: &str) {
        self.failing.lock().remove(display_name);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    pub fn sends(&self) -> Vec<GatewayCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, GatewayCall::Send { .. }))
            .collect()
    }

    pub fn edits(&self) -> Vec<GatewayCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, GatewayCall::Edit { .. }))
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn check(&self, announcement: &LiveAnnouncement) -> Result<(), Error> {
        if self.failing.lock().contains(&announcement.display_name) {
            return Err(Error::GatewayDelivery(format!(
                "scripted failure for {}",
                announcement.display_name
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl AnnouncementGateway for RecordingGateway {
    async fn send(
        &self,
        channel_id: Id<ChannelMarker>,
        content: &str,
        announcement: &LiveAnnouncement,
    ) -> Result<Id<MessageMarker>, Error> {
        self.check(announcement)?;
        let message_id = Id::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.calls.lock().push(GatewayCall::Send {
            channel_id,
            content: content.to_string(),
            announcement: announcement.clone(),
            message_id,
        });
        Ok(message_id)
    }

    async fn edit(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        announcement: &LiveAnnouncement,
    ) -> Result<(), Error> {
        self.check(announcement)?;
        self.calls.lock().push(GatewayCall::Edit {
            channel_id,
            message_id,
            announcement: announcement.clone(),
        });
        Ok(())
    }
}

/// Config store backed by memory, with a switch to make saves fail.
#[derive(Default)]
pub struct MemoryConfigStore {
    doc: Mutex<Configuration>,
    fail_saves: Mutex<bool>,
    saves: AtomicUsize,
}

impl MemoryConfigStore {
    pub fn new(doc: Configuration) -> Self {
        Self {
            doc: Mutex::new(doc),
            fail_saves: Mutex::new(false),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn snapshot(&self) -> Configuration {
        self.doc.lock().clone()
    }

    pub fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.lock() = fail;
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> Result<Configuration, Error> {
        Ok(self.doc.lock().clone())
    }

    async fn save(&self, config: &Configuration) -> Result<(), Error> {
        if *self.fail_saves.lock() {
            return Err(Error::Persistence("scripted save failure".into()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.doc.lock() = config.clone();
        Ok(())
    }
}
