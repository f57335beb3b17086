// File: livecord-core/src/presence/engine.rs

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, RoleMarker};

use livecord_common::models::{BroadcastSnapshot, ConfigDefaults, LiveAnnouncement, TrackedEntity};
use livecord_common::traits::{AnnouncementGateway, Clock, StatusProvider};

use crate::Error;
use crate::presence::persistence::PersistenceBridge;
use crate::presence::table::{PresenceState, PresenceTable};

/// Counts of what one pass did, mainly for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub live: usize,
    pub sent: usize,
    pub edited: usize,
    pub cleared: usize,
    pub suppressed: usize,
    pub failed: usize,
}

impl PassReport {
    pub fn changed_anything(&self) -> bool {
        self.sent + self.cleared + self.failed > 0
    }
}

/// Values every transition in a pass needs; re-read from config each pass.
struct PassContext {
    channel_id: Id<ChannelMarker>,
    role_id: Option<Id<RoleMarker>>,
    cooldown: Duration,
    now: DateTime<Utc>,
}

/// Reconciles the provider's live set against the [`PresenceTable`].
///
/// Table mutations happen only after the external call they depend on has
/// succeeded, so a failed pass leaves the table where the last good pass put it.
pub struct NotificationEngine {
    provider: Arc<dyn StatusProvider>,
    gateway: Arc<dyn AnnouncementGateway>,
    bridge: PersistenceBridge,
    clock: Arc<dyn Clock>,
    defaults: ConfigDefaults,
    table: PresenceTable,
}

impl NotificationEngine {
    pub fn new(
        provider: Arc<dyn StatusProvider>,
        gateway: Arc<dyn AnnouncementGateway>,
        bridge: PersistenceBridge,
        clock: Arc<dyn Clock>,
        defaults: ConfigDefaults,
    ) -> Self {
        Self {
            provider,
            gateway,
            bridge,
            clock,
            defaults,
            table: PresenceTable::new(),
        }
    }

    pub fn table(&self) -> &PresenceTable {
        &self.table
    }

    /// Seeds the table from the stored message ids of tracked entities.
    pub async fn rehydrate(&mut self) -> Result<usize, Error> {
        let config = self.bridge.load().await?;
        let tracked = config.effective_streamers(&self.defaults);
        // When these were announced is unknown, but it was no later than now.
        let cooldown_until = self.clock.now() + config.cooldown();
        let restored = self.table.rehydrate(
            config
                .live_message_ids
                .iter()
                .filter(|(entity, _)| tracked.contains(*entity)),
            cooldown_until,
        );
        if restored > 0 {
            info!(restored, "Rehydrated live notifications from config");
        }
        Ok(restored)
    }

    /// One provider call with no messages sent. Whoever is live right now is
    /// treated as already announced; stored ids of offline entities are dropped.
    pub async fn prime(&mut self) -> Result<usize, Error> {
        let config = self.bridge.load().await?;
        let tracked = config.effective_streamers(&self.defaults);
        self.table.retain_tracked(&tracked);
        if tracked.is_empty() {
            return Ok(0);
        }

        let live: BTreeSet<TrackedEntity> = self
            .provider
            .live_broadcasts(&tracked)
            .await?
            .iter()
            .map(|snap| snap.entity().clone())
            .filter(|entity| tracked.contains(entity))
            .collect();

        let cooldown_until = self.clock.now() + config.cooldown();
        for entity in &live {
            let record = self.table.record_mut(entity);
            let message_id = record.notification_message_id;
            record.mark_announced(message_id, Some(cooldown_until));
        }

        let stale: Vec<TrackedEntity> = self.table.live_set().difference(&live).cloned().collect();
        for entity in &stale {
            if self.table.record_mut(entity).mark_offline().is_some() {
                if let Err(e) = self.bridge.clear_message(entity).await {
                    error!(entity = %entity, error = %e, "Failed to drop stale live message id");
                }
            }
        }

        info!(live = live.len(), stale = stale.len(), "Primed presence state");
        Ok(live.len())
    }

    /// One reconciliation pass.
    ///
    /// `Err` means the pass was aborted before any transition was applied
    /// (config unreadable or the status lookup failed). Per-entity delivery
    /// failures are counted in the report instead.
    pub async fn run_pass(&mut self) -> Result<PassReport, Error> {
        let config = self.bridge.load().await?;
        let tracked = config.effective_streamers(&self.defaults);

        for entity in self.table.retain_tracked(&tracked) {
            debug!(entity = %entity, "No longer tracked; dropping presence record");
        }

        let Some(channel_id) = config.effective_channel(&self.defaults) else {
            debug!("No notification channel configured; skipping pass");
            return Ok(PassReport::default());
        };
        if tracked.is_empty() {
            return Ok(PassReport::default());
        }

        let live: BTreeMap<TrackedEntity, BroadcastSnapshot> = self
            .provider
            .live_broadcasts(&tracked)
            .await?
            .into_iter()
            .filter(|snap| tracked.contains(snap.entity()))
            .map(|snap| (snap.entity().clone(), snap))
            .collect();

        let ctx = PassContext {
            channel_id,
            role_id: config.effective_role(&self.defaults),
            cooldown: config.cooldown(),
            now: self.clock.now(),
        };
        let previously_live = self.table.live_set();
        let mut report = PassReport {
            live: live.len(),
            ..PassReport::default()
        };

        for (entity, snapshot) in &live {
            if previously_live.contains(entity) {
                self.continue_session(&ctx, entity, snapshot, &mut report).await;
            } else {
                self.start_session(&ctx, entity, snapshot, &mut report).await;
            }
        }

        for entity in previously_live.iter().filter(|e| !live.contains_key(*e)) {
            self.end_session(entity, &mut report).await;
        }

        Ok(report)
    }

    async fn start_session(
        &mut self,
        ctx: &PassContext,
        entity: &TrackedEntity,
        snapshot: &BroadcastSnapshot,
        report: &mut PassReport,
    ) {
        let record = self.table.record_mut(entity);
        if record.cooldown_active(ctx.now) {
            record.mark_suppressed();
            report.suppressed += 1;
            info!(
                entity = %entity,
                until = ?record.cooldown_until,
                "Went live during cooldown; holding notification"
            );
            return;
        }
        self.announce(ctx, entity, snapshot, report).await;
    }

    async fn continue_session(
        &mut self,
        ctx: &PassContext,
        entity: &TrackedEntity,
        snapshot: &BroadcastSnapshot,
        report: &mut PassReport,
    ) {
        let record = self.table.record_mut(entity);
        match record.state() {
            PresenceState::LiveAnnounced => {
                let Some(message_id) = record.notification_message_id else {
                    // Was already live at startup; nothing of ours to refresh.
                    return;
                };
                let announcement = LiveAnnouncement::from_snapshot(snapshot);
                match self.gateway.edit(ctx.channel_id, message_id, &announcement).await {
                    Ok(()) => {
                        report.edited += 1;
                        debug!(
                            entity = %entity,
                            %message_id,
                            viewers = snapshot.viewer_count,
                            "Refreshed live message"
                        );
                    }
                    Err(e) => {
                        report.failed += 1;
                        warn!(
                            entity = %entity,
                            %message_id,
                            error = %e,
                            "Failed to update live message"
                        );
                    }
                }
            }
            PresenceState::LiveCooldownSuppressed => {
                if record.cooldown_active(ctx.now) {
                    report.suppressed += 1;
                } else {
                    self.announce(ctx, entity, snapshot, report).await;
                }
            }
            PresenceState::Offline => {
                self.start_session(ctx, entity, snapshot, report).await;
            }
        }
    }

    async fn end_session(&mut self, entity: &TrackedEntity, report: &mut PassReport) {
        let record = self.table.record_mut(entity);
        let was_announced = record.state() == PresenceState::LiveAnnounced;
        let cleared = record.mark_offline();

        if let Some(message_id) = cleared {
            report.cleared += 1;
            info!(entity = %entity, %message_id, "Stream ended; releasing live message");
            if let Err(e) = self.bridge.clear_message(entity).await {
                error!(
                    entity = %entity,
                    error = %e,
                    "Failed to remove live message id from config"
                );
            }
        } else if !was_announced {
            debug!(entity = %entity, "Went offline before its held notification was sent");
        }
    }

    async fn announce(
        &mut self,
        ctx: &PassContext,
        entity: &TrackedEntity,
        snapshot: &BroadcastSnapshot,
        report: &mut PassReport,
    ) {
        let announcement = LiveAnnouncement::from_snapshot(snapshot);
        let content = announcement.content(ctx.role_id);

        let message_id = match self.gateway.send(ctx.channel_id, &content, &announcement).await {
            Ok(id) => id,
            Err(e) => {
                report.failed += 1;
                warn!(
                    entity = %entity,
                    channel_id = %ctx.channel_id,
                    error = %e,
                    "Failed to send live notification"
                );
                return;
            }
        };

        self.table
            .record_mut(entity)
            .mark_announced(Some(message_id), Some(ctx.now + ctx.cooldown));
        report.sent += 1;
        info!(entity = %entity, %message_id, title = %snapshot.title, "Sent live notification");

        match self
            .bridge
            .record_message(entity, message_id, &self.defaults)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                debug!(entity = %entity, "No longer tracked; live message id not stored");
            }
            Err(e) => error!(
                entity = %entity,
                %message_id,
                error = %e,
                "Live message id NOT persisted; a restart may announce this stream again"
            ),
        }
    }
}
