// File: livecord-common/src/models/config.rs

use std::collections::{BTreeMap, BTreeSet};
use chrono::Duration;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, MessageMarker, RoleMarker};
use crate::models::entity::TrackedEntity;

pub const DEFAULT_COOLDOWN_MINUTES: u32 = 5;
/// One day; anything above that is almost certainly a typo.
pub const MAX_COOLDOWN_MINUTES: u32 = 24 * 60;

/// The durable configuration document, stored as JSON.
///
/// Keys are camelCase so existing `config.json` files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    #[serde(deserialize_with = "lenient_streamers")]
    pub streamers: Vec<TrackedEntity>,
    pub channel_id: Option<Id<ChannelMarker>>,
    pub role_id: Option<Id<RoleMarker>>,
    pub cooldown_minutes: u32,
    /// Durable shadow of each entity's outstanding notification message.
    #[serde(deserialize_with = "lenient_message_ids")]
    pub live_message_ids: BTreeMap<TrackedEntity, Id<MessageMarker>>,
}

/// A hand-edited bad login is skipped with a warning instead of failing the
/// whole document. Duplicates after normalization are dropped.
fn lenient_streamers<'de, D>(deserializer: D) -> Result<Vec<TrackedEntity>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    let mut streamers: Vec<TrackedEntity> = Vec::with_capacity(raw.len());
    for login in raw {
        match TrackedEntity::new(&login) {
            Ok(entity) if !streamers.contains(&entity) => streamers.push(entity),
            Ok(_) => {}
            Err(e) => warn!("Ignoring streamer entry {login:?} in config: {e}"),
        }
    }
    Ok(streamers)
}

fn lenient_message_ids<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<TrackedEntity, Id<MessageMarker>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Id<MessageMarker>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(login, id)| match TrackedEntity::new(&login) {
            Ok(entity) => Some((entity, id)),
            Err(e) => {
                warn!("Ignoring live message id for {login:?} in config: {e}");
                None
            }
        })
        .collect())
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            streamers: Vec::new(),
            channel_id: None,
            role_id: None,
            cooldown_minutes: DEFAULT_COOLDOWN_MINUTES,
            live_message_ids: BTreeMap::new(),
        }
    }
}

/// Process-level fallbacks (env / CLI) used when the document leaves a value unset.
#[derive(Debug, Clone, Default)]
pub struct ConfigDefaults {
    pub streamers: Vec<TrackedEntity>,
    pub channel_id: Option<Id<ChannelMarker>>,
    pub role_id: Option<Id<RoleMarker>>,
}

impl Configuration {
    pub fn cooldown(&self) -> Duration {
        Duration::minutes(i64::from(self.cooldown_minutes))
    }

    pub fn effective_streamers(&self, defaults: &ConfigDefaults) -> BTreeSet<TrackedEntity> {
        if self.streamers.is_empty() {
            defaults.streamers.iter().cloned().collect()
        } else {
            self.streamers.iter().cloned().collect()
        }
    }

    pub fn effective_channel(&self, defaults: &ConfigDefaults) -> Option<Id<ChannelMarker>> {
        self.channel_id.or(defaults.channel_id)
    }

    pub fn effective_role(&self, defaults: &ConfigDefaults) -> Option<Id<RoleMarker>> {
        self.role_id.or(defaults.role_id)
    }

    /// Adds an entity; returns false if it was already tracked.
    pub fn add_streamer(&mut self, entity: TrackedEntity) -> bool {
        if self.streamers.contains(&entity) {
            return false;
        }
        self.streamers.push(entity);
        true
    }

    /// Removes an entity together with its stored message id.
    pub fn remove_streamer(&mut self, entity: &TrackedEntity) -> bool {
        let before = self.streamers.len();
        self.streamers.retain(|s| s != entity);
        self.live_message_ids.remove(entity);
        self.streamers.len() != before
    }
}
