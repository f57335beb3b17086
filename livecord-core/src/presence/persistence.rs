// File: livecord-core/src/presence/persistence.rs

use twilight_model::id::Id;
use twilight_model::id::marker::MessageMarker;

use livecord_common::models::{ConfigDefaults, Configuration, TrackedEntity};

use crate::Error;
use crate::repositories::ConfigHandle;

/// Mirrors notification message ids into the `liveMessageIds` map of the
/// configuration document so they survive a restart.
#[derive(Clone)]
pub struct PersistenceBridge {
    config: ConfigHandle,
}

impl PersistenceBridge {
    pub fn new(config: ConfigHandle) -> Self {
        Self { config }
    }

    pub async fn load(&self) -> Result<Configuration, Error> {
        self.config.load().await
    }

    /// Stores the id only while `entity` is still tracked, so a removal that
    /// lands during a send is not undone. Returns whether the id was stored.
    pub async fn record_message(
        &self,
        entity: &TrackedEntity,
        message_id: Id<MessageMarker>,
        defaults: &ConfigDefaults,
    ) -> Result<bool, Error> {
        let entity = entity.clone();
        let defaults = defaults.clone();
        self.config
            .try_modify(move |c| {
                if !c.effective_streamers(&defaults).contains(&entity) {
                    return Ok(false);
                }
                c.live_message_ids.insert(entity, message_id);
                Ok(true)
            })
            .await
    }

    /// Removing an id that is not stored is a no-op.
    pub async fn clear_message(&self, entity: &TrackedEntity) -> Result<(), Error> {
        let entity = entity.clone();
        self.config
            .modify(move |c| {
                c.live_message_ids.remove(&entity);
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_utils::MemoryConfigStore;

    fn entity(login: &str) -> TrackedEntity {
        TrackedEntity::new(login).unwrap()
    }

    #[tokio::test]
    async fn untracked_entity_is_not_written_back() -> Result<(), Error> {
        let mut doc = Configuration::default();
        doc.add_streamer(entity("bob"));
        let store = Arc::new(MemoryConfigStore::new(doc));
        let bridge = PersistenceBridge::new(ConfigHandle::new(store.clone()));
        let defaults = ConfigDefaults::default();

        assert!(!bridge.record_message(&entity("alice"), Id::new(1), &defaults).await?);
        assert!(bridge.record_message(&entity("bob"), Id::new(2), &defaults).await?);

        let stored = store.snapshot().live_message_ids;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored.get(&entity("bob")), Some(&Id::new(2)));
        Ok(())
    }

    #[tokio::test]
    async fn fallback_list_counts_as_tracked() -> Result<(), Error> {
        let store = Arc::new(MemoryConfigStore::new(Configuration::default()));
        let bridge = PersistenceBridge::new(ConfigHandle::new(store.clone()));
        let defaults = ConfigDefaults {
            streamers: vec![entity("alice")],
            ..ConfigDefaults::default()
        };

        assert!(bridge.record_message(&entity("alice"), Id::new(3), &defaults).await?);
        bridge.clear_message(&entity("alice")).await?;
        assert!(store.snapshot().live_message_ids.is_empty());
        Ok(())
    }
}
