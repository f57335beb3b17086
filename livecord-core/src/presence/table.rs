// File: livecord-core/src/presence/table.rs

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use twilight_model::id::Id;
use twilight_model::id::marker::MessageMarker;

use livecord_common::models::TrackedEntity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    Offline,
    /// Live, and the session has a notification (or was live before we started).
    LiveAnnounced,
    /// Live, but the notification is held back until the cooldown expires.
    LiveCooldownSuppressed,
}

/// Runtime state for one tracked entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresenceRecord {
    pub is_live: bool,
    /// True once the current session counts as announced.
    pub announced: bool,
    pub notification_message_id: Option<Id<MessageMarker>>,
    /// Survives going offline; blocks new notifications (not edits) until it passes.
    pub cooldown_until: Option<DateTime<Utc>>,
}

impl PresenceRecord {
    pub fn state(&self) -> PresenceState {
        match (self.is_live, self.announced) {
            (false, _) => PresenceState::Offline,
            (true, true) => PresenceState::LiveAnnounced,
            (true, false) => PresenceState::LiveCooldownSuppressed,
        }
    }

    pub fn cooldown_active(&self, now: DateTime<Utc>) -> bool {
        self.cooldown_until.is_some_and(|until| until > now)
    }

    pub(crate) fn mark_announced(
        &mut self,
        message_id: Option<Id<MessageMarker>>,
        cooldown_until: Option<DateTime<Utc>>,
    ) {
        self.is_live = true;
        self.announced = true;
        self.notification_message_id = message_id;
        if cooldown_until.is_some() {
            self.cooldown_until = cooldown_until;
        }
    }

    pub(crate) fn mark_suppressed(&mut self) {
        self.is_live = true;
        self.announced = false;
        self.notification_message_id = None;
    }

    /// Ends the session; returns the message id that was outstanding, if any.
    pub(crate) fn mark_offline(&mut self) -> Option<Id<MessageMarker>> {
        self.is_live = false;
        self.announced = false;
        self.notification_message_id.take()
    }
}

/// In-memory entity -> [`PresenceRecord`] map, owned by the engine.
///
/// Records are created lazily and only removed when an entity stops being tracked.
#[derive(Debug, Default)]
pub struct PresenceTable {
    records: BTreeMap<TrackedEntity, PresenceRecord>,
}

impl PresenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity: &TrackedEntity) -> Option<&PresenceRecord> {
        self.records.get(entity)
    }

    pub(crate) fn record_mut(&mut self, entity: &TrackedEntity) -> &mut PresenceRecord {
        self.records.entry(entity.clone()).or_default()
    }

    pub fn state(&self, entity: &TrackedEntity) -> PresenceState {
        self.get(entity).map_or(PresenceState::Offline, PresenceRecord::state)
    }

    /// Entities whose record says they were live after the last pass.
    pub fn live_set(&self) -> BTreeSet<TrackedEntity> {
        self.records
            .iter()
            .filter(|(_, r)| r.is_live)
            .map(|(e, _)| e.clone())
            .collect()
    }

    /// Drops records for entities no longer tracked; returns the dropped ones.
    pub(crate) fn retain_tracked(
        &mut self,
        tracked: &BTreeSet<TrackedEntity>,
    ) -> Vec<TrackedEntity> {
        let dropped: Vec<TrackedEntity> = self
            .records
            .keys()
            .filter(|e| !tracked.contains(*e))
            .cloned()
            .collect();
        for entity in &dropped {
            self.records.remove(entity);
        }
        dropped
    }

    /// Seeds records from the durable message-id map so the next pass
    /// edits these messages instead of announcing again. Each restored
    /// record gets `cooldown_until` armed.
    pub(crate) fn rehydrate<'a>(
        &mut self,
        message_ids: impl IntoIterator<Item = (&'a TrackedEntity, &'a Id<MessageMarker>)>,
        cooldown_until: DateTime<Utc>,
    ) -> usize {
        let mut n = 0;
        for (entity, message_id) in message_ids {
            self.record_mut(entity)
                .mark_announced(Some(*message_id), Some(cooldown_until));
            n += 1;
        }
        n
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TrackedEntity, &PresenceRecord)> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entity(login: &str) -> TrackedEntity {
        TrackedEntity::new(login).unwrap()
    }

    #[test]
    fn unknown_entity_is_offline() {
        let table = PresenceTable::new();
        assert_eq!(table.state(&entity("alice")), PresenceState::Offline);
        assert!(table.is_empty());
    }

    #[test]
    fn transitions_through_states() {
        let now = Utc::now();
        let mut table = PresenceTable::new();
        let alice = entity("alice");

        table.record_mut(&alice).mark_suppressed();
        assert_eq!(table.state(&alice), PresenceState::LiveCooldownSuppressed);

        table
            .record_mut(&alice)
            .mark_announced(Some(Id::new(1)), Some(now + Duration::minutes(5)));
        assert_eq!(table.state(&alice), PresenceState::LiveAnnounced);
        assert!(table.get(&alice).unwrap().cooldown_active(now));

        let cleared = table.record_mut(&alice).mark_offline();
        assert_eq!(cleared, Some(Id::new(1)));
        let record = table.get(&alice).unwrap();
        assert_eq!(record.state(), PresenceState::Offline);
        assert!(record.notification_message_id.is_none());
        assert!(record.cooldown_active(now), "cooldown outlives the session");
        assert!(!record.cooldown_active(now + Duration::minutes(5)));
    }

    #[test]
    fn retain_drops_untracked_records() {
        let mut table = PresenceTable::new();
        table.record_mut(&entity("alice")).mark_suppressed();
        table.record_mut(&entity("bob")).mark_suppressed();

        let tracked: BTreeSet<_> = [entity("bob")].into_iter().collect();
        let dropped = table.retain_tracked(&tracked);
        assert_eq!(dropped, vec![entity("alice")]);
        assert_eq!(table.live_set(), tracked);
    }

    #[test]
    fn rehydrate_marks_entities_announced() {
        let now = Utc::now();
        let mut ids = BTreeMap::new();
        ids.insert(entity("alice"), Id::new(77));
        let mut table = PresenceTable::new();
        assert_eq!(table.rehydrate(&ids, now + Duration::minutes(5)), 1);
        let record = table.get(&entity("alice")).unwrap();
        assert_eq!(record.state(), PresenceState::LiveAnnounced);
        assert_eq!(record.notification_message_id, Some(Id::new(77)));
        assert!(record.cooldown_active(now));
        assert!(!record.cooldown_active(now + Duration::minutes(5)));
    }
}
