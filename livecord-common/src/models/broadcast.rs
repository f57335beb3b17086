// File: livecord-common/src/models/broadcast.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::models::entity::TrackedEntity;

pub const UNTITLED_BROADCAST: &str = "Untitled Broadcast";
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// One live broadcast as reported by a single poll. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastSnapshot {
    /// Provider session id; changes between sessions.
    pub id: String,
    pub account_id: String,
    pub account_name: TrackedEntity,
    pub display_name: String,
    pub title: String,
    pub category_id: String,
    pub category_name: String,
    pub viewer_count: u64,
    /// Contains `{width}` and `{height}` placeholders.
    pub thumbnail_url_template: String,
    pub started_at: Option<DateTime<Utc>>,
}

impl BroadcastSnapshot {
    pub fn entity(&self) -> &TrackedEntity {
        &self.account_name
    }

    pub fn thumbnail_url(&self, width: u32, height: u32) -> String {
        self.thumbnail_url_template
            .replace("{width}", &width.to_string())
            .replace("{height}", &height.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_thumbnail_template() {
        let snap = BroadcastSnapshot {
            id: "1".into(),
            account_id: "10".into(),
            account_name: TrackedEntity::new("alice").unwrap(),
            display_name: "Alice".into(),
            title: "t".into(),
            category_id: String::new(),
            category_name: UNKNOWN_CATEGORY.into(),
            viewer_count: 0,
            thumbnail_url_template: "https://cdn/live_user_alice-{width}x{height}.jpg".into(),
            started_at: None,
        };
        assert_eq!(
            snap.thumbnail_url(1280, 720),
            "https://cdn/live_user_alice-1280x720.jpg"
        );
    }
}
