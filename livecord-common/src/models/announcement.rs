// File: livecord-common/src/models/announcement.rs

use chrono::{DateTime, Utc};
use twilight_model::id::Id;
use twilight_model::id::marker::RoleMarker;
use crate::models::broadcast::BroadcastSnapshot;

pub const THUMBNAIL_WIDTH: u32 = 1280;
pub const THUMBNAIL_HEIGHT: u32 = 720;

/// Platform-neutral payload handed to the messaging gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveAnnouncement {
    pub display_name: String,
    pub title: String,
    pub category: String,
    pub viewer_count: u64,
    pub stream_url: String,
    pub thumbnail_url: String,
    pub started_at: Option<DateTime<Utc>>,
}

impl LiveAnnouncement {
    pub fn from_snapshot(snapshot: &BroadcastSnapshot) -> Self {
        Self {
            display_name: snapshot.display_name.clone(),
            title: snapshot.title.clone(),
            category: snapshot.category_name.clone(),
            viewer_count: snapshot.viewer_count,
            stream_url: snapshot.entity().stream_url(),
            thumbnail_url: snapshot.thumbnail_url(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT),
            started_at: snapshot.started_at,
        }
    }

    /// Plain message text sent alongside a new notification.
    pub fn content(&self, mention: Option<Id<RoleMarker>>) -> String {
        match mention {
            Some(role) => format!("<@&{}> **{}** is now live!", role, self.display_name),
            None => format!("**{}** is now live!", self.display_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_mentions_role_when_configured() {
        let ann = LiveAnnouncement {
            display_name: "Alice".into(),
            title: "Ranked grind".into(),
            category: "Chess".into(),
            viewer_count: 3,
            stream_url: "https://twitch.tv/alice".into(),
            thumbnail_url: String::new(),
            started_at: None,
        };
        assert_eq!(ann.content(None), "**Alice** is now live!");
        assert_eq!(ann.content(Some(Id::new(42))), "<@&42> **Alice** is now live!");
    }
}
