// ========================================================
// File: livecord-core/src/platforms/twitch/requests/stream.rs
// ========================================================
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use livecord_common::models::broadcast::{UNKNOWN_CATEGORY, UNTITLED_BROADCAST};
use livecord_common::models::{AppToken, BroadcastSnapshot, TrackedEntity};

use crate::Error;
use crate::platforms::twitch::client::TwitchHelixClient;

/// Response from "Get Streams" endpoint.
#[derive(Debug, Deserialize)]
pub struct StreamsResponse {
    #[serde(default)]
    pub data: Vec<StreamData>,
}

/// Single stream data record.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamData {
    pub id: String,
    pub user_id: String,
    pub user_login: String,
    pub user_name: String,
    #[serde(default)]
    pub game_id: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(rename = "type", default)]
    pub type_field: String, // "live", or "" on error
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub viewer_count: u64,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub thumbnail_url: String,
}

/// Response from "Get Games" endpoint.
#[derive(Debug, Deserialize)]
pub struct GamesResponse {
    #[serde(default)]
    pub data: Vec<GameData>,
}

/// Single game record.
#[derive(Debug, Deserialize)]
pub struct GameData {
    pub id: String,
    pub name: String,
}

/// Asks for full pages; without `first` Helix returns only 20 records.
const PAGE_SIZE_PARAM: (&str, &str) = ("first", "100");

/// One "Get Streams" request for up to 100 logins.
///
/// `first=100` makes the single page large enough for every requested login
/// to come back live, so no cursor needs following.
pub async fn fetch_streams(
    client: &TwitchHelixClient,
    token: AppToken,
    logins: &[TrackedEntity],
) -> Result<Vec<StreamData>, Error> {
    let query: Vec<(&str, &str)> = std::iter::once(PAGE_SIZE_PARAM)
        .chain(logins.iter().map(|login| ("user_login", login.as_str())))
        .collect();
    let resp: StreamsResponse = client.get_json("streams", &query, &token).await?;
    debug!(requested = logins.len(), live = resp.data.len(), "Fetched live streams");
    Ok(resp.data)
}

/// One "Get Games" request for up to 100 category ids, as id -> name.
pub async fn fetch_games(
    client: &TwitchHelixClient,
    token: AppToken,
    game_ids: &[String],
) -> Result<HashMap<String, String>, Error> {
    if game_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let query: Vec<(&str, &str)> = std::iter::once(PAGE_SIZE_PARAM)
        .chain(game_ids.iter().map(|id| ("id", id.as_str())))
        .collect();
    let resp: GamesResponse = client.get_json("games", &query, &token).await?;
    Ok(resp.data.into_iter().map(|g| (g.id, g.name)).collect())
}

impl StreamData {
    /// Converts into a snapshot, resolving the category name from `games`.
    ///
    /// Returns `None` when the login is not a valid account name.
    pub fn into_snapshot(self, games: &HashMap<String, String>) -> Option<BroadcastSnapshot> {
        let account_name = match TrackedEntity::new(&self.user_login) {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping stream with unusable login '{}': {}", self.user_login, e);
                return None;
            }
        };

        let category_name = games
            .get(&self.game_id)
            .cloned()
            .or_else(|| (!self.game_name.is_empty()).then(|| self.game_name.clone()))
            .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());

        let title = if self.title.trim().is_empty() {
            UNTITLED_BROADCAST.to_string()
        } else {
            self.title
        };

        let started_at = self
            .started_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Some(BroadcastSnapshot {
            id: self.id,
            account_id: self.user_id,
            account_name,
            display_name: self.user_name,
            title,
            category_id: self.game_id,
            category_name,
            viewer_count: self.viewer_count,
            thumbnail_url_template: self.thumbnail_url,
            started_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(json: &str) -> StreamData {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn fills_defaults_for_sparse_records() {
        let data = stream(
            r#"{"id":"1","user_id":"10","user_login":"Alice","user_name":"Alice","title":"  "}"#,
        );
        let snap = data.into_snapshot(&HashMap::new()).unwrap();
        assert_eq!(snap.account_name.as_str(), "alice");
        assert_eq!(snap.title, UNTITLED_BROADCAST);
        assert_eq!(snap.category_name, UNKNOWN_CATEGORY);
        assert_eq!(snap.viewer_count, 0);
        assert!(snap.started_at.is_none());
    }

    #[test]
    fn resolves_category_from_lookup() {
        let data = stream(
            r#"{"id":"1","user_id":"10","user_login":"alice","user_name":"Alice",
                "game_id":"33214","game_name":"stale","title":"Ranked grind",
                "viewer_count":42,"started_at":"2024-05-01T18:00:00Z",
                "thumbnail_url":"https://x/{width}x{height}.jpg","type":"live"}"#,
        );
        let mut games = HashMap::new();
        games.insert("33214".to_string(), "Fortnite".to_string());
        let snap = data.into_snapshot(&games).unwrap();
        assert_eq!(snap.category_name, "Fortnite");
        assert_eq!(snap.viewer_count, 42);
        assert_eq!(snap.started_at.unwrap().to_rfc3339(), "2024-05-01T18:00:00+00:00");
    }

    #[test]
    fn falls_back_to_inline_game_name() {
        let data = stream(
            r#"{"id":"1","user_id":"10","user_login":"alice","user_name":"Alice",
                "game_id":"9","game_name":"Just Chatting","title":"hi"}"#,
        );
        let snap = data.into_snapshot(&HashMap::new()).unwrap();
        assert_eq!(snap.category_name, "Just Chatting");
    }
}
