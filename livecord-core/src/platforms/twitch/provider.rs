// File: livecord-core/src/platforms/twitch/provider.rs

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use livecord_common::models::{AppToken, BroadcastSnapshot, TrackedEntity};
use livecord_common::traits::StatusProvider;

use crate::Error;
use crate::platforms::twitch::auth::AppTokenCache;
use crate::platforms::twitch::client::{TwitchHelixClient, HELIX_PAGE_LIMIT};
use crate::platforms::twitch::requests::stream::{fetch_games, fetch_streams, StreamData};

/// [`StatusProvider`] backed by Helix "Get Streams" + "Get Games".
///
/// Category names are resolved with one games lookup per pass covering every
/// live broadcast, so the request count does not grow with the number of
/// simultaneously live accounts.
pub struct HelixStatusProvider {
    client: TwitchHelixClient,
    tokens: Arc<AppTokenCache>,
}

impl HelixStatusProvider {
    pub fn new(client: TwitchHelixClient, tokens: Arc<AppTokenCache>) -> Self {
        Self { client, tokens }
    }

    /// Runs `call` with the cached token; on a 401 forces one refresh and
    /// retries once. A second 401 is reported as an auth failure.
    async fn authorized<T, F, Fut>(&self, mut call: F) -> Result<T, Error>
    where
        F: FnMut(AppToken) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let token = self.tokens.get_token().await?;
        match call(token.clone()).await {
            Err(Error::TokenRejected) => {
                let fresh = self.tokens.force_refresh(&token).await?;
                match call(fresh).await {
                    Err(Error::TokenRejected) => Err(Error::Auth(
                        "Twitch API: token still rejected after refresh \
                         (check CLIENT_ID and CLIENT_SECRET)"
                            .into(),
                    )),
                    other => other,
                }
            }
            other => other,
        }
    }

    async fn lookup_games(&self, streams: &[StreamData]) -> Result<HashMap<String, String>, Error> {
        let ids: Vec<String> = streams
            .iter()
            .map(|s| s.game_id.clone())
            .filter(|id| !id.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut games = HashMap::new();
        for chunk in ids.chunks(HELIX_PAGE_LIMIT) {
            let client = &self.client;
            let page = self
                .authorized(move |token| fetch_games(client, token, chunk))
                .await?;
            games.extend(page);
        }
        Ok(games)
    }
}

#[async_trait]
impl StatusProvider for HelixStatusProvider {
    async fn live_broadcasts(
        &self,
        entities: &BTreeSet<TrackedEntity>,
    ) -> Result<Vec<BroadcastSnapshot>, Error> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }

        let logins: Vec<TrackedEntity> = entities.iter().cloned().collect();
        let mut streams = Vec::new();
        for chunk in logins.chunks(HELIX_PAGE_LIMIT) {
            let client = &self.client;
            let page = self
                .authorized(move |token| fetch_streams(client, token, chunk))
                .await?;
            streams.extend(page);
        }

        let games = self.lookup_games(&streams).await?;

        let snapshots: Vec<BroadcastSnapshot> = streams
            .into_iter()
            .filter(|s| {
                if s.type_field.is_empty() || s.type_field == "live" {
                    true
                } else {
                    debug!("Ignoring stream {} with type '{}'", s.user_login, s.type_field);
                    false
                }
            })
            .filter_map(|s| s.into_snapshot(&games))
            .filter(|snap| {
                let requested = entities.contains(snap.entity());
                if !requested {
                    warn!("Helix returned unrequested login '{}'", snap.entity());
                }
                requested
            })
            .collect();

        debug!(tracked = entities.len(), live = snapshots.len(), "Status lookup complete");
        Ok(snapshots)
    }
}
