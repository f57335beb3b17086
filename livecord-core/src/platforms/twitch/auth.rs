// File: livecord-core/src/platforms/twitch/auth.rs

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use twitch_oauth2::{ClientId, ClientSecret};

use livecord_common::models::auth::{AppToken, TwitchTokenResponse};
use livecord_common::traits::{Clock, TokenExchange};

use crate::Error;

pub const TWITCH_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Client-credentials grant against the Twitch identity endpoint.
pub struct ClientCredentialsExchange {
    http: ReqwestClient,
    client_id: ClientId,
    client_secret: ClientSecret,
    token_url: String,
    clock: Arc<dyn Clock>,
}

impl ClientCredentialsExchange {
    pub fn new(
        http: ReqwestClient,
        client_id: ClientId,
        client_secret: ClientSecret,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http,
            client_id,
            client_secret,
            token_url: TWITCH_TOKEN_URL.to_string(),
            clock,
        }
    }

    /// Points the exchange at another token endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }
}

#[async_trait]
impl TokenExchange for ClientCredentialsExchange {
    async fn exchange(&self) -> Result<AppToken, Error> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.secret()),
            ("grant_type", "client_credentials"),
        ];

        let issued_at = self.clock.now();
        let resp = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Auth(format!("HTTP error requesting app token: {e}")))?
            .error_for_status()
            .map_err(|e| Error::Auth(format!("Twitch token endpoint error: {e}")))?
            .json::<TwitchTokenResponse>()
            .await
            .map_err(|e| Error::Auth(format!("Parse error on token JSON: {e}")))?;

        debug!(
            token_type = resp.token_type.as_deref().unwrap_or("bearer"),
            expires_in = resp.expires_in,
            "Twitch app token issued"
        );
        AppToken::from_response(resp, issued_at)
    }
}

/// Caches the application access token and refreshes it on demand.
///
/// The lock is held across the exchange, so concurrent callers that find the
/// token stale queue behind the first one and reuse its result instead of
/// issuing their own exchange.
pub struct AppTokenCache {
    exchange: Arc<dyn TokenExchange>,
    clock: Arc<dyn Clock>,
    current: Mutex<Option<AppToken>>,
}

impl AppTokenCache {
    pub fn new(exchange: Arc<dyn TokenExchange>, clock: Arc<dyn Clock>) -> Self {
        Self {
            exchange,
            clock,
            current: Mutex::new(None),
        }
    }

    /// Returns the cached token if it expires more than 60 s from now,
    /// otherwise exchanges credentials for a new one.
    pub async fn get_token(&self) -> Result<AppToken, Error> {
        let mut guard = self.current.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.is_fresh(self.clock.now()) {
                return Ok(token.clone());
            }
            debug!(expires_at = %token.expires_at, "Twitch app token near expiry");
        }

        let fresh = self.refresh_locked(&mut guard).await?;
        Ok(fresh)
    }

    /// Replaces `rejected` after the provider answered 401 for it.
    ///
    /// If another caller already swapped in a different token, that one is
    /// returned without a second exchange.
    pub async fn force_refresh(&self, rejected: &AppToken) -> Result<AppToken, Error> {
        let mut guard = self.current.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.secret() != rejected.secret() && token.is_fresh(self.clock.now()) {
                return Ok(token.clone());
            }
        }
        warn!("Twitch rejected the cached app token; forcing refresh");
        *guard = None;
        self.refresh_locked(&mut guard).await
    }

    async fn refresh_locked(&self, slot: &mut Option<AppToken>) -> Result<AppToken, Error> {
        let fresh = self.exchange.exchange().await?;
        info!(expires_at = %fresh.expires_at, "Twitch OAuth token refreshed");
        *slot = Some(fresh.clone());
        Ok(fresh)
    }
}
