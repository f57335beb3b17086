// File: livecord-core/src/platforms/twitch/client.rs

use reqwest::{Client as ReqwestClient, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use twitch_oauth2::ClientId;

use livecord_common::models::AppToken;

use crate::Error;

pub const HELIX_BASE_URL: &str = "https://api.twitch.tv/helix";

/// Helix caps repeated query parameters at 100 per request.
pub const HELIX_PAGE_LIMIT: usize = 100;

/// A small wrapper client for calling Helix endpoints.
///
/// The token is passed per call; caching and refresh live in
/// [`AppTokenCache`](crate::platforms::twitch::auth::AppTokenCache).
pub struct TwitchHelixClient {
    http: ReqwestClient,
    client_id: ClientId,
    base_url: String,
}

impl TwitchHelixClient {
    pub fn new(http: ReqwestClient, client_id: ClientId) -> Self {
        Self {
            http,
            client_id,
            base_url: HELIX_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn client_id(&self) -> &str {
        self.client_id.as_str()
    }

    /// GET `{base}/{path}` with repeated query parameters, decoded as `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        token: &AppToken,
    ) -> Result<T, Error> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .query(query)
            .header("Client-Id", self.client_id.as_str())
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(Error::from_transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(classify_status(path, status, &body_text));
        }

        let body = resp.text().await.map_err(Error::from_transport)?;
        debug!(path, bytes = body.len(), "Helix response received");
        serde_json::from_str(&body)
            .map_err(|e| Error::MalformedResponse(format!("{path} parse error: {e}")))
    }
}

/// Maps a non-success Helix status onto the provider error taxonomy.
pub fn classify_status(path: &str, status: StatusCode, body: &str) -> Error {
    match status {
        StatusCode::UNAUTHORIZED => Error::TokenRejected,
        StatusCode::TOO_MANY_REQUESTS => {
            warn!(path, "Twitch API rate limit exceeded");
            Error::RateLimited
        }
        s if s.is_server_error() => {
            Error::TransientNetwork(format!("{path}: HTTP {s} => {body}"))
        }
        s => Error::MalformedResponse(format!("{path}: HTTP {s} => {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_statuses_onto_taxonomy() {
        assert!(matches!(
            classify_status("streams", StatusCode::UNAUTHORIZED, ""),
            Error::TokenRejected
        ));
        assert!(matches!(
            classify_status("streams", StatusCode::TOO_MANY_REQUESTS, ""),
            Error::RateLimited
        ));
        assert!(matches!(
            classify_status("streams", StatusCode::BAD_GATEWAY, "upstream"),
            Error::TransientNetwork(_)
        ));
        assert!(matches!(
            classify_status("games", StatusCode::BAD_REQUEST, "bad id"),
            Error::MalformedResponse(_)
        ));
    }
}
