// ================================================================
// File: livecord-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Credential exchange failed (network or rejected client credentials).
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Helix answered 401 for a request made with a cached token.
    #[error("Access token rejected by the status provider")]
    TokenRejected,

    #[error("Rate limited by the status provider")]
    RateLimited,

    #[error("Transient network error: {0}")]
    TransientNetwork(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Gateway delivery error: {0}")]
    GatewayDelivery(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid streamer name: {0}")]
    InvalidEntity(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Failures in shared setup (token, status lookup, category lookup).
    /// These abort the whole reconciliation pass.
    pub fn aborts_pass(&self) -> bool {
        matches!(
            self,
            Error::Auth(_)
                | Error::TokenRejected
                | Error::RateLimited
                | Error::TransientNetwork(_)
                | Error::MalformedResponse(_)
        )
    }

    /// Maps a reqwest transport failure onto the provider taxonomy.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::MalformedResponse(err.to_string())
        } else {
            Error::TransientNetwork(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_failures_abort_the_pass() {
        assert!(Error::RateLimited.aborts_pass());
        assert!(Error::Auth("bad secret".into()).aborts_pass());
        assert!(Error::TransientNetwork("reset".into()).aborts_pass());
        assert!(Error::MalformedResponse("eof".into()).aborts_pass());
    }

    #[test]
    fn per_entity_failures_do_not_abort() {
        assert!(!Error::GatewayDelivery("missing access".into()).aborts_pass());
        assert!(!Error::Persistence("disk full".into()).aborts_pass());
    }
}
