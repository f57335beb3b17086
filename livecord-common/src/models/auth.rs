use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use twitch_oauth2::AccessToken;

use crate::error::Error;

/// Refresh when the token has this little life left.
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Matches Twitch's JSON from the client-credentials token endpoint.
#[derive(Debug, Deserialize)]
pub struct TwitchTokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// An application access token together with its absolute expiry.
#[derive(Debug, Clone)]
pub struct AppToken {
    pub access_token: AccessToken,
    pub expires_at: DateTime<Utc>,
}

impl AppToken {
    /// Fails with `MalformedResponse` when `expires_in` does not fit a timestamp.
    pub fn from_response(
        resp: TwitchTokenResponse,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, Error> {
        let expires_at = i64::try_from(resp.expires_in)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| {
                Error::MalformedResponse(format!(
                    "token expires_in out of range: {}",
                    resp.expires_in
                ))
            })?;
        Ok(Self {
            access_token: AccessToken::new(resp.access_token),
            expires_at,
        })
    }

    /// True while the expiry is more than the refresh margin away.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS)
    }

    pub fn secret(&self) -> &str {
        self.access_token.secret()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_respects_margin() {
        let now = Utc::now();
        let token = AppToken::from_response(
            TwitchTokenResponse {
                access_token: "abc".into(),
                expires_in: 120,
                token_type: Some("bearer".into()),
            },
            now,
        )
        .unwrap();
        assert!(token.is_fresh(now));
        assert!(token.is_fresh(now + Duration::seconds(59)));
        assert!(!token.is_fresh(now + Duration::seconds(60)));
        assert_eq!(token.secret(), "abc");
    }

    #[test]
    fn absurd_lifetime_is_rejected_not_panicking() {
        let res = AppToken::from_response(
            TwitchTokenResponse {
                access_token: "abc".into(),
                expires_in: 100_000_000_000_000,
                token_type: None,
            },
            Utc::now(),
        );
        assert!(matches!(res, Err(Error::MalformedResponse(_))));

        let res = AppToken::from_response(
            TwitchTokenResponse {
                access_token: "abc".into(),
                expires_in: u64::MAX,
                token_type: None,
            },
            Utc::now(),
        );
        assert!(matches!(res, Err(Error::MalformedResponse(_))));
    }
}
