// File: livecord-common/src/models/entity.rs

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::Error;

/// Twitch logins are 1..=25 characters.
pub const MAX_LOGIN_LEN: usize = 25;

/// A tracked Twitch account, normalized to its lowercase login.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackedEntity(String);

impl TrackedEntity {
    pub fn new(raw: &str) -> Result<Self, Error> {
        let login = raw.trim().to_lowercase();
        if login.is_empty() || login.len() > MAX_LOGIN_LEN {
            return Err(Error::InvalidEntity(raw.to_string()));
        }
        if !login.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::InvalidEntity(raw.to_string()));
        }
        Ok(Self(login))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Channel page for this account.
    pub fn stream_url(&self) -> String {
        format!("https://twitch.tv/{}", self.0)
    }
}

impl fmt::Display for TrackedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TrackedEntity {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TrackedEntity {
    type Error = Error;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(&s)
    }
}

impl From<TrackedEntity> for String {
    fn from(e: TrackedEntity) -> Self {
        e.0
    }
}

/// Parses a comma separated list (the `TWITCH_USERNAME` fallback),
/// skipping blanks and anything that isn't a valid login.
pub fn parse_entity_list(raw: &str) -> Vec<TrackedEntity> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| TrackedEntity::new(s).ok())
        .collect()
}
