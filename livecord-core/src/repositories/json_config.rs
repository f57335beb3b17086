// File: livecord-core/src/repositories/json_config.rs

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use livecord_common::models::Configuration;
use livecord_common::traits::ConfigStore;

use crate::Error;

/// [`ConfigStore`] over a single pretty-printed JSON file.
///
/// A missing (or empty) file reads as the default document. Writes go to a
/// temp file in the same directory which is then renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileConfigStore {
    path: PathBuf,
}

impl JsonFileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

fn write_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl ConfigStore for JsonFileConfigStore {
    async fn load(&self) -> Result<Configuration, Error> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config at {}; starting from defaults", self.path.display());
                return Ok(Configuration::default());
            }
            Err(e) => {
                return Err(Error::Persistence(format!(
                    "reading {}: {e}",
                    self.path.display()
                )));
            }
        };

        if raw.trim().is_empty() {
            return Ok(Configuration::default());
        }

        serde_json::from_str(&raw).map_err(|e| {
            Error::Config(format!(
                "{} is not a valid config document: {e}",
                self.path.display()
            ))
        })
    }

    async fn save(&self, config: &Configuration) -> Result<(), Error> {
        let mut bytes = serde_json::to_vec_pretty(config)?;
        bytes.push(b'\n');

        let dir = self.parent_dir();
        let target = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&dir, &target, &bytes))
            .await
            .map_err(|e| Error::Persistence(format!("config writer task failed: {e}")))?
            .map_err(|e| Error::Persistence(format!("writing {}: {e}", self.path.display())))?;

        debug!(path = %self.path.display(), "Config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livecord_common::models::TrackedEntity;
    use tempfile::tempdir;
    use twilight_model::id::Id;

    #[tokio::test]
    async fn missing_file_loads_defaults() -> Result<(), Error> {
        let dir = tempdir()?;
        let store = JsonFileConfigStore::new(dir.path().join("config.json"));
        assert_eq!(store.load().await?, Configuration::default());
        Ok(())
    }

    #[tokio::test]
    async fn save_then_load_keeps_the_document() -> Result<(), Error> {
        let dir = tempdir()?;
        let store = JsonFileConfigStore::new(dir.path().join("config.json"));

        let mut cfg = Configuration::default();
        let alice = TrackedEntity::new("alice")?;
        cfg.add_streamer(alice.clone());
        cfg.channel_id = Some(Id::new(42));
        cfg.live_message_ids.insert(alice, Id::new(99));
        store.save(&cfg).await?;

        assert_eq!(store.load().await?, cfg);

        let raw = std::fs::read_to_string(store.path())?;
        assert!(raw.contains("\"liveMessageIds\""));
        assert!(raw.contains("\"channelId\": \"42\""));
        Ok(())
    }

    #[tokio::test]
    async fn garbage_is_a_config_error() -> Result<(), Error> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json")?;
        let store = JsonFileConfigStore::new(path);
        assert!(matches!(store.load().await, Err(Error::Config(_))));
        Ok(())
    }

    #[tokio::test]
    async fn hand_edited_bad_login_does_not_block_loading() -> Result<(), Error> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "streamers": ["alice", "two words"], "cooldownMinutes": 3 }"#)?;
        let store = JsonFileConfigStore::new(path);

        let cfg = store.load().await?;
        assert_eq!(cfg.streamers, vec![TrackedEntity::new("alice")?]);
        assert_eq!(cfg.cooldown_minutes, 3);
        Ok(())
    }

    #[tokio::test]
    async fn save_into_missing_directory_fails_cleanly() -> Result<(), Error> {
        let dir = tempdir()?;
        let store = JsonFileConfigStore::new(dir.path().join("nope").join("config.json"));
        let err = store.save(&Configuration::default()).await.unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
        Ok(())
    }
}
