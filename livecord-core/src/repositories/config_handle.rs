// File: livecord-core/src/repositories/config_handle.rs

use std::sync::Arc;

use tokio::sync::Mutex;

use livecord_common::models::Configuration;
use livecord_common::traits::ConfigStore;

use crate::Error;

/// Shared access to the configuration document.
///
/// Every read-modify-write goes through one lock, so the poll loop and the
/// command handlers never overwrite each other's changes.
#[derive(Clone)]
pub struct ConfigHandle {
    store: Arc<dyn ConfigStore>,
    write_lock: Arc<Mutex<()>>,
}

impl ConfigHandle {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn load(&self) -> Result<Configuration, Error> {
        self.store.load().await
    }

    /// Loads, applies `f`, and saves. Nothing is written if `f` returns `Err`.
    pub async fn try_modify<R, F>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut Configuration) -> Result<R, Error> + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut config = self.store.load().await?;
        let out = f(&mut config)?;
        self.store.save(&config).await?;
        Ok(out)
    }

    pub async fn modify<R, F>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut Configuration) -> R + Send,
    {
        self.try_modify(|config| Ok(f(config))).await
    }
}
