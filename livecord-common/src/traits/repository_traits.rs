use async_trait::async_trait;
use crate::error::Error;
use crate::models::Configuration;

/// Whole-document storage for [`Configuration`].
///
/// `save` must be atomic: a later `load` sees either the old or the new
/// document, never a torn write.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load(&self) -> Result<Configuration, Error>;
    async fn save(&self, config: &Configuration) -> Result<(), Error>;
}
