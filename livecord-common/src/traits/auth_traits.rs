use async_trait::async_trait;
use crate::error::Error;
use crate::models::auth::AppToken;

/// Performs one client-credentials exchange against the identity provider.
///
/// Implementations never retry; a failure is reported as [`Error::Auth`].
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self) -> Result<AppToken, Error>;
}
