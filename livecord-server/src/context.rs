//! livecord-server/src/context.rs
//!
//! Builds every long-lived component from the process arguments.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use twilight_http::Client as HttpClient;
use twilight_model::id::Id;
use twitch_oauth2::{ClientId, ClientSecret};

use livecord_common::models::entity::parse_entity_list;
use livecord_common::models::ConfigDefaults;
use livecord_common::traits::{Clock, SystemClock};
use livecord_core::Error;
use livecord_core::platforms::discord::DiscordAnnouncer;
use livecord_core::platforms::twitch::{
    AppTokenCache, ClientCredentialsExchange, HelixStatusProvider, TwitchHelixClient,
};
use livecord_core::presence::{NotificationEngine, PersistenceBridge};
use livecord_core::repositories::{ConfigHandle, JsonFileConfigStore};
use livecord_core::services::{AdminCommandService, RuntimeInfo};

use crate::Args;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ServerContext {
    pub engine: NotificationEngine,
    pub commands: Arc<AdminCommandService>,
    pub discord_http: Arc<HttpClient>,
    pub check_interval: Duration,
}

fn defaults_from(args: &Args) -> ConfigDefaults {
    let channel_id = args.channel_id.and_then(Id::new_checked);
    let role_id = args.role_id.and_then(Id::new_checked);
    if args.channel_id.is_some() && channel_id.is_none() {
        warn!("CHANNEL_ID must be non-zero; ignoring it");
    }
    ConfigDefaults {
        streamers: args
            .twitch_username
            .as_deref()
            .map(parse_entity_list)
            .unwrap_or_default(),
        channel_id,
        role_id,
    }
}

impl ServerContext {
    pub fn new(args: &Args) -> Result<Self, Error> {
        let check_interval = Duration::from_secs(args.check_interval.max(1));
        let defaults = defaults_from(args);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let client_id = ClientId::new(args.client_id.trim().to_string());
        let exchange = ClientCredentialsExchange::new(
            http.clone(),
            client_id.clone(),
            ClientSecret::new(args.client_secret.trim().to_string()),
            clock.clone(),
        );
        let tokens = Arc::new(AppTokenCache::new(Arc::new(exchange), clock.clone()));
        let provider = HelixStatusProvider::new(TwitchHelixClient::new(http, client_id), tokens);

        let discord_http = Arc::new(
            HttpClient::builder()
                .token(args.discord_token.clone())
                .timeout(HTTP_TIMEOUT)
                .build(),
        );

        let config = ConfigHandle::new(Arc::new(JsonFileConfigStore::new(&args.config_path)));

        let engine = NotificationEngine::new(
            Arc::new(provider),
            Arc::new(DiscordAnnouncer::new(discord_http.clone())),
            PersistenceBridge::new(config.clone()),
            clock,
            defaults.clone(),
        );

        let commands = Arc::new(AdminCommandService::new(
            config,
            defaults,
            RuntimeInfo {
                twitch_configured: !args.client_id.trim().is_empty()
                    && !args.client_secret.trim().is_empty(),
                check_interval,
            },
        ));

        Ok(Self {
            engine,
            commands,
            discord_http,
            check_interval,
        })
    }
}
