// File: livecord-core/src/platforms/discord/runtime.rs

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};
use twilight_gateway::{
    self as gateway, CloseFrame, Config, Event, EventTypeFlags, Intents, MessageSender, Shard,
    StreamExt,
};
use twilight_http::Client as HttpClient;
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;

use crate::Error;
use crate::services::admin_commands::AdminCommandService;
use crate::services::discord::slashcommands::handle_interaction_create;

/// Reads gateway events for one shard and answers slash-command interactions.
async fn shard_runner(
    mut shard: Shard,
    http: Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
    commands: Arc<AdminCommandService>,
) {
    let shard_id = shard.id().number();
    info!("Shard {shard_id} started. Listening for events.");

    let wanted = EventTypeFlags::READY | EventTypeFlags::INTERACTION_CREATE;
    while let Some(item) = shard.next_event(wanted).await {
        let event = match item {
            Ok(event) => event,
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
                continue;
            }
        };

        match event {
            Event::Ready(ready) => {
                info!(
                    "Shard {shard_id} => READY as {} (ID={}) in {} guild(s)",
                    ready.user.name,
                    ready.user.id,
                    ready.guilds.len()
                );
            }
            Event::InteractionCreate(interaction) => {
                let http = http.clone();
                let commands = commands.clone();
                tokio::spawn(async move {
                    let answered =
                        handle_interaction_create(&http, application_id, &commands, &interaction);
                    if let Err(e) = answered.await {
                        warn!("Failed to answer interaction: {e}");
                    }
                });
            }
            Event::GatewayClose(frame) => {
                debug!("Shard {shard_id} => gateway closed: {frame:?}");
            }
            other => {
                trace!("Shard {shard_id} => unhandled event: {:?}", other.kind());
            }
        }
    }

    warn!("Shard {shard_id} event loop ended.");
}

/// Gateway connection used for the administrative slash commands.
/// Notifications themselves only need the REST client.
pub struct DiscordRuntime {
    token: String,
    http: Arc<HttpClient>,
    commands: Arc<AdminCommandService>,
    shard_tasks: Vec<JoinHandle<()>>,
    shard_senders: Vec<MessageSender>,
}

impl DiscordRuntime {
    pub fn new(token: String, http: Arc<HttpClient>, commands: Arc<AdminCommandService>) -> Self {
        Self {
            token,
            http,
            commands,
            shard_tasks: Vec::new(),
            shard_senders: Vec::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        !self.shard_tasks.is_empty()
    }

    pub async fn connect(&mut self) -> Result<(), Error> {
        if self.is_connected() {
            info!("Discord gateway already connected => skipping");
            return Ok(());
        }
        if self.token.is_empty() {
            return Err(Error::Auth("Discord token is empty".into()));
        }

        let application_id = self
            .http
            .current_user_application()
            .await
            .map_err(|e| Error::Platform(format!("Fetching Discord application failed: {e}")))?
            .model()
            .await
            .map_err(|e| Error::Platform(format!("Decoding Discord application failed: {e}")))?
            .id;

        let config = Config::new(self.token.clone(), Intents::GUILDS);
        let shards = gateway::create_recommended(&self.http, config, |_, b| b.build())
            .await
            .map_err(|e| Error::Platform(format!("create_recommended error: {e}")))?;

        for shard in shards {
            self.shard_senders.push(shard.sender());
            let handle = tokio::spawn(shard_runner(
                shard,
                self.http.clone(),
                application_id,
                self.commands.clone(),
            ));
            self.shard_tasks.push(handle);
        }

        info!(shards = self.shard_tasks.len(), %application_id, "Discord gateway connected");
        Ok(())
    }

    pub async fn disconnect(&mut self) {
        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        for task in self.shard_tasks.drain(..) {
            let _ = task.await;
        }
        self.shard_senders.clear();
        info!("Discord gateway disconnected");
    }
}
