// File: livecord-core/src/services/admin_commands.rs

use std::time::Duration;

use tracing::info;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, RoleMarker};

use livecord_common::models::config::MAX_COOLDOWN_MINUTES;
use livecord_common::models::{ConfigDefaults, TrackedEntity};

use crate::Error;
use crate::repositories::ConfigHandle;

/// A parsed administrative command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    AddStreamer(String),
    RemoveStreamer(String),
    ListStreamers,
    SetChannel(Id<ChannelMarker>),
    SetRole(Id<RoleMarker>),
    SetCooldown(i64),
    Status,
}

impl AdminCommand {
    pub fn name(&self) -> &'static str {
        match self {
            AdminCommand::AddStreamer(_) => "addstreamer",
            AdminCommand::RemoveStreamer(_) => "removestreamer",
            AdminCommand::ListStreamers => "liststreamers",
            AdminCommand::SetChannel(_) => "setchannel",
            AdminCommand::SetRole(_) => "setrole",
            AdminCommand::SetCooldown(_) => "setcooldown",
            AdminCommand::Status => "status",
        }
    }

    /// Commands that change the configuration.
    pub fn requires_admin(&self) -> bool {
        !matches!(self, AdminCommand::ListStreamers | AdminCommand::Status)
    }
}

/// Process facts reported by `status` that are not part of the config document.
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    pub twitch_configured: bool,
    pub check_interval: Duration,
}

/// Executes [`AdminCommand`]s against the shared configuration and renders
/// the reply text.
pub struct AdminCommandService {
    config: ConfigHandle,
    defaults: ConfigDefaults,
    runtime: RuntimeInfo,
}

impl AdminCommandService {
    pub fn new(config: ConfigHandle, defaults: ConfigDefaults, runtime: RuntimeInfo) -> Self {
        Self {
            config,
            defaults,
            runtime,
        }
    }

    /// `Err` is reserved for storage failures; user mistakes come back as a reply.
    pub async fn execute(&self, command: AdminCommand, is_admin: bool) -> Result<String, Error> {
        if command.requires_admin() && !is_admin {
            return Ok(format!(
                "You need the Administrator permission to use `/{}`.",
                command.name()
            ));
        }

        match command {
            AdminCommand::AddStreamer(raw) => self.add_streamer(&raw).await,
            AdminCommand::RemoveStreamer(raw) => self.remove_streamer(&raw).await,
            AdminCommand::ListStreamers => self.list_streamers().await,
            AdminCommand::SetChannel(channel_id) => {
                self.config.modify(move |c| c.channel_id = Some(channel_id)).await?;
                info!(%channel_id, "Notification channel set");
                Ok(format!("Notifications will be sent to <#{channel_id}>."))
            }
            AdminCommand::SetRole(role_id) => {
                self.config.modify(move |c| c.role_id = Some(role_id)).await?;
                info!(%role_id, "Notification role set");
                Ok(format!("Notification role set to <@&{role_id}>."))
            }
            AdminCommand::SetCooldown(minutes) => self.set_cooldown(minutes).await,
            AdminCommand::Status => self.status().await,
        }
    }

    async fn add_streamer(&self, raw: &str) -> Result<String, Error> {
        let entity = match TrackedEntity::new(raw) {
            Ok(e) => e,
            Err(_) => {
                return Ok(format!(
                    "`{}` is not a valid Twitch username.",
                    raw.trim().to_lowercase()
                ));
            }
        };

        let added = {
            let entity = entity.clone();
            self.config.modify(move |c| c.add_streamer(entity)).await?
        };
        if !added {
            return Ok(format!("`{entity}` is already in the list."));
        }
        info!(entity = %entity, "Added streamer");
        Ok(format!("Added **{entity}** to the notification list."))
    }

    async fn remove_streamer(&self, raw: &str) -> Result<String, Error> {
        let normalized = raw.trim().to_lowercase();
        let Ok(entity) = TrackedEntity::new(&normalized) else {
            return Ok(format!("`{normalized}` is not in the list."));
        };

        // Pure read first so a miss does not rewrite the file.
        if !self.config.load().await?.streamers.contains(&entity) {
            return Ok(format!("`{entity}` is not in the list."));
        }

        let removed = {
            let entity = entity.clone();
            self.config.modify(move |c| c.remove_streamer(&entity)).await?
        };
        if !removed {
            return Ok(format!("`{entity}` is not in the list."));
        }
        info!(entity = %entity, "Removed streamer");
        Ok(format!("Removed **{entity}** from the notification list."))
    }

    async fn list_streamers(&self) -> Result<String, Error> {
        let config = self.config.load().await?;
        if config.streamers.is_empty() {
            return Ok("No streamers in the list. Use `/addstreamer <username>` to add one.".into());
        }
        let list: Vec<String> = config.streamers.iter().map(|s| format!("• **{s}**")).collect();
        Ok(format!(
            "**Monitored Streamers** ({})\n\n{}",
            config.streamers.len(),
            list.join("\n")
        ))
    }

    async fn set_cooldown(&self, minutes: i64) -> Result<String, Error> {
        let Some(minutes) = u32::try_from(minutes)
            .ok()
            .filter(|m| *m <= MAX_COOLDOWN_MINUTES)
        else {
            return Ok(format!(
                "Cooldown must be between 0 and {MAX_COOLDOWN_MINUTES} minutes."
            ));
        };

        self.config.modify(move |c| c.cooldown_minutes = minutes).await?;
        info!(minutes, "Cooldown set");
        if minutes == 0 {
            Ok("Cooldown disabled.".into())
        } else {
            Ok(format!("Cooldown set to **{minutes}** minute(s)."))
        }
    }

    async fn status(&self) -> Result<String, Error> {
        let config = self.config.load().await?;
        let streamers: Vec<String> = config
            .effective_streamers(&self.defaults)
            .iter()
            .map(ToString::to_string)
            .collect();

        let streamers_line = if streamers.is_empty() {
            "❌ None (use /addstreamer or set TWITCH_USERNAME)".to_string()
        } else {
            streamers.join(", ")
        };
        let channel_line = match config.effective_channel(&self.defaults) {
            Some(id) => format!("✅ <#{id}>"),
            None => "❌ Not set (use /setchannel or CHANNEL_ID)".to_string(),
        };
        let role_line = match config.effective_role(&self.defaults) {
            Some(id) => format!("✅ <@&{id}>"),
            None => "⚪ Optional".to_string(),
        };
        let twitch_line = if self.runtime.twitch_configured {
            "✅ Configured"
        } else {
            "❌ Missing CLIENT_ID or CLIENT_SECRET"
        };

        let lines = [
            "**Bot Status**".to_string(),
            String::new(),
            format!("**Streamers:** {streamers_line}"),
            format!("**Channel:** {channel_line}"),
            format!("**Role:** {role_line}"),
            format!("**Cooldown:** {} minute(s)", config.cooldown_minutes),
            format!("**Twitch API:** {twitch_line}"),
            String::new(),
            format!(
                "Checks run every {} seconds.",
                self.runtime.check_interval.as_secs()
            ),
        ];
        Ok(lines.join("\n"))
    }
}
