// File: livecord-core/src/services/discord/slashcommands/mod.rs

use tracing::{debug, error, warn};
use twilight_http::Client as HttpClient;
use twilight_model::{
    application::interaction::{
        application_command::{CommandData, CommandOptionValue},
        Interaction, InteractionData,
    },
    channel::message::MessageFlags,
    gateway::payload::incoming::InteractionCreate,
    guild::Permissions,
    http::interaction::{InteractionResponse, InteractionResponseData, InteractionResponseType},
    id::marker::ApplicationMarker,
    id::Id,
};

use crate::Error;
use crate::services::admin_commands::{AdminCommand, AdminCommandService};

/// Discord rejects message content above 2000 characters.
const MAX_REPLY_LEN: usize = 1900;

fn option<'a>(data: &'a CommandData, name: &str) -> Option<&'a CommandOptionValue> {
    data.options.iter().find(|o| o.name == name).map(|o| &o.value)
}

/// Maps slash-command data onto an [`AdminCommand`]. `Err` carries the reply text.
pub fn parse_command(data: &CommandData) -> Result<AdminCommand, String> {
    let missing = |opt: &str| format!("Missing `{opt}` option for `/{}`.", data.name);

    match data.name.as_str() {
        "addstreamer" | "removestreamer" => {
            let Some(CommandOptionValue::String(username)) = option(data, "username") else {
                return Err(missing("username"));
            };
            if data.name == "addstreamer" {
                Ok(AdminCommand::AddStreamer(username.clone()))
            } else {
                Ok(AdminCommand::RemoveStreamer(username.clone()))
            }
        }
        "liststreamers" => Ok(AdminCommand::ListStreamers),
        "setchannel" => match option(data, "channel") {
            Some(CommandOptionValue::Channel(id)) => Ok(AdminCommand::SetChannel(*id)),
            _ => Err(missing("channel")),
        },
        "setrole" => match option(data, "role") {
            Some(CommandOptionValue::Role(id)) => Ok(AdminCommand::SetRole(*id)),
            _ => Err(missing("role")),
        },
        "setcooldown" => match option(data, "minutes") {
            Some(CommandOptionValue::Integer(m)) => Ok(AdminCommand::SetCooldown(*m)),
            _ => Err(missing("minutes")),
        },
        "status" => Ok(AdminCommand::Status),
        other => Err(format!("Unrecognized command: {other}")),
    }
}

pub fn invoker_is_admin(interaction: &Interaction) -> bool {
    interaction
        .member
        .as_ref()
        .and_then(|m| m.permissions)
        .is_some_and(|p| p.contains(Permissions::ADMINISTRATOR))
}

fn truncate_reply(mut text: String) -> String {
    if text.chars().count() > MAX_REPLY_LEN {
        text = text.chars().take(MAX_REPLY_LEN - 1).collect();
        text.push('…');
    }
    text
}

async fn respond_ephemeral(
    http: &HttpClient,
    application_id: Id<ApplicationMarker>,
    interaction: &Interaction,
    content: String,
) -> Result<(), Error> {
    http.interaction(application_id)
        .create_response(
            interaction.id,
            &interaction.token,
            &InteractionResponse {
                kind: InteractionResponseType::ChannelMessageWithSource,
                data: Some(InteractionResponseData {
                    content: Some(truncate_reply(content)),
                    flags: Some(MessageFlags::EPHEMERAL),
                    ..Default::default()
                }),
            },
        )
        .await
        .map_err(|e| Error::Platform(format!("Error responding to interaction: {e}")))?;
    Ok(())
}

/// Dispatch slash commands from an `InteractionCreate`.
pub async fn handle_interaction_create(
    http: &HttpClient,
    application_id: Id<ApplicationMarker>,
    commands: &AdminCommandService,
    event: &InteractionCreate,
) -> Result<(), Error> {
    let interaction = &event.0;

    let Some(InteractionData::ApplicationCommand(data)) = &interaction.data else {
        debug!(kind = ?interaction.kind, "Ignoring non-command interaction");
        return Ok(());
    };

    let reply = match parse_command(data) {
        Ok(command) => {
            let name = command.name();
            match commands.execute(command, invoker_is_admin(interaction)).await {
                Ok(reply) => reply,
                Err(e) => {
                    error!(command = name, error = %e, "Command failed");
                    "Something went wrong while saving the configuration.".to_string()
                }
            }
        }
        Err(reply) => {
            warn!(command = %data.name, "Rejected command: {reply}");
            reply
        }
    };

    respond_ephemeral(http, application_id, interaction, reply).await
}
