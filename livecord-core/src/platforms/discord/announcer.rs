// File: livecord-core/src/platforms/discord/announcer.rs

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use twilight_http::Client as HttpClient;
use twilight_http::error::{Error as HttpError, ErrorType};
use twilight_model::channel::message::component::{ActionRow, Button, ButtonStyle, Component};
use twilight_model::channel::message::Embed;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, MessageMarker};
use twilight_model::util::Timestamp;
use twilight_util::builder::embed::{
    EmbedAuthorBuilder, EmbedBuilder, EmbedFieldBuilder, EmbedFooterBuilder, ImageSource,
};

use livecord_common::models::LiveAnnouncement;
use livecord_common::traits::AnnouncementGateway;

use crate::Error;

pub const TWITCH_PURPLE: u32 = 0x9146FF;
const TWITCH_ICON_URL: &str =
    "https://static.twitchcdn.net/assets/favicon-32-d6025c14e900565f67f0.png";

/// Builds the "now live" embed for an announcement.
pub fn build_live_embed(announcement: &LiveAnnouncement) -> Embed {
    let url = announcement.stream_url.clone();

    let mut author = EmbedAuthorBuilder::new(format!("{} is now live!", announcement.display_name))
        .url(url.clone());
    if let Ok(icon) = ImageSource::url(TWITCH_ICON_URL) {
        author = author.icon_url(icon);
    }

    let mut builder = EmbedBuilder::new()
        .color(TWITCH_PURPLE)
        .title(announcement.title.clone())
        .url(url.clone())
        .author(author)
        .field(EmbedFieldBuilder::new("Game", announcement.category.clone()).inline())
        .field(EmbedFieldBuilder::new("Viewers", announcement.viewer_count.to_string()).inline())
        .field(EmbedFieldBuilder::new("Stream", format!("[Watch on Twitch]({url})")))
        .footer(EmbedFooterBuilder::new("Now Live on Twitch"));

    if !announcement.thumbnail_url.is_empty() {
        match ImageSource::url(announcement.thumbnail_url.clone()) {
            Ok(image) => builder = builder.image(image),
            Err(e) => debug!("Skipping thumbnail '{}': {e}", announcement.thumbnail_url),
        }
    }

    if let Some(ts) = announcement
        .started_at
        .and_then(|dt| Timestamp::from_secs(dt.timestamp()).ok())
    {
        builder = builder.timestamp(ts);
    }

    builder.build()
}

/// A single row holding the link-style "Watch Stream" button.
pub fn watch_button_row(announcement: &LiveAnnouncement) -> Component {
    Component::ActionRow(ActionRow {
        components: vec![Component::Button(Button {
            custom_id: None,
            disabled: false,
            emoji: None,
            label: Some("Watch Stream".to_string()),
            style: ButtonStyle::Link,
            url: Some(announcement.stream_url.clone()),
            sku_id: None,
        })],
    })
}

fn is_unknown_message(err: &HttpError) -> bool {
    matches!(err.kind(), ErrorType::Response { status, .. } if status.get() == 404)
}

/// [`AnnouncementGateway`] over the Discord REST API.
pub struct DiscordAnnouncer {
    http: Arc<HttpClient>,
}

impl DiscordAnnouncer {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AnnouncementGateway for DiscordAnnouncer {
    async fn send(
        &self,
        channel_id: Id<ChannelMarker>,
        content: &str,
        announcement: &LiveAnnouncement,
    ) -> Result<Id<MessageMarker>, Error> {
        let embeds = [build_live_embed(announcement)];
        let components = [watch_button_row(announcement)];

        let response = self
            .http
            .create_message(channel_id)
            .content(content)
            .embeds(&embeds)
            .components(&components)
            .await
            .map_err(|e| Error::GatewayDelivery(format!("Error sending Discord message: {e}")))?;

        let message = response
            .model()
            .await
            .map_err(|e| Error::GatewayDelivery(format!("Error decoding sent message: {e}")))?;
        Ok(message.id)
    }

    async fn edit(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        announcement: &LiveAnnouncement,
    ) -> Result<(), Error> {
        let embeds = [build_live_embed(announcement)];
        let components = [watch_button_row(announcement)];

        match self
            .http
            .update_message(channel_id, message_id)
            .embeds(Some(&embeds))
            .components(Some(&components))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_unknown_message(&e) => {
                warn!(%channel_id, %message_id, "Live message no longer exists; skipping edit");
                Ok(())
            }
            Err(e) => Err(Error::GatewayDelivery(format!("Error editing Discord message: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn announcement() -> LiveAnnouncement {
        LiveAnnouncement {
            display_name: "Alice".into(),
            title: "Ranked grind".into(),
            category: "Chess".into(),
            viewer_count: 128,
            stream_url: "https://twitch.tv/alice".into(),
            thumbnail_url: "https://cdn/live_user_alice-1280x720.jpg".into(),
            started_at: Some(chrono::Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap()),
        }
    }

    #[test]
    fn embed_carries_stream_metadata() {
        let embed = build_live_embed(&announcement());
        assert_eq!(embed.title.as_deref(), Some("Ranked grind"));
        assert_eq!(embed.url.as_deref(), Some("https://twitch.tv/alice"));
        assert_eq!(embed.color, Some(TWITCH_PURPLE));
        let fields: Vec<(&str, &str)> = embed
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.value.as_str()))
            .collect();
        assert_eq!(fields[0], ("Game", "Chess"));
        assert_eq!(fields[1], ("Viewers", "128"));
        assert!(fields[2].1.contains("https://twitch.tv/alice"));
        assert_eq!(
            embed.image.map(|i| i.url),
            Some("https://cdn/live_user_alice-1280x720.jpg".to_string())
        );
        assert!(embed.timestamp.is_some());
    }

    #[test]
    fn empty_thumbnail_leaves_image_unset() {
        let mut ann = announcement();
        ann.thumbnail_url.clear();
        ann.started_at = None;
        let embed = build_live_embed(&ann);
        assert!(embed.image.is_none());
        assert!(embed.timestamp.is_none());
    }

    #[test]
    fn button_links_to_stream() {
        match watch_button_row(&announcement()) {
            Component::ActionRow(row) => match &row.components[0] {
                Component::Button(b) => {
                    assert_eq!(b.style, ButtonStyle::Link);
                    assert_eq!(b.url.as_deref(), Some("https://twitch.tv/alice"));
                }
                other => panic!("unexpected component {other:?}"),
            },
            other => panic!("unexpected component {other:?}"),
        }
    }
}
