use std::collections::BTreeSet;
use async_trait::async_trait;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, MessageMarker};
use crate::error::Error;
use crate::models::{BroadcastSnapshot, LiveAnnouncement, TrackedEntity};

/// Looks up which of the given accounts are currently broadcasting.
#[async_trait]
pub trait StatusProvider: Send + Sync {
    /// Empty input must return an empty list without any network call.
    async fn live_broadcasts(
        &self,
        entities: &BTreeSet<TrackedEntity>,
    ) -> Result<Vec<BroadcastSnapshot>, Error>;
}

/// Sends and edits notification messages in a chat channel.
#[async_trait]
pub trait AnnouncementGateway: Send + Sync {
    async fn send(
        &self,
        channel_id: Id<ChannelMarker>,
        content: &str,
        announcement: &LiveAnnouncement,
    ) -> Result<Id<MessageMarker>, Error>;

    /// Editing a message that no longer exists is a no-op.
    async fn edit(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        announcement: &LiveAnnouncement,
    ) -> Result<(), Error>;
}
