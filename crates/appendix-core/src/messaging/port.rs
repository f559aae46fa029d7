use async_trait::async_trait;

use crate::{
    domain::{ChannelMessage, ChannelRef, FormattingEntity, MessageId},
    messaging::types::{MessagingCapabilities, ParsedMarkup},
    Result,
};

/// Messaging client port.
///
/// Telegram (MTProto) is the first implementation; the shape is kept small so
/// other providers with editable channel history could fit behind it.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    /// Resolve an operator-supplied handle (`@mychannel`) to a channel.
    async fn resolve_channel(&self, handle: &str) -> Result<ChannelRef>;

    /// Fetch up to `limit` messages strictly older than `offset_id`,
    /// newest first. `offset_id` 0 means "from the latest message".
    async fn fetch_history(
        &self,
        channel: &ChannelRef,
        offset_id: MessageId,
        limit: usize,
    ) -> Result<Vec<ChannelMessage>>;

    /// Replace a message's text and formatting entities.
    async fn edit_message(
        &self,
        channel: &ChannelRef,
        id: MessageId,
        text: &str,
        entities: &[FormattingEntity],
    ) -> Result<()>;

    /// Parse provider markup into plain text + offset entities.
    fn parse_markup(&self, text: &str) -> Result<ParsedMarkup>;
}
