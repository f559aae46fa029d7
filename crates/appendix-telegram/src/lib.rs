//! Telegram adapter (grammers MTProto client).
//!
//! This crate implements the `appendix-core` MessagingPort over a Telegram
//! user session. Channel history is only readable through MTProto, so the
//! adapter uses grammers rather than the Bot API.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;

use grammers_client::{Client, InputMessage, InvocationError};
use grammers_session::PackedChat;

use tokio::sync::Mutex;
use tracing::debug;

pub mod auth;
mod entities;

use appendix_core::{
    domain::{ChannelId, ChannelMessage, ChannelRef, FormattingEntity, MessageId},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{MessagingCapabilities, ParsedMarkup},
    },
    Result,
};

pub struct TelegramMessenger {
    client: Client,
    /// Resolved peers keyed by channel id, so every call carries the correct
    /// access hash without re-resolving.
    peers: Mutex<HashMap<i64, PackedChat>>,
}

impl TelegramMessenger {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            peers: Mutex::new(HashMap::new()),
        }
    }

    async fn packed(&self, id: ChannelId) -> Result<PackedChat> {
        self.peers
            .lock()
            .await
            .get(&id.0)
            .copied()
            .ok_or_else(|| Error::External(format!("channel {} was not resolved", id.0)))
    }

    fn map_err(e: InvocationError) -> Error {
        match e {
            InvocationError::Rpc(rpc) => {
                // 420 is the FLOOD family; grammers strips the seconds suffix
                // into `value`.
                if rpc.code == 420 || rpc.name.starts_with("FLOOD") {
                    Error::Flood {
                        retry_after: rpc.value.map(|secs| Duration::from_secs(u64::from(secs))),
                    }
                } else if rpc.name == "MESSAGE_NOT_MODIFIED" {
                    Error::NotModified
                } else if matches!(
                    rpc.name.as_str(),
                    "MESSAGE_ID_INVALID"
                        | "MESSAGE_EDIT_TIME_EXPIRED"
                        | "MESSAGE_AUTHOR_REQUIRED"
                        | "CHAT_ADMIN_REQUIRED"
                        | "CHAT_WRITE_FORBIDDEN"
                ) {
                    Error::InvalidMessage(rpc.name)
                } else {
                    Error::External(format!("telegram rpc error: {rpc}"))
                }
            }
            other => Error::External(format!("telegram error: {other}")),
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_edit: true,
            supports_formatting_entities: true,
            max_message_len: 4096,
        }
    }

    async fn resolve_channel(&self, handle: &str) -> Result<ChannelRef> {
        let username = handle.trim().trim_start_matches('@');
        let chat = self
            .client
            .resolve_username(username)
            .await
            .map_err(Self::map_err)?
            .ok_or_else(|| Error::ChannelNotFound(handle.to_string()))?;

        let packed = chat.pack();
        debug!(id = packed.id, "resolved channel");
        self.peers.lock().await.insert(packed.id, packed);

        Ok(ChannelRef {
            id: ChannelId(packed.id),
            title: chat.name().to_string(),
        })
    }

    async fn fetch_history(
        &self,
        channel: &ChannelRef,
        offset_id: MessageId,
        limit: usize,
    ) -> Result<Vec<ChannelMessage>> {
        let chat = self.packed(channel.id).await?;

        let mut iter = self.client.iter_messages(chat).limit(limit);
        if offset_id.0 > 0 {
            iter = iter.offset_id(offset_id.0);
        }

        let mut out = Vec::with_capacity(limit);
        while let Some(message) = iter.next().await.map_err(Self::map_err)? {
            let text = message.text();
            out.push(ChannelMessage {
                id: MessageId(message.id()),
                text: if text.is_empty() {
                    None
                } else {
                    Some(text.to_string())
                },
                entities: message
                    .fmt_entities()
                    .map(|ents| ents.iter().filter_map(entities::from_tl).collect())
                    .unwrap_or_default(),
            });
        }
        Ok(out)
    }

    async fn edit_message(
        &self,
        channel: &ChannelRef,
        id: MessageId,
        text: &str,
        entities: &[FormattingEntity],
    ) -> Result<()> {
        let chat = self.packed(channel.id).await?;

        let tl_entities = entities.iter().map(entities::to_tl).collect();
        let input = InputMessage::text(text).fmt_entities(tl_entities);

        self.client
            .edit_message(chat, id.0, input)
            .await
            .map_err(Self::map_err)
    }

    fn parse_markup(&self, text: &str) -> Result<ParsedMarkup> {
        let (parsed, tl_entities) = grammers_client::parsers::parse_html_message(text);
        Ok(ParsedMarkup {
            text: parsed,
            entities: tl_entities.iter().filter_map(entities::from_tl).collect(),
        })
    }
}
