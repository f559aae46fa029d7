/// Telegram channel id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(pub i64);

/// Telegram message id (numeric, monotonically decreasing as history is paged).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub i32);

/// A channel resolved from an operator-supplied handle.
#[derive(Clone, Debug)]
pub struct ChannelRef {
    pub id: ChannelId,
    pub title: String,
}

/// A styled span within message text.
///
/// Offsets and lengths are in UTF-16 code units, per Telegram convention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormattingEntity {
    pub offset: i32,
    pub length: i32,
    pub kind: EntityKind,
}

/// Entity kinds the tool understands. Provider kinds outside this set are
/// dropped at the adapter boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Spoiler,
    Code,
    Pre { language: String },
    TextUrl { url: String },
    Url,
    Mention,
    MentionName { user_id: i64 },
    Hashtag,
    Cashtag,
    BotCommand,
    Email,
    Phone,
    BankCard,
    Blockquote { collapsed: bool },
    CustomEmoji { document_id: i64 },
}

/// A message fetched from channel history.
///
/// `text` is `None` for messages with no textual content (media, service
/// messages); those are never editable by this tool.
#[derive(Clone, Debug)]
pub struct ChannelMessage {
    pub id: MessageId,
    pub text: Option<String>,
    pub entities: Vec<FormattingEntity>,
}
