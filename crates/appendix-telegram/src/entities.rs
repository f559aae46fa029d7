//! Conversions between the core entity model and Telegram TL entities.

use appendix_core::domain::{EntityKind, FormattingEntity};
use grammers_tl_types as tl;

/// Map a TL entity into the core model. Kinds the tool does not understand
/// are dropped.
pub fn from_tl(ent: &tl::enums::MessageEntity) -> Option<FormattingEntity> {
    use tl::enums::MessageEntity as E;

    let (offset, length, kind) = match ent {
        E::Bold(e) => (e.offset, e.length, EntityKind::Bold),
        E::Italic(e) => (e.offset, e.length, EntityKind::Italic),
        E::Underline(e) => (e.offset, e.length, EntityKind::Underline),
        E::Strike(e) => (e.offset, e.length, EntityKind::Strikethrough),
        E::Spoiler(e) => (e.offset, e.length, EntityKind::Spoiler),
        E::Code(e) => (e.offset, e.length, EntityKind::Code),
        E::Pre(e) => (
            e.offset,
            e.length,
            EntityKind::Pre {
                language: e.language.clone(),
            },
        ),
        E::TextUrl(e) => (
            e.offset,
            e.length,
            EntityKind::TextUrl { url: e.url.clone() },
        ),
        E::Url(e) => (e.offset, e.length, EntityKind::Url),
        E::Mention(e) => (e.offset, e.length, EntityKind::Mention),
        E::MentionName(e) => (
            e.offset,
            e.length,
            EntityKind::MentionName { user_id: e.user_id },
        ),
        E::Hashtag(e) => (e.offset, e.length, EntityKind::Hashtag),
        E::Cashtag(e) => (e.offset, e.length, EntityKind::Cashtag),
        E::BotCommand(e) => (e.offset, e.length, EntityKind::BotCommand),
        E::Email(e) => (e.offset, e.length, EntityKind::Email),
        E::Phone(e) => (e.offset, e.length, EntityKind::Phone),
        E::BankCard(e) => (e.offset, e.length, EntityKind::BankCard),
        E::Blockquote(e) => (
            e.offset,
            e.length,
            EntityKind::Blockquote {
                collapsed: e.collapsed,
            },
        ),
        E::CustomEmoji(e) => (
            e.offset,
            e.length,
            EntityKind::CustomEmoji {
                document_id: e.document_id,
            },
        ),
        _ => return None,
    };

    Some(FormattingEntity {
        offset,
        length,
        kind,
    })
}

/// Map a core entity back into its TL form.
pub fn to_tl(ent: &FormattingEntity) -> tl::enums::MessageEntity {
    let offset = ent.offset;
    let length = ent.length;

    match &ent.kind {
        EntityKind::Bold => tl::types::MessageEntityBold { offset, length }.into(),
        EntityKind::Italic => tl::types::MessageEntityItalic { offset, length }.into(),
        EntityKind::Underline => tl::types::MessageEntityUnderline { offset, length }.into(),
        EntityKind::Strikethrough => tl::types::MessageEntityStrike { offset, length }.into(),
        EntityKind::Spoiler => tl::types::MessageEntitySpoiler { offset, length }.into(),
        EntityKind::Code => tl::types::MessageEntityCode { offset, length }.into(),
        EntityKind::Pre { language } => tl::types::MessageEntityPre {
            offset,
            length,
            language: language.clone(),
        }
        .into(),
        EntityKind::TextUrl { url } => tl::types::MessageEntityTextUrl {
            offset,
            length,
            url: url.clone(),
        }
        .into(),
        EntityKind::Url => tl::types::MessageEntityUrl { offset, length }.into(),
        EntityKind::Mention => tl::types::MessageEntityMention { offset, length }.into(),
        EntityKind::MentionName { user_id } => tl::types::MessageEntityMentionName {
            offset,
            length,
            user_id: *user_id,
        }
        .into(),
        EntityKind::Hashtag => tl::types::MessageEntityHashtag { offset, length }.into(),
        EntityKind::Cashtag => tl::types::MessageEntityCashtag { offset, length }.into(),
        EntityKind::BotCommand => tl::types::MessageEntityBotCommand { offset, length }.into(),
        EntityKind::Email => tl::types::MessageEntityEmail { offset, length }.into(),
        EntityKind::Phone => tl::types::MessageEntityPhone { offset, length }.into(),
        EntityKind::BankCard => tl::types::MessageEntityBankCard { offset, length }.into(),
        EntityKind::Blockquote { collapsed } => tl::types::MessageEntityBlockquote {
            collapsed: *collapsed,
            offset,
            length,
        }
        .into(),
        EntityKind::CustomEmoji { document_id } => tl::types::MessageEntityCustomEmoji {
            offset,
            length,
            document_id: *document_id,
        }
        .into(),
    }
}
