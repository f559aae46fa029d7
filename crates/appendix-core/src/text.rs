//! Text and entity-offset helpers for the append operation.

use regex::Regex;

use crate::{domain::FormattingEntity, messaging::types::ParsedMarkup};

/// Separator inserted between the original text and the appended text.
pub const SEPARATOR: &str = "\n\n";

/// Length in UTF-16 code units.
///
/// Telegram counts entity offsets/lengths (and the 4096 message limit) in
/// UTF-16 code units, not bytes or chars.
pub fn utf16_len(s: &str) -> i32 {
    s.encode_utf16().count() as i32
}

/// Strip HTML-ish tags and trim, for plain-text comparisons.
pub fn strip_markup(text: &str) -> String {
    let tag = Regex::new(r"</?[^>]+(>|$)").expect("valid regex");
    tag.replace_all(text, "").trim().to_string()
}

/// Return the entities shifted right by `delta` UTF-16 units.
pub fn shift_entities(entities: &[FormattingEntity], delta: i32) -> Vec<FormattingEntity> {
    entities
        .iter()
        .map(|ent| FormattingEntity {
            offset: ent.offset + delta,
            length: ent.length,
            kind: ent.kind.clone(),
        })
        .collect()
}

/// Combine a message with the parsed append markup.
///
/// New text is `original + SEPARATOR + append.text`; the appended entities are
/// shifted past the original text and the separator.
pub fn merge_append(
    original: &str,
    original_entities: &[FormattingEntity],
    append: &ParsedMarkup,
) -> (String, Vec<FormattingEntity>) {
    let new_text = format!("{original}{SEPARATOR}{}", append.text);

    let delta = utf16_len(original) + utf16_len(SEPARATOR);
    let mut entities = original_entities.to_vec();
    entities.extend(shift_entities(&append.entities, delta));

    (new_text, entities)
}
