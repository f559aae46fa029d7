//! Per-message editability filter.

use crate::text::strip_markup;

/// Plain-text fragments that mark a message as off-limits.
#[derive(Clone, Debug, Default)]
pub struct IgnoreList {
    fragments: Vec<String>,
}

impl IgnoreList {
    /// Fragments are compared as plain text, so markup in the configured
    /// values is stripped up front. Empty fragments are dropped.
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fragments = fragments
            .into_iter()
            .map(|f| strip_markup(f.as_ref()))
            .filter(|f| !f.is_empty())
            .collect();
        Self { fragments }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// First fragment contained in `plain_text`, if any.
    pub fn matched_fragment(&self, plain_text: &str) -> Option<&str> {
        self.fragments
            .iter()
            .find(|f| plain_text.contains(f.as_str()))
            .map(String::as_str)
    }
}

/// Why a message was left untouched (without being recorded as failed).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The plain append text is already present in the message.
    AlreadyAppended,
    /// The message contains an ignore-list fragment.
    IgnoreFragment(String),
}

/// Decide whether a message should be skipped, comparing plain text only.
pub fn skip_reason(
    plain_text: &str,
    plain_append: &str,
    ignore: &IgnoreList,
) -> Option<SkipReason> {
    if !plain_append.is_empty() && plain_text.contains(plain_append) {
        return Some(SkipReason::AlreadyAppended);
    }
    ignore
        .matched_fragment(plain_text)
        .map(|f| SkipReason::IgnoreFragment(f.to_string()))
}
