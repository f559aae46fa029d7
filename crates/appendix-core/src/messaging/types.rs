use crate::domain::FormattingEntity;

/// Operator-supplied markup parsed into plain text + offset entities.
#[derive(Clone, Debug, Default)]
pub struct ParsedMarkup {
    pub text: String,
    pub entities: Vec<FormattingEntity>,
}

/// Capabilities / limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_edit: bool,
    pub supports_formatting_entities: bool,
    pub max_message_len: usize,
}
