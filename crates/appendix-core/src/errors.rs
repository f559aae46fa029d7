use std::time::Duration;

/// Core error type.
///
/// The adapter crate maps provider-specific errors into this type so the edit
/// loop can classify failures without matching on error strings.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("auth error: {0}")]
    Auth(String),

    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("message not modified")]
    NotModified,

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("rate limited by provider")]
    Flood { retry_after: Option<Duration> },

    #[error("external error: {0}")]
    External(String),
}

/// How an edit failure affects the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Record the message as failed and continue with the next one.
    Skip,
    /// Stop the entire run (flood / rate-limit signal).
    Fatal,
}

impl Error {
    pub fn fault(&self) -> Fault {
        match self {
            Error::Flood { .. } => Fault::Fatal,
            _ => Fault::Skip,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flood_is_the_only_fatal_fault() {
        assert_eq!(Error::Flood { retry_after: None }.fault(), Fault::Fatal);
        assert_eq!(Error::NotModified.fault(), Fault::Skip);
        assert_eq!(Error::InvalidMessage("x".into()).fault(), Fault::Skip);
        assert_eq!(Error::External("boom".into()).fault(), Fault::Skip);
    }
}
