use std::io;

use thiserror::Error;

use super::types::{ErrorKind, SmtpReply};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("email is empty")]
    Empty,
    #[error("email has no '@' separator")]
    MissingAt,
    #[error("local part is empty")]
    EmptyLocalPart,
    #[error("domain is empty")]
    EmptyDomain,
    #[error("local part contains forbidden character {ch:?}")]
    IllegalLocalPart { ch: char },
    #[error("domain contains forbidden character {ch:?}")]
    IllegalDomain { ch: char },
}

/// Settings that would put more than one command on the wire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("HELO name contains forbidden character {ch:?}")]
    IllegalHeloName { ch: char },
    #[error("envelope sender contains forbidden character {ch:?}")]
    IllegalMailFrom { ch: char },
}

/// First character that cannot appear inside a single SMTP command
/// argument: controls (CR and LF included), whitespace and angle brackets.
pub(crate) fn forbidden_char(value: &str, extra: &[char]) -> Option<char> {
    value.chars().find(|&ch| {
        ch.is_control() || ch.is_whitespace() || matches!(ch, '<' | '>') || extra.contains(&ch)
    })
}

/// Transport-level failures while exchanging SMTP lines.
#[derive(Debug, Error)]
pub(crate) enum SessionError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
    #[error("connection closed while reading reply")]
    Closed,
    #[error("malformed SMTP line: {0}")]
    Malformed(String),
}

/// Why the probe sequence stopped. Carried into `ProbeOutcome`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StepError {
    pub(crate) kind: ErrorKind,
    pub(crate) text: String,
}

impl StepError {
    pub(crate) fn new(kind: ErrorKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub(crate) fn reply(kind: ErrorKind, reply: &SmtpReply) -> Self {
        Self::new(kind, reply.to_string())
    }

    pub(crate) fn is_interruption(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout | ErrorKind::Cancelled)
    }
}

impl From<SessionError> for StepError {
    fn from(err: SessionError) -> Self {
        let kind = match err {
            SessionError::Io { .. } | SessionError::Closed => ErrorKind::ConnectionLost,
            SessionError::Malformed(_) => ErrorKind::Protocol,
        };
        Self::new(kind, err.to_string())
    }
}
