use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use super::error::{TargetError, forbidden_char};

/// Why a probe attempt stopped short of a clean result.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoMxRecords,
    DialTimeout,
    DialRefused,
    ProxyAuthError,
    ProxyUnreachable,
    UnsupportedProxyScheme,
    GreetingRejected,
    SenderRejected,
    /// 4xx on `MAIL FROM`; the server may simply be rate limiting.
    SenderDeferred,
    RecipientRejected,
    /// 550/551/553 on `RCPT TO`: the mailbox does not exist.
    MailboxUnavailable,
    RecipientDeferred,
    Timeout,
    Cancelled,
    ConnectionLost,
    Protocol,
    RefreshFetchFailed,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 17] = [
        Self::NoMxRecords,
        Self::DialTimeout,
        Self::DialRefused,
        Self::ProxyAuthError,
        Self::ProxyUnreachable,
        Self::UnsupportedProxyScheme,
        Self::GreetingRejected,
        Self::SenderRejected,
        Self::SenderDeferred,
        Self::RecipientRejected,
        Self::MailboxUnavailable,
        Self::RecipientDeferred,
        Self::Timeout,
        Self::Cancelled,
        Self::ConnectionLost,
        Self::Protocol,
        Self::RefreshFetchFailed,
    ];

    /// Failures that say nothing about whether the mailbox exists.
    pub fn is_inconclusive(self) -> bool {
        matches!(
            self,
            Self::DialTimeout
                | Self::DialRefused
                | Self::ProxyAuthError
                | Self::ProxyUnreachable
                | Self::UnsupportedProxyScheme
                | Self::SenderDeferred
                | Self::RecipientDeferred
                | Self::Timeout
                | Self::Cancelled
                | Self::ConnectionLost
                | Self::Protocol
                | Self::RefreshFetchFailed
        )
    }

    /// The server gave a verdict about this particular recipient.
    pub fn is_recipient_verdict(self) -> bool {
        matches!(self, Self::RecipientRejected | Self::MailboxUnavailable)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoMxRecords => "no_mx_records",
            Self::DialTimeout => "dial_timeout",
            Self::DialRefused => "dial_refused",
            Self::ProxyAuthError => "proxy_auth_error",
            Self::ProxyUnreachable => "proxy_unreachable",
            Self::UnsupportedProxyScheme => "unsupported_proxy_scheme",
            Self::GreetingRejected => "greeting_rejected",
            Self::SenderRejected => "sender_rejected",
            Self::SenderDeferred => "sender_deferred",
            Self::RecipientRejected => "recipient_rejected",
            Self::MailboxUnavailable => "mailbox_unavailable",
            Self::RecipientDeferred => "recipient_deferred",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::ConnectionLost => "connection_lost",
            Self::Protocol => "protocol",
            Self::RefreshFetchFailed => "refresh_fetch_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The mailbox being probed. Both parts are non-empty, the domain is
/// lower-cased, and neither carries characters that could end the `RCPT TO`
/// argument early.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub domain: String,
    pub local_part: String,
}

impl ProbeTarget {
    pub fn new(
        domain: impl Into<String>,
        local_part: impl Into<String>,
    ) -> Result<Self, TargetError> {
        let domain = domain.into().trim().trim_end_matches('.').to_ascii_lowercase();
        let local_part = local_part.into().trim().to_string();
        if local_part.is_empty() {
            return Err(TargetError::EmptyLocalPart);
        }
        if domain.is_empty() {
            return Err(TargetError::EmptyDomain);
        }
        if let Some(ch) = forbidden_char(&local_part, &[]) {
            return Err(TargetError::IllegalLocalPart { ch });
        }
        if let Some(ch) = forbidden_char(&domain, &['@']) {
            return Err(TargetError::IllegalDomain { ch });
        }
        Ok(Self { domain, local_part })
    }

    /// Splits `local@domain` on the last `@`. Beyond the split only
    /// characters that would break the `RCPT TO` line are refused; full
    /// syntax validation happens upstream.
    pub fn from_email(email: &str) -> Result<Self, TargetError> {
        let trimmed = email.trim();
        if trimmed.is_empty() {
            return Err(TargetError::Empty);
        }
        let (local, domain) = trimmed.rsplit_once('@').ok_or(TargetError::MissingAt)?;
        Self::new(domain, local.to_ascii_lowercase())
    }

    pub fn address(&self) -> String {
        format!("{}@{}", self.local_part, self.domain)
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local_part, self.domain)
    }
}

/// Result of one probe attempt against one host. Always produced, even when
/// the attempt failed before connecting.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub connected: bool,
    pub helo_ok: bool,
    pub mail_from_ok: bool,
    pub rcpt_ok: bool,
    pub catch_all: bool,
    pub disabled: bool,
    pub full_inbox: bool,
    pub last_error: Option<ErrorKind>,
    pub last_error_text: String,
}

impl ProbeOutcome {
    pub(crate) fn failed(kind: ErrorKind, text: impl Into<String>) -> Self {
        Self {
            last_error: Some(kind),
            last_error_text: text.into(),
            ..Self::default()
        }
    }

    /// Whether trying another MX host could change the answer.
    pub fn is_conclusive(&self) -> bool {
        self.rcpt_ok
            || self.disabled
            || self
                .last_error
                .is_some_and(ErrorKind::is_recipient_verdict)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn flag(value: bool) -> &'static str {
            if value { "yes" } else { "no" }
        }
        write!(
            f,
            "connected={} helo={} mail_from={} rcpt={} catch_all={} disabled={} full_inbox={}",
            flag(self.connected),
            flag(self.helo_ok),
            flag(self.mail_from_ok),
            flag(self.rcpt_ok),
            flag(self.catch_all),
            flag(self.disabled),
            flag(self.full_inbox),
        )?;
        match self.last_error {
            Some(kind) if self.last_error_text.is_empty() => write!(f, " error={kind}"),
            Some(kind) => write!(f, " error={kind} ({})", self.last_error_text),
            None => f.write_str(" error=none"),
        }
    }
}

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStage {
    Connect,
    Greeting,
    Ehlo,
    Helo,
    MailFrom,
    RcptTo,
    CatchAll,
    Rset,
    Quit,
}

/// A raw SMTP reply, preserving the numeric status code and message text.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    pub message: String,
}

impl SmtpReply {
    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_transient_failure(&self) -> bool {
        (400..500).contains(&self.code)
    }

    pub fn is_permanent_failure(&self) -> bool {
        (500..600).contains(&self.code)
    }
}

impl fmt::Display for SmtpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message.replace('\n', " / "))
    }
}

/// A recorded SMTP transcript event used for diagnostics.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmtpEvent {
    Sent {
        stage: AttemptStage,
        command: String,
    },
    Received {
        stage: AttemptStage,
        reply: SmtpReply,
    },
    Error {
        stage: AttemptStage,
        message: String,
    },
}

/// Outcome and transcript for a single MX host.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostProbe {
    pub host: String,
    pub outcome: ProbeOutcome,
    pub transcript: Vec<SmtpEvent>,
}
