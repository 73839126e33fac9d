use rand::{Rng, distributions::Alphanumeric};

use super::types::{ErrorKind, SmtpReply};

const CATCH_ALL_LOCAL_LEN: usize = 20;

const DISABLED_MARKERS: &[&str] = &[
    "disabled",
    "suspended",
    "deactivated",
    "inactive",
    "account has been locked",
    "no longer active",
];

const FULL_INBOX_MARKERS: &[&str] = &[
    "mailbox full",
    "mailbox is full",
    "over quota",
    "quota exceeded",
    "exceeded storage",
    "insufficient storage",
    "out of storage",
];

/// A lowercase alphanumeric local part that is very unlikely to exist.
pub fn random_local_part() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CATCH_ALL_LOCAL_LEN)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect()
}

/// Parses the RFC 3463 enhanced status code at the start of the reply text.
pub(crate) fn enhanced_status(reply: &SmtpReply) -> Option<(u8, u16, u16)> {
    let token = reply.message.split_whitespace().next()?;
    let mut parts = token.split('.');
    let class = parts.next()?.parse().ok()?;
    let subject = parts.next()?.parse().ok()?;
    let detail = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !matches!(class, 2 | 4 | 5) {
        return None;
    }
    Some((class, subject, detail))
}

pub(crate) fn is_disabled(reply: &SmtpReply) -> bool {
    if reply.is_positive_completion() {
        return false;
    }
    matches!(enhanced_status(reply), Some((5, 2, 1))) || contains_marker(reply, DISABLED_MARKERS)
}

pub(crate) fn is_full_inbox(reply: &SmtpReply) -> bool {
    if reply.is_positive_completion() {
        return false;
    }
    matches!(enhanced_status(reply), Some((_, 2, 2))) || contains_marker(reply, FULL_INBOX_MARKERS)
}

fn is_mailbox_unavailable(reply: &SmtpReply) -> bool {
    matches!(reply.code, 550 | 551 | 553)
        || matches!(enhanced_status(reply), Some((5, 1, 1 | 10)))
}

/// Maps a non-positive `RCPT TO` reply to the recorded error kind.
pub(crate) fn recipient_error_kind(reply: &SmtpReply) -> ErrorKind {
    if reply.is_transient_failure() {
        ErrorKind::RecipientDeferred
    } else if reply.is_permanent_failure() && is_mailbox_unavailable(reply) {
        ErrorKind::MailboxUnavailable
    } else if reply.is_permanent_failure() {
        ErrorKind::RecipientRejected
    } else {
        ErrorKind::Protocol
    }
}

fn contains_marker(reply: &SmtpReply, markers: &[&str]) -> bool {
    let text = reply.message.to_ascii_lowercase();
    markers.iter().any(|marker| text.contains(marker))
}
