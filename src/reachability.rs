//! Maps a probe outcome to a three-valued reachability verdict.

use std::fmt;

use crate::smtp_verify::ProbeOutcome;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReachabilityVerdict {
    /// The recipient was accepted by a server that does not accept everything.
    Yes,
    No,
    Unknown,
}

impl ReachabilityVerdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ReachabilityVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies an outcome. Rules apply in order; the first match wins:
///
/// 1. SMTP checking disabled: `Unknown`.
/// 2. Recipient accepted and not catch-all: `Yes`.
/// 3. Catch-all: `Unknown`.
/// 4. Full inbox: `Unknown`.
/// 5. Disabled mailbox: `No`.
/// 6. Inconclusive failure (timeouts, deferrals, transport trouble): `Unknown`.
/// 7. Anything else: `No`.
pub fn classify(outcome: &ProbeOutcome, smtp_check_enabled: bool) -> ReachabilityVerdict {
    if !smtp_check_enabled {
        return ReachabilityVerdict::Unknown;
    }
    if outcome.rcpt_ok && !outcome.catch_all {
        return ReachabilityVerdict::Yes;
    }
    if outcome.catch_all || outcome.full_inbox {
        return ReachabilityVerdict::Unknown;
    }
    if outcome.disabled {
        return ReachabilityVerdict::No;
    }
    match outcome.last_error {
        Some(kind) if kind.is_inconclusive() => ReachabilityVerdict::Unknown,
        _ => ReachabilityVerdict::No,
    }
}
