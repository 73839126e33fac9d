//! Structured reporting of probe and refresh failures.

use std::fmt;

use crate::smtp_verify::ErrorKind;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// One MX host failed to give a conclusive answer; the caller moves on.
    HostProbeFailed,
    MxLookupFailed,
    RefreshFailed,
    RefreshPublished,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HostProbeFailed => "host_probe_failed",
            Self::MxLookupFailed => "mx_lookup_failed",
            Self::RefreshFailed => "refresh_failed",
            Self::RefreshPublished => "refresh_published",
        })
    }
}

/// A single report. `subject` is the host or domain the event is about.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub subject: String,
    pub error_kind: Option<ErrorKind>,
    pub cause: String,
}

impl Event {
    pub fn new(
        kind: EventKind,
        subject: impl Into<String>,
        error_kind: Option<ErrorKind>,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            subject: subject.into(),
            error_kind,
            cause: cause.into(),
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &Event);
}

/// Forwards events to `tracing`. Failures are logged at `warn`, successful
/// refreshes at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &Event) {
        match event.kind {
            EventKind::RefreshPublished => tracing::debug!(
                kind = %event.kind,
                subject = %event.subject,
                "{}",
                event.cause
            ),
            _ => tracing::warn!(
                kind = %event.kind,
                subject = %event.subject,
                error_kind = ?event.error_kind,
                cause = %event.cause,
                "mailprobe event"
            ),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use parking_lot::Mutex;

    use super::{Event, EventKind, EventSink};

    #[derive(Debug, Default)]
    pub(crate) struct RecordingSink {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingSink {
        pub(crate) fn events(&self) -> Vec<Event> {
            self.events.lock().clone()
        }

        pub(crate) fn count(&self, kind: EventKind) -> usize {
            self.events.lock().iter().filter(|e| e.kind == kind).count()
        }
    }

    impl EventSink for RecordingSink {
        fn emit(&self, event: &Event) {
            self.events.lock().push(event.clone());
        }
    }
}
