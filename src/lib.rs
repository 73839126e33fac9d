#![forbid(unsafe_code)]
//! mailprobe_lib — SMTP deliverability probing without sending mail.
//!
//! The pipeline resolves a domain's MX hosts, dials them directly or through
//! a SOCKS5 proxy, walks the SMTP dialogue up to `RCPT TO` (plus a catch-all
//! probe) and classifies the result. A [`DisposableRegistry`] answers
//! disposable-domain lookups from a snapshot refreshed in the background.

pub mod cancel;
pub mod dialer;
pub mod disposable;
pub mod events;
pub mod mx;
pub mod reachability;
pub mod smtp_verify;
pub mod verifier;

pub use cancel::{CancelHandle, CancelToken, cancel_pair};
pub use dialer::{BoxedStream, Dial, DialError, Dialer, DialerConfig, ProxyConfig};
pub use disposable::{
    DisposableRegistry, DisposableSet, DomainSource, FetchError, FileSource, FnSource,
    RegistryError,
};
pub use events::{Event, EventKind, EventSink, TracingSink};
pub use mx::{LookupMx, MxError, MxHost, SystemResolver, resolve_mx};
pub use reachability::{ReachabilityVerdict, classify};
pub use smtp_verify::{
    ErrorKind, HostProbe, OptionsError, ProbeOptions, ProbeOutcome, ProbeTarget, SmtpEvent, SmtpReply,
    TargetError, probe_host,
};
pub use verifier::{Verification, Verifier, VerifierConfig, VerifyError};
