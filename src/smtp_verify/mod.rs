//! SMTP deliverability probing.
//!
//! [`probe_host`] drives a minimal dialogue (`EHLO`/`HELO`, `MAIL FROM`,
//! `RCPT TO`, an optional catch-all `RCPT TO`, then `RSET`/`QUIT`) over a
//! dialed stream and records what the server said in a [`ProbeOutcome`].
//! No message is ever transmitted.

mod error;
mod options;
mod probe;
mod session;
mod types;
mod util;

pub use error::{OptionsError, TargetError};
pub use options::ProbeOptions;
pub use probe::probe_host;
pub use types::{
    AttemptStage, ErrorKind, HostProbe, ProbeOutcome, ProbeTarget, SmtpEvent, SmtpReply,
};
pub use util::random_local_part;
