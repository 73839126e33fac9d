use thiserror::Error;

use crate::dialer::DialError;
use crate::mx::MxError;
use crate::smtp_verify::{OptionsError, TargetError};

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("email is empty")]
    EmptyEmail,
    #[error("email '{email}' is invalid: {source}")]
    InvalidEmail {
        email: String,
        #[source]
        source: TargetError,
    },
    #[error("probe settings rejected: {source}")]
    Options {
        #[from]
        source: OptionsError,
    },
    /// Bad proxy configuration, reported once at construction.
    #[error("dialer setup failed: {source}")]
    Dialer {
        #[from]
        source: DialError,
    },
    #[error("resolver setup failed: {source}")]
    Resolver {
        #[from]
        source: MxError,
    },
}

impl VerifyError {
    pub(crate) fn invalid(email: impl Into<String>, source: TargetError) -> Self {
        match source {
            TargetError::Empty => Self::EmptyEmail,
            source => Self::InvalidEmail {
                email: email.into(),
                source,
            },
        }
    }
}
