use std::time::Duration;

use thiserror::Error;

use crate::smtp_verify::ErrorKind;

#[derive(Debug, Error)]
pub enum DialError {
    #[error("connection to {target} timed out after {timeout:?}")]
    Timeout { target: String, timeout: Duration },
    #[error("connection to {target} refused: {reason}")]
    Refused { target: String, reason: String },
    #[error("SOCKS5 authentication with {proxy} failed: {reason}")]
    ProxyAuth { proxy: String, reason: String },
    #[error("SOCKS5 proxy {proxy} unreachable: {reason}")]
    ProxyUnreachable { proxy: String, reason: String },
    #[error("unsupported proxy scheme '{scheme}', only socks5 is supported")]
    UnsupportedProxyScheme { scheme: String },
    #[error("invalid proxy URI '{uri}': {reason}")]
    InvalidProxyUri { uri: String, reason: String },
}

impl DialError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::DialTimeout,
            Self::Refused { .. } => ErrorKind::DialRefused,
            Self::ProxyAuth { .. } => ErrorKind::ProxyAuthError,
            Self::ProxyUnreachable { .. } => ErrorKind::ProxyUnreachable,
            Self::UnsupportedProxyScheme { .. } | Self::InvalidProxyUri { .. } => {
                ErrorKind::UnsupportedProxyScheme
            }
        }
    }

    pub(crate) fn timeout(target: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            target: target.into(),
            timeout,
        }
    }

    pub(crate) fn refused(target: impl Into<String>, reason: impl ToString) -> Self {
        Self::Refused {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_uri(uri: &str, reason: impl Into<String>) -> Self {
        Self::InvalidProxyUri {
            uri: redact(uri),
            reason: reason.into(),
        }
    }
}

/// Drops the userinfo part so credentials never end up in logs.
fn redact(uri: &str) -> String {
    match (uri.find("://"), uri.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}***{}", &uri[..scheme_end + 3], &uri[at..])
        }
        _ => uri.to_string(),
    }
}
