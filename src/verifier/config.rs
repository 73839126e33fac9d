use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::dialer::DialerConfig;
use crate::smtp_verify::ProbeOptions;

/// Everything a [`Verifier`](super::Verifier) needs, in one place.
///
/// With `with-serde`, missing fields take their default value so a partial
/// JSON document is a valid configuration.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    pub disposable_check: bool,
    pub mx_check: bool,
    pub smtp_check: bool,
    pub catch_all_check: bool,
    pub helo_name: String,
    /// Envelope sender; empty means `postmaster@<target domain>`.
    pub mail_from: String,
    pub smtp_port: u16,
    pub connect_timeout_ms: u64,
    /// Deadline for the whole attempt against one MX host.
    pub probe_timeout_ms: u64,
    pub max_mx_hosts: usize,
    /// `socks5://[user[:password]@]host:port`
    pub proxy: Option<String>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            disposable_check: true,
            mx_check: true,
            smtp_check: true,
            catch_all_check: true,
            helo_name: "localhost".to_string(),
            mail_from: String::new(),
            smtp_port: 25,
            connect_timeout_ms: 10_000,
            probe_timeout_ms: 15_000,
            max_mx_hosts: 3,
            proxy: None,
        }
    }
}

impl VerifierConfig {
    pub fn dialer_config(&self) -> DialerConfig {
        DialerConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            proxy_uri: self.proxy.clone(),
        }
    }

    pub fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            helo_name: self.helo_name.clone(),
            mail_from: self.mail_from.clone(),
            port: self.smtp_port,
            timeout: Duration::from_millis(self.probe_timeout_ms),
            catch_all_check: self.catch_all_check,
        }
    }
}
