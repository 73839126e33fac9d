use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use super::error::{OptionsError, forbidden_char};

/// Per-host probe settings.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub helo_name: String,
    pub mail_from: String,
    pub port: u16,
    /// Deadline for the whole attempt against one host, dial included.
    pub timeout: Duration,
    pub catch_all_check: bool,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            helo_name: "localhost".to_string(),
            mail_from: String::new(),
            port: 25,
            timeout: Duration::from_secs(15),
            catch_all_check: true,
        }
    }
}

impl ProbeOptions {
    pub fn helo_name(&self) -> &str {
        let trimmed = self.helo_name.trim();
        if trimmed.is_empty() { "localhost" } else { trimmed }
    }

    /// Returns the envelope sender used in the `MAIL FROM` command. When unspecified
    /// a `postmaster@domain` placeholder is synthesised.
    pub fn envelope_sender(&self, domain: &str) -> String {
        let trimmed = self.mail_from.trim();
        if trimmed.is_empty() {
            format!("postmaster@{domain}")
        } else {
            trimmed.to_string()
        }
    }

    /// Rejects a HELO name or sender that would not fit in one command line.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if let Some(ch) = forbidden_char(self.helo_name.trim(), &['@']) {
            return Err(OptionsError::IllegalHeloName { ch });
        }
        if let Some(ch) = forbidden_char(self.mail_from.trim(), &[]) {
            return Err(OptionsError::IllegalMailFrom { ch });
        }
        Ok(())
    }
}
