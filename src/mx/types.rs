use std::fmt;

/// A mail exchanger candidate. Lower preference is tried first.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MxHost {
    pub preference: u16,
    pub hostname: String,
}

impl MxHost {
    pub fn new(preference: u16, hostname: impl Into<String>) -> Self {
        Self {
            preference,
            hostname: hostname.into(),
        }
    }
}

impl fmt::Display for MxHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (pref {})", self.hostname, self.preference)
    }
}
