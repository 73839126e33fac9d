#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::mx::MxHost;
use crate::reachability::ReachabilityVerdict;
use crate::smtp_verify::{HostProbe, ProbeOutcome, ProbeTarget};

/// Everything learned about one address.
///
/// Optional fields are `None` when the matching check is turned off.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub email: String,
    pub target: ProbeTarget,
    pub disposable: Option<bool>,
    pub has_mx: Option<bool>,
    /// Most preferred first; empty when the lookup failed or was skipped.
    pub mx_hosts: Vec<MxHost>,
    /// Outcome of the last host attempted, or a `NoMxRecords` outcome when
    /// there was nothing to dial.
    pub smtp: Option<ProbeOutcome>,
    pub attempts: Vec<HostProbe>,
    pub reachable: ReachabilityVerdict,
}

impl Verification {
    pub fn is_reachable(&self) -> bool {
        self.reachable == ReachabilityVerdict::Yes
    }
}
