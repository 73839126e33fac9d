//! End-to-end verification of one address: disposable lookup, MX
//! resolution, SMTP probe across MX hosts and the final verdict.

mod config;
mod error;
mod types;

pub use config::VerifierConfig;
pub use error::VerifyError;
pub use types::Verification;

use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::dialer::{Dial, Dialer};
use crate::disposable::DisposableRegistry;
use crate::events::{Event, EventKind, EventSink, TracingSink};
use crate::mx::{LookupMx, MxHost, SystemResolver, normalize_domain, resolve_mx};
use crate::reachability::classify;
use crate::smtp_verify::{ErrorKind, HostProbe, ProbeOutcome, ProbeTarget, probe_host};

#[derive(Clone)]
pub struct Verifier {
    config: VerifierConfig,
    resolver: Arc<dyn LookupMx>,
    dialer: Arc<dyn Dial>,
    registry: DisposableRegistry,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Verifier {
    /// Builds a verifier on the system DNS configuration and the built-in
    /// disposable list. HELO name, sender and proxy settings are validated
    /// here.
    pub fn new(config: VerifierConfig) -> Result<Self, VerifyError> {
        config.probe_options().validate()?;
        let dialer = Dialer::new(&config.dialer_config())?;
        let resolver = SystemResolver::from_system_conf()?;
        Ok(Self::with_parts(
            config,
            Arc::new(resolver),
            Arc::new(dialer),
            DisposableRegistry::new(),
            Arc::new(TracingSink),
        ))
    }

    pub fn with_parts(
        config: VerifierConfig,
        resolver: Arc<dyn LookupMx>,
        dialer: Arc<dyn Dial>,
        registry: DisposableRegistry,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            resolver,
            dialer,
            registry,
            sink,
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// The registry consulted by the disposable check. Refreshes started on
    /// it are visible to subsequent verifications.
    pub fn registry(&self) -> &DisposableRegistry {
        &self.registry
    }

    /// Trims and lower-cases `email`, splits it and runs [`Self::verify`].
    pub async fn verify_email(&self, email: &str) -> Result<Verification, VerifyError> {
        let email = email.trim().to_lowercase();
        let target =
            ProbeTarget::from_email(&email).map_err(|err| VerifyError::invalid(&email, err))?;
        Ok(self.verify(&target, &CancelToken::never()).await)
    }

    /// Runs every enabled check against `target`. Failures along the way end
    /// up in the returned record rather than as an error.
    pub async fn verify(&self, target: &ProbeTarget, cancel: &CancelToken) -> Verification {
        let config = &self.config;
        let disposable = config
            .disposable_check
            .then(|| self.registry.is_disposable(&target.domain));

        let lookup = if config.mx_check || config.smtp_check {
            Some(self.lookup(&target.domain).await)
        } else {
            None
        };
        let has_mx = config
            .mx_check
            .then(|| lookup.as_ref().is_some_and(Result::is_ok));

        let mut attempts = Vec::new();
        let smtp = if config.smtp_check {
            Some(match &lookup {
                Some(Ok(hosts)) => {
                    attempts = self.probe_hosts(hosts, target, cancel).await;
                    attempts
                        .last()
                        .map(|attempt| attempt.outcome.clone())
                        .unwrap_or_default()
                }
                Some(Err(cause)) => ProbeOutcome::failed(ErrorKind::NoMxRecords, cause.as_str()),
                None => ProbeOutcome::default(),
            })
        } else {
            None
        };

        let reachable = match &smtp {
            Some(outcome) => classify(outcome, true),
            None => classify(&ProbeOutcome::default(), false),
        };
        tracing::debug!(
            address = %target,
            verdict = %reachable,
            hosts = attempts.len(),
            "verification finished"
        );

        Verification {
            email: target.address(),
            target: target.clone(),
            disposable,
            has_mx,
            mx_hosts: lookup.and_then(Result::ok).unwrap_or_default(),
            smtp,
            attempts,
            reachable,
        }
    }

    /// Resolves MX hosts. A failure is reported to the sink and returned as
    /// its message.
    async fn lookup(&self, domain: &str) -> Result<Vec<MxHost>, String> {
        let result = match normalize_domain(domain) {
            Ok(ascii) => resolve_mx(self.resolver.as_ref(), &ascii).await,
            Err(err) => Err(err),
        };
        result.map_err(|err| {
            let cause = err.to_string();
            self.sink.emit(&Event::new(
                EventKind::MxLookupFailed,
                domain,
                Some(ErrorKind::NoMxRecords),
                &cause,
            ));
            cause
        })
    }

    /// Tries hosts one after the other, moving on only while the answer is
    /// inconclusive. Each attempt is fully closed before the next dial.
    async fn probe_hosts(
        &self,
        hosts: &[MxHost],
        target: &ProbeTarget,
        cancel: &CancelToken,
    ) -> Vec<HostProbe> {
        let options = self.config.probe_options();
        let limit = self.config.max_mx_hosts.max(1);
        let mut attempts = Vec::new();

        for mx in hosts.iter().take(limit) {
            let attempt = probe_host(
                self.dialer.as_ref(),
                &mx.hostname,
                target,
                &options,
                cancel,
            )
            .await;
            let conclusive = attempt.outcome.is_conclusive();
            if !conclusive {
                self.sink.emit(&Event::new(
                    EventKind::HostProbeFailed,
                    &mx.hostname,
                    attempt.outcome.last_error,
                    &attempt.outcome.last_error_text,
                ));
            }
            let cancelled = cancel.is_cancelled()
                || attempt.outcome.last_error == Some(ErrorKind::Cancelled);
            attempts.push(attempt);
            if conclusive || cancelled {
                break;
            }
        }
        attempts
    }
}
