use std::collections::HashSet;

use async_trait::async_trait;
use trust_dns_resolver::{
    TokioAsyncResolver,
    error::{ResolveError, ResolveErrorKind},
};

use super::{MxError, MxHost};

/// Resolve `domain` to its mail exchangers, most preferred first.
///
/// The answer is re-sorted here rather than trusting the resolver's
/// ordering. A hostname listed at several preferences is kept once, at its
/// lowest preference. An empty answer and a failed lookup both surface as
/// [`MxError::NoMxRecords`].
pub async fn resolve_mx<R>(resolver: &R, domain: &str) -> Result<Vec<MxHost>, MxError>
where
    R: LookupMx + ?Sized,
{
    let mut hosts = match resolver.lookup_mx(domain).await {
        Ok(hosts) => hosts,
        Err(err) if is_empty_answer(&err) => Vec::new(),
        Err(err) => return Err(MxError::lookup(domain, err)),
    };

    hosts.sort();
    let mut seen = HashSet::new();
    hosts.retain(|host| seen.insert(host.hostname.to_ascii_lowercase()));

    if hosts.is_empty() {
        Err(MxError::no_records(domain))
    } else {
        Ok(hosts)
    }
}

pub fn normalize_domain(domain: &str) -> Result<String, MxError> {
    let trimmed = domain.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return Err(MxError::EmptyDomain);
    }
    idna::domain_to_ascii(trimmed).map_err(MxError::idna)
}

pub(crate) fn normalize_exchange(exchange: String) -> String {
    let trimmed = exchange.trim_end_matches('.');
    trimmed.to_ascii_lowercase()
}

fn is_empty_answer(err: &ResolveError) -> bool {
    matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

#[async_trait]
pub trait LookupMx: Send + Sync {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxHost>, ResolveError>;
}

/// Tokio resolver configured from the host's resolv.conf (or platform
/// equivalent).
pub struct SystemResolver {
    inner: TokioAsyncResolver,
}

impl SystemResolver {
    pub fn from_system_conf() -> Result<Self, MxError> {
        let inner = TokioAsyncResolver::tokio_from_system_conf().map_err(MxError::resolver_init)?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl LookupMx for SystemResolver {
    async fn lookup_mx(&self, domain: &str) -> Result<Vec<MxHost>, ResolveError> {
        let lookup = self.inner.mx_lookup(domain).await?;
        let mut records = Vec::new();
        for mx in lookup.iter() {
            let exchange = normalize_exchange(mx.exchange().to_utf8());
            records.push(MxHost::new(mx.preference(), exchange));
        }
        Ok(records)
    }
}
