use thiserror::Error;

#[derive(Debug, Error)]
pub enum MxError {
    #[error("domain is empty")]
    EmptyDomain,
    #[error("domain IDNA conversion failed")]
    IdnaConversion {
        #[source]
        source: idna::Errors,
    },
    #[error("resolver initialization failed: {source}")]
    ResolverInit {
        #[source]
        source: trust_dns_resolver::error::ResolveError,
    },
    /// Raised both for an empty answer and for a failed lookup; the latter
    /// keeps the resolver error as its source.
    #[error("no MX records for {domain}")]
    NoMxRecords {
        domain: String,
        #[source]
        source: Option<trust_dns_resolver::error::ResolveError>,
    },
}

impl MxError {
    pub(crate) fn idna(source: idna::Errors) -> Self {
        Self::IdnaConversion { source }
    }

    pub(crate) fn resolver_init(source: trust_dns_resolver::error::ResolveError) -> Self {
        Self::ResolverInit { source }
    }

    pub(crate) fn no_records(domain: impl Into<String>) -> Self {
        Self::NoMxRecords {
            domain: domain.into(),
            source: None,
        }
    }

    pub(crate) fn lookup(
        domain: impl Into<String>,
        source: trust_dns_resolver::error::ResolveError,
    ) -> Self {
        Self::NoMxRecords {
            domain: domain.into(),
            source: Some(source),
        }
    }
}
