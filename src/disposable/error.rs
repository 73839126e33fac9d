use thiserror::Error;

use super::source::FetchError;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("disposable domain fetch from {source_name} failed: {source}")]
    Fetch {
        source_name: String,
        #[source]
        source: FetchError,
    },
    /// An empty list is refused so a broken source cannot wipe the registry.
    #[error("disposable domain source {source_name} returned no domains")]
    EmptyList { source_name: String },
}

impl RegistryError {
    pub(crate) fn fetch(source_name: impl Into<String>, source: FetchError) -> Self {
        Self::Fetch {
            source_name: source_name.into(),
            source,
        }
    }

    pub(crate) fn empty(source_name: impl Into<String>) -> Self {
        Self::EmptyList {
            source_name: source_name.into(),
        }
    }
}
