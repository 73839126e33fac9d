use std::future::Future;
use std::path::PathBuf;

use async_trait::async_trait;

pub type FetchError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Where refreshed disposable domain lists come from.
#[async_trait]
pub trait DomainSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<String>, FetchError>;

    /// Label used in events and errors.
    fn name(&self) -> String {
        "domain source".to_string()
    }
}

/// Adapts an async closure into a [`DomainSource`].
pub struct FnSource<F> {
    name: String,
    fetch: F,
}

impl<F, Fut> FnSource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<String>, FetchError>> + Send,
{
    pub fn new(name: impl Into<String>, fetch: F) -> Self {
        Self {
            name: name.into(),
            fetch,
        }
    }
}

#[async_trait]
impl<F, Fut> DomainSource for FnSource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<String>, FetchError>> + Send,
{
    async fn fetch(&self) -> Result<Vec<String>, FetchError> {
        (self.fetch)().await
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Reads one domain per line. Blank lines and `#` comments are skipped.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DomainSource for FileSource {
    async fn fetch(&self) -> Result<Vec<String>, FetchError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(parse_list(&content))
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

pub(crate) fn parse_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
