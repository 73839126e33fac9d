//! Transport dialing for SMTP probes, either direct or through a SOCKS5
//! proxy.

mod error;
mod proxy;

pub use error::DialError;
pub use proxy::ProxyConfig;

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Anything the probe can speak SMTP over.
pub trait ProbeStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> ProbeStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

pub type BoxedStream = Box<dyn ProbeStream>;

#[async_trait]
pub trait Dial: Send + Sync {
    async fn dial(&self, host: &str, port: u16) -> Result<BoxedStream, DialError>;
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialerConfig {
    pub connect_timeout: Duration,
    pub proxy_uri: Option<String>,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            proxy_uri: None,
        }
    }
}

/// The production dialer. The proxy URI is validated once here, so a bad
/// scheme fails at setup instead of on every probe.
#[derive(Debug, Clone)]
pub struct Dialer {
    connect_timeout: Duration,
    proxy: Option<ProxyConfig>,
}

impl Dialer {
    pub fn new(config: &DialerConfig) -> Result<Self, DialError> {
        let proxy = config
            .proxy_uri
            .as_deref()
            .filter(|uri| !uri.trim().is_empty())
            .map(ProxyConfig::parse)
            .transpose()?;
        Ok(Self {
            connect_timeout: config.connect_timeout,
            proxy,
        })
    }

    pub fn direct(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            proxy: None,
        }
    }

    pub fn proxy(&self) -> Option<&ProxyConfig> {
        self.proxy.as_ref()
    }

    async fn connect(&self, host: &str, port: u16) -> Result<BoxedStream, DialError> {
        match &self.proxy {
            Some(proxy) => {
                let stream = proxy.connect(host, port).await?;
                Ok(Box::new(stream))
            }
            None => {
                let stream = TcpStream::connect((host, port))
                    .await
                    .map_err(|err| DialError::refused(format!("{host}:{port}"), err))?;
                stream.set_nodelay(true).ok();
                Ok(Box::new(stream))
            }
        }
    }
}

#[async_trait]
impl Dial for Dialer {
    async fn dial(&self, host: &str, port: u16) -> Result<BoxedStream, DialError> {
        tracing::debug!(host, port, proxied = self.proxy.is_some(), "dialing");
        match tokio::time::timeout(self.connect_timeout, self.connect(host, port)).await {
            Ok(result) => result,
            Err(_) => Err(DialError::timeout(
                format!("{host}:{port}"),
                self.connect_timeout,
            )),
        }
    }
}

#[cfg(test)]
mod tests;
