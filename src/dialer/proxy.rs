use std::fmt;

use percent_encoding::percent_decode_str;
use tokio::net::TcpStream;
use tokio_socks::tcp::Socks5Stream;
use url::Url;

use super::DialError;

const SOCKS5_SCHEME: &str = "socks5";

/// Parsed `socks5://[user[:password]@]host:port`.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    addr: String,
    credentials: Option<Credentials>,
}

#[derive(Clone, PartialEq, Eq)]
struct Credentials {
    username: String,
    password: String,
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("addr", &self.addr)
            .field("authenticated", &self.credentials.is_some())
            .finish()
    }
}

impl ProxyConfig {
    pub fn parse(uri: &str) -> Result<Self, DialError> {
        let url = Url::parse(uri.trim()).map_err(|err| DialError::invalid_uri(uri, err.to_string()))?;
        if !url.scheme().eq_ignore_ascii_case(SOCKS5_SCHEME) {
            return Err(DialError::UnsupportedProxyScheme {
                scheme: url.scheme().to_string(),
            });
        }

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| DialError::invalid_uri(uri, "missing proxy host"))?;
        let port = url
            .port()
            .ok_or_else(|| DialError::invalid_uri(uri, "missing proxy port"))?;

        let credentials = if url.username().is_empty() {
            None
        } else {
            Some(Credentials {
                username: decode(url.username()),
                password: url.password().map(decode).unwrap_or_default(),
            })
        };

        Ok(Self {
            addr: format!("{host}:{port}"),
            credentials,
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    pub(crate) async fn connect(
        &self,
        host: &str,
        port: u16,
    ) -> Result<Socks5Stream<TcpStream>, DialError> {
        let result = match &self.credentials {
            Some(creds) => {
                Socks5Stream::connect_with_password(
                    self.addr.as_str(),
                    (host, port),
                    &creds.username,
                    &creds.password,
                )
                .await
            }
            None => Socks5Stream::connect(self.addr.as_str(), (host, port)).await,
        };
        result.map_err(|err| self.map_error(host, port, err))
    }

    fn map_error(&self, host: &str, port: u16, err: tokio_socks::Error) -> DialError {
        use tokio_socks::Error as Socks;

        let proxy = self.addr.clone();
        match err {
            Socks::NoAcceptableAuthMethods
            | Socks::PasswordAuthFailure(_)
            | Socks::InvalidAuthValues(_) => DialError::ProxyAuth {
                proxy,
                reason: err.to_string(),
            },
            Socks::ConnectionRefused
            | Socks::HostUnreachable
            | Socks::NetworkUnreachable
            | Socks::ConnectionNotAllowedByRuleset => {
                DialError::refused(format!("{host}:{port}"), format!("via {proxy}: {err}"))
            }
            other => DialError::ProxyUnreachable {
                proxy,
                reason: other.to_string(),
            },
        }
    }
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}
