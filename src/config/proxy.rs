//! Proxy endpoint description
//!
//! A [`ProxyEndpoint`] names the proxy server, the protocol version spoken to
//! it, optional username/password credentials and an optional timeout. It is
//! built once, from a URI or a [`ProxyConfig`] section, and never changes
//! afterwards.

use crate::error::SocksError;
use crate::helper::{parse_duration, DEFAULT_PROXY_PORT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Maximum length of a SOCKS5 username or password (single length byte)
pub const MAX_CREDENTIAL_LEN: usize = 255;

/// How a SOCKS4 request addresses its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Socks4Variant {
    /// SOCKS4: the client resolves the host to an IPv4 address
    LocalDns,
    /// SOCKS4A: the hostname is sent to the proxy for resolution
    RemoteDns,
}

/// Protocol spoken to the proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProxyVersion {
    /// SOCKS4 or SOCKS4A
    Socks4(Socks4Variant),
    /// SOCKS5
    Socks5,
}

impl ProxyVersion {
    /// URI scheme naming this version
    pub fn scheme(self) -> &'static str {
        match self {
            ProxyVersion::Socks4(Socks4Variant::LocalDns) => "socks4",
            ProxyVersion::Socks4(Socks4Variant::RemoteDns) => "socks4a",
            ProxyVersion::Socks5 => "socks5",
        }
    }
}

impl fmt::Display for ProxyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

impl FromStr for ProxyVersion {
    type Err = SocksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "socks4" => Ok(ProxyVersion::Socks4(Socks4Variant::LocalDns)),
            "socks4a" => Ok(ProxyVersion::Socks4(Socks4Variant::RemoteDns)),
            "socks5" => Ok(ProxyVersion::Socks5),
            _ => Err(SocksError::Config(format!("unknown SOCKS protocol {}", s))),
        }
    }
}

impl TryFrom<String> for ProxyVersion {
    type Error = SocksError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProxyVersion> for String {
    fn from(version: ProxyVersion) -> Self {
        version.scheme().to_string()
    }
}

/// Username/password pair for SOCKS5 authentication
///
/// Both parts are between 1 and 255 bytes long.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create credentials, validating both lengths
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self, SocksError> {
        let username = username.into();
        let password = password.into();
        if username.is_empty()
            || password.is_empty()
            || username.len() > MAX_CREDENTIAL_LEN
            || password.len() > MAX_CREDENTIAL_LEN
        {
            return Err(SocksError::Config(
                "invalid user name or password".to_string(),
            ));
        }
        Ok(Credentials { username, password })
    }

    /// Build optional credentials from possibly-empty parts
    ///
    /// Both empty means no credentials; exactly one empty is an error.
    pub fn from_parts(username: &str, password: &str) -> Result<Option<Self>, SocksError> {
        if username.is_empty() && password.is_empty() {
            return Ok(None);
        }
        Credentials::new(username, password).map(Some)
    }

    /// Username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Password
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Immutable description of a SOCKS proxy server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    version: ProxyVersion,
    addr: String,
    credentials: Option<Credentials>,
    timeout: Option<Duration>,
}

impl ProxyEndpoint {
    /// Describe a proxy at `addr` ("host:port") without credentials or timeout
    pub fn new(version: ProxyVersion, addr: impl Into<String>) -> Self {
        ProxyEndpoint {
            version,
            addr: addr.into(),
            credentials: None,
            timeout: None,
        }
    }

    /// Attach username/password credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the operation timeout; zero means no timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout).filter(|t| !t.is_zero());
        self
    }

    /// Protocol version
    pub fn version(&self) -> ProxyVersion {
        self.version
    }

    /// Proxy address as "host:port"
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Credentials, if configured
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Timeout for connecting and for each handshake exchange
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl FromStr for ProxyEndpoint {
    type Err = SocksError;

    /// Parse `scheme://[user:password@]host[:port][?timeout=<duration>]`
    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(uri)
            .map_err(|e| SocksError::Config(format!("invalid proxy URI {:?}: {}", uri, e)))?;

        let version: ProxyVersion = url.scheme().parse()?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| SocksError::Config(format!("missing proxy host in {:?}", uri)))?;
        let port = url.port().unwrap_or(DEFAULT_PROXY_PORT);

        let username = decode_userinfo(url.username())?;
        let password = url
            .password()
            .map(decode_userinfo)
            .transpose()?
            .unwrap_or_default();

        let mut endpoint = ProxyEndpoint::new(version, format!("{}:{}", host, port));
        endpoint.credentials = Credentials::from_parts(&username, &password)?;

        // An empty value means no timeout.
        if let Some((_, timeout)) = url
            .query_pairs()
            .find(|(key, value)| key == "timeout" && !value.is_empty())
        {
            let timeout = parse_duration(&timeout).map_err(SocksError::Config)?;
            endpoint = endpoint.with_timeout(timeout);
        }

        Ok(endpoint)
    }
}

fn decode_userinfo(component: &str) -> Result<String, SocksError> {
    urlencoding::decode(component)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| SocksError::Config(format!("invalid proxy credentials: {}", e)))
}

/// `[proxy]` section of the configuration file
///
/// Either `url` or both `version` and `server` must be given.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProxyConfig {
    /// Proxy URI; takes precedence over the individual fields
    #[serde(default)]
    pub url: Option<String>,

    /// Protocol version: "socks4", "socks4a" or "socks5"
    #[serde(default)]
    pub version: Option<ProxyVersion>,

    /// Proxy address as "host:port"
    #[serde(default)]
    pub server: Option<String>,

    /// Username for SOCKS5 auth
    #[serde(default)]
    pub username: Option<String>,

    /// Password for SOCKS5 auth
    #[serde(default)]
    pub password: Option<String>,

    /// Timeout as a duration string, e.g. "5s"
    #[serde(default)]
    pub timeout: Option<String>,
}

impl ProxyConfig {
    /// Validate the section and build the endpoint it describes
    pub fn to_endpoint(&self) -> Result<ProxyEndpoint, SocksError> {
        if let Some(url) = &self.url {
            return url.parse();
        }

        let version = self
            .version
            .ok_or_else(|| SocksError::Config("proxy version not configured".to_string()))?;
        let server = self
            .server
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SocksError::Config("proxy server not configured".to_string()))?;

        let mut endpoint = ProxyEndpoint::new(version, server);
        if let Some(credentials) = Credentials::from_parts(
            self.username.as_deref().unwrap_or_default(),
            self.password.as_deref().unwrap_or_default(),
        )? {
            endpoint = endpoint.with_credentials(credentials);
        }
        if let Some(timeout) = &self.timeout {
            let timeout = parse_duration(timeout).map_err(SocksError::Config)?;
            endpoint = endpoint.with_timeout(timeout);
        }
        Ok(endpoint)
    }
}
