//! Transport configuration types
//!
//! Socket options for the TCP connection to the proxy.

use serde::{Deserialize, Serialize};

/// Default keepalive seconds
fn default_keepalive_secs() -> u64 {
    20
}

/// Default keepalive interval
fn default_keepalive_interval() -> u64 {
    8
}

/// Default TCP_NODELAY setting
fn default_nodelay() -> bool {
    true
}

/// TCP transport configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TcpConfig {
    /// Enable TCP_NODELAY
    #[serde(default = "default_nodelay")]
    pub nodelay: bool,

    /// TCP keepalive timeout in seconds
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,

    /// TCP keepalive interval in seconds
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval: u64,
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            nodelay: default_nodelay(),
            keepalive_secs: default_keepalive_secs(),
            keepalive_interval: default_keepalive_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tcp_config_default() {
        let config = TcpConfig::default();
        assert!(config.nodelay);
        assert_eq!(config.keepalive_secs, 20);
        assert_eq!(config.keepalive_interval, 8);
    }

    #[test]
    fn test_tcp_config_partial_toml() {
        let config: TcpConfig = toml::from_str("keepalive_secs = 45").unwrap();
        assert!(config.nodelay);
        assert_eq!(config.keepalive_secs, 45);
        assert_eq!(config.keepalive_interval, 8);
    }
}
