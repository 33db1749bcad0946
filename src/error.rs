//! Error types for Socksdial
//!
//! This module defines the error taxonomy returned by every dial operation,
//! together with the reply codes used by SOCKS5 proxies.

use std::fmt;
use std::io;
use thiserror::Error;

/// Handshake step in which a malformed reply was received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// SOCKS4/4A CONNECT reply
    Socks4Connect,
    /// SOCKS5 method selection reply
    MethodSelection,
    /// SOCKS5 username/password sub-negotiation reply
    Authentication,
    /// SOCKS5 CONNECT reply
    Socks5Connect,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Socks4Connect => write!(f, "SOCKS4 connect"),
            Stage::MethodSelection => write!(f, "SOCKS5 method selection"),
            Stage::Authentication => write!(f, "SOCKS5 authentication"),
            Stage::Socks5Connect => write!(f, "SOCKS5 connect"),
        }
    }
}

/// Error returned by a dial operation
#[derive(Error, Debug)]
pub enum SocksError {
    /// Transport error, passed through unchanged
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Reply length did not match the frame the protocol requires
    #[error("SOCKS server does not respond properly: {stage} reply was {actual} bytes, expected {expected}")]
    ProtocolFormat {
        /// Handshake step
        stage: Stage,
        /// Required reply length
        expected: usize,
        /// Bytes actually read
        actual: usize,
    },

    /// Reply carried an unexpected protocol version
    #[error("SOCKS server replied with version {actual}, expected {expected}")]
    VersionMismatch {
        /// Version the client spoke
        expected: u8,
        /// Version found in the reply
        actual: u8,
    },

    /// Proxy selected a method other than the one offered
    #[error("SOCKS method negotiation failed: offered {offered:#04x}, server selected {selected:#04x}")]
    MethodNegotiation {
        /// Method offered by the client
        offered: u8,
        /// Method selected by the server
        selected: u8,
    },

    /// Username/password sub-negotiation rejected
    #[error("SOCKS authentication failed (status {0:#04x})")]
    Authentication(u8),

    /// SOCKS5 CONNECT rejected by the proxy
    #[error("can't complete SOCKS5 connection: {} (status {code:#04x})", socks5_reason(.code))]
    ConnectionRejected {
        /// Raw reply code
        code: u8,
    },

    /// SOCKS4 status 91
    #[error("socks connection request rejected or failed")]
    RejectedOrFailed,

    /// SOCKS4 status 92
    #[error("socks connection request rejected because SOCKS server cannot connect to identd on the client")]
    IdentdUnreachable,

    /// SOCKS4 status 93
    #[error("socks connection request rejected because the client program and identd report different user-ids")]
    IdentMismatch,

    /// SOCKS4 status outside the known set
    #[error("socks connection request failed, unknown error (status {0})")]
    UnknownFailure(u8),

    /// Target is not a valid "host:port" string
    #[error("Invalid address {addr:?}: {reason}")]
    AddressFormat {
        /// Address as supplied by the caller
        addr: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Host could not be resolved to an IPv4 address
    #[error("Failed to resolve {host}: {reason}")]
    Resolution {
        /// Host name that was looked up
        host: String,
        /// Lookup failure detail
        reason: String,
    },

    /// Invalid proxy configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SocksError {
    pub(crate) fn address(addr: &str, reason: &'static str) -> Self {
        SocksError::AddressFormat {
            addr: addr.to_string(),
            reason,
        }
    }
}

/// Reply codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Socks5ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<Socks5ReplyCode> for u8 {
    fn from(code: Socks5ReplyCode) -> Self {
        code as u8
    }
}

impl TryFrom<u8> for Socks5ReplyCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Socks5ReplyCode::Succeeded),
            0x01 => Ok(Socks5ReplyCode::GeneralFailure),
            0x02 => Ok(Socks5ReplyCode::ConnectionNotAllowed),
            0x03 => Ok(Socks5ReplyCode::NetworkUnreachable),
            0x04 => Ok(Socks5ReplyCode::HostUnreachable),
            0x05 => Ok(Socks5ReplyCode::ConnectionRefused),
            0x06 => Ok(Socks5ReplyCode::TtlExpired),
            0x07 => Ok(Socks5ReplyCode::CommandNotSupported),
            0x08 => Ok(Socks5ReplyCode::AddressTypeNotSupported),
            other => Err(other),
        }
    }
}

impl Socks5ReplyCode {
    /// Human readable meaning as given in RFC 1928
    pub fn description(self) -> &'static str {
        match self {
            Socks5ReplyCode::Succeeded => "succeeded",
            Socks5ReplyCode::GeneralFailure => "general SOCKS server failure",
            Socks5ReplyCode::ConnectionNotAllowed => "connection not allowed by ruleset",
            Socks5ReplyCode::NetworkUnreachable => "network unreachable",
            Socks5ReplyCode::HostUnreachable => "host unreachable",
            Socks5ReplyCode::ConnectionRefused => "connection refused",
            Socks5ReplyCode::TtlExpired => "TTL expired",
            Socks5ReplyCode::CommandNotSupported => "command not supported",
            Socks5ReplyCode::AddressTypeNotSupported => "address type not supported",
        }
    }
}

fn socks5_reason(code: &u8) -> &'static str {
    Socks5ReplyCode::try_from(*code)
        .map(Socks5ReplyCode::description)
        .unwrap_or("unassigned reply code")
}
