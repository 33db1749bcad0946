//! SOCKS protocol constants
//!
//! Defines the wire constants used by the SOCKS4/4A and SOCKS5 handshakes.

/// SOCKS4 protocol version
pub const SOCKS4_VERSION: u8 = 0x04;

/// SOCKS4 CONNECT command
pub const SOCKS4_CMD_CONNECT: u8 = 0x01;

/// Destination placed in a SOCKS4A request so the proxy resolves the host (0.0.0.1)
pub const SOCKS4A_PLACEHOLDER_IP: [u8; 4] = [0, 0, 0, 1];

/// Length of every SOCKS4 reply
pub const SOCKS4_REPLY_LEN: usize = 8;

// SOCKS4 reply codes
/// Request granted
pub const SOCKS4_REPLY_GRANTED: u8 = 90;
/// Request rejected or failed
pub const SOCKS4_REPLY_REJECTED: u8 = 91;
/// Server cannot connect to identd on the client
pub const SOCKS4_REPLY_IDENTD_UNREACHABLE: u8 = 92;
/// Client and identd report different user-ids
pub const SOCKS4_REPLY_IDENT_MISMATCH: u8 = 93;

/// SOCKS5 protocol version
pub const SOCKS5_VERSION: u8 = 0x05;

/// SOCKS5 authentication sub-negotiation version
pub const SOCKS5_AUTH_VERSION: u8 = 0x01;

// Authentication methods
/// No authentication required
pub const SOCKS5_AUTH_METHOD_NONE: u8 = 0x00;
/// Username/password authentication
pub const SOCKS5_AUTH_METHOD_PASSWORD: u8 = 0x02;

/// Username/password sub-negotiation success status
pub const SOCKS5_AUTH_SUCCESS: u8 = 0x00;

/// TCP CONNECT command
pub const SOCKS5_CMD_TCP_CONNECT: u8 = 0x01;

/// Domain name address type
pub const SOCKS5_ADDR_TYPE_DOMAIN: u8 = 0x03;

/// Reserved byte value (always 0x00)
pub const SOCKS5_RESERVED: u8 = 0x00;

/// Succeeded
pub const SOCKS5_REPLY_SUCCEEDED: u8 = 0x00;

/// Length of the method selection and authentication replies
pub const SOCKS5_SHORT_REPLY_LEN: usize = 2;

/// Length of a CONNECT reply carrying an IPv4 bound address
pub const SOCKS5_CONNECT_REPLY_LEN: usize = 10;

/// Maximum domain name length
pub const MAX_DOMAIN_LEN: usize = 255;
