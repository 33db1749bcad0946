//! SOCKS client handshakes
//!
//! This module drives the proxy side of a dial: the SOCKS4/4A and SOCKS5
//! CONNECT negotiations, the reply status classification and, for SOCKS4,
//! the local resolution of the destination.

pub mod consts;
mod resolve;
mod status;
mod types;
pub mod v4;
pub mod v5;

pub use resolve::{first_ipv4, resolve_destination, Resolver, Socks4Destination, SystemResolver};
pub use status::{socks4_status, socks5_status};
pub use types::{split_host_port, Target};
