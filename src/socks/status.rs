//! Reply status classification
//!
//! Maps the status byte of a SOCKS4 or SOCKS5 reply to success or to the
//! matching [`SocksError`].

use super::consts::*;
use crate::error::SocksError;

/// Classify the status byte of a SOCKS4/4A reply
pub fn socks4_status(code: u8) -> Result<(), SocksError> {
    match code {
        SOCKS4_REPLY_GRANTED => Ok(()),
        SOCKS4_REPLY_REJECTED => Err(SocksError::RejectedOrFailed),
        SOCKS4_REPLY_IDENTD_UNREACHABLE => Err(SocksError::IdentdUnreachable),
        SOCKS4_REPLY_IDENT_MISMATCH => Err(SocksError::IdentMismatch),
        other => Err(SocksError::UnknownFailure(other)),
    }
}

/// Classify the status byte of a SOCKS5 CONNECT reply
pub fn socks5_status(code: u8) -> Result<(), SocksError> {
    match code {
        SOCKS5_REPLY_SUCCEEDED => Ok(()),
        code => Err(SocksError::ConnectionRejected { code }),
    }
}
