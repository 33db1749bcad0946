//! SOCKS5 CONNECT handshake (RFC 1928, RFC 1929)
//!
//! Method selection, optional username/password sub-negotiation, then the
//! CONNECT request with the target carried as a domain name. One frame
//! builder is reused across the steps.

use super::consts::*;
use super::status::socks5_status;
use super::types::Target;
use crate::config::Credentials;
use crate::error::{SocksError, Stage};
use crate::protocol::{FrameBuilder, Session};
use crate::transport::TunneledConnection;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// Negotiate a CONNECT to `target` over `conn`
///
/// The target host is validated before anything is written. On success the
/// connection's deadlines are cleared and it is marked established.
pub async fn handshake<S>(
    session: &Session<'_>,
    conn: &mut TunneledConnection<S>,
    credentials: Option<&Credentials>,
    target: &Target<'_>,
) -> Result<(), SocksError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    validate_host(target.host)?;

    let method = match credentials {
        Some(_) => SOCKS5_AUTH_METHOD_PASSWORD,
        None => SOCKS5_AUTH_METHOD_NONE,
    };

    let mut frame = session.frame();
    frame.put_u8(SOCKS5_VERSION).put_u8(1).put_u8(method);
    let reply = session.send_receive(conn, frame.as_bytes()).await?;
    check_len(&reply, SOCKS5_SHORT_REPLY_LEN, Stage::MethodSelection)?;
    check_version(reply[0], SOCKS5_VERSION)?;
    if reply[1] != method {
        return Err(SocksError::MethodNegotiation {
            offered: method,
            selected: reply[1],
        });
    }
    drop(reply);
    debug!("SOCKS5 method {:#04x} selected", method);

    if let Some(credentials) = credentials {
        authenticate(session, conn, &mut frame, credentials).await?;
        debug!("SOCKS5 authenticated");
    }

    frame.reset();
    encode_connect(&mut frame, target);
    let reply = session.send_receive(conn, frame.as_bytes()).await?;
    check_len(&reply, SOCKS5_CONNECT_REPLY_LEN, Stage::Socks5Connect)?;
    // Only the status byte decides the outcome; the version byte is not checked.
    socks5_status(reply[1])?;

    conn.establish();
    debug!("SOCKS5 tunnel established to {}", target);
    Ok(())
}

async fn authenticate<S>(
    session: &Session<'_>,
    conn: &mut TunneledConnection<S>,
    frame: &mut FrameBuilder<'_>,
    credentials: &Credentials,
) -> Result<(), SocksError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let username = credentials.username();
    let password = credentials.password();

    // Lengths are bounded by Credentials::new.
    frame
        .reset()
        .put_u8(SOCKS5_AUTH_VERSION)
        .put_u8(username.len() as u8)
        .put_str(username)
        .put_u8(password.len() as u8)
        .put_str(password);

    let reply = session.send_receive(conn, frame.as_bytes()).await?;
    check_len(&reply, SOCKS5_SHORT_REPLY_LEN, Stage::Authentication)?;
    check_version(reply[0], SOCKS5_AUTH_VERSION)?;
    if reply[1] != SOCKS5_AUTH_SUCCESS {
        return Err(SocksError::Authentication(reply[1]));
    }
    Ok(())
}

fn encode_connect(frame: &mut FrameBuilder<'_>, target: &Target<'_>) {
    frame
        .put_u8(SOCKS5_VERSION)
        .put_u8(SOCKS5_CMD_TCP_CONNECT)
        .put_u8(SOCKS5_RESERVED)
        .put_u8(SOCKS5_ADDR_TYPE_DOMAIN)
        .put_u8(target.host.len() as u8)
        .put_str(target.host)
        .put_u16(target.port);
}

pub(crate) fn validate_host(host: &str) -> Result<(), SocksError> {
    if host.is_empty() {
        return Err(SocksError::address(host, "empty host"));
    }
    if host.len() > MAX_DOMAIN_LEN {
        return Err(SocksError::address(host, "host longer than 255 bytes"));
    }
    Ok(())
}

fn check_len(reply: &[u8], expected: usize, stage: Stage) -> Result<(), SocksError> {
    if reply.len() != expected {
        return Err(SocksError::ProtocolFormat {
            stage,
            expected,
            actual: reply.len(),
        });
    }
    Ok(())
}

fn check_version(actual: u8, expected: u8) -> Result<(), SocksError> {
    if actual != expected {
        return Err(SocksError::VersionMismatch { expected, actual });
    }
    Ok(())
}
