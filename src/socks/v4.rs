//! SOCKS4 and SOCKS4A CONNECT handshake
//!
//! A single round trip: the request carries the destination port and IPv4
//! address (a placeholder for SOCKS4A, followed by the hostname) and the proxy
//! answers with a fixed eight byte reply.

use super::consts::*;
use super::resolve::{resolve_destination, Resolver, Socks4Destination};
use super::status::socks4_status;
use super::types::Target;
use crate::config::Socks4Variant;
use crate::error::{SocksError, Stage};
use crate::protocol::{FrameBuilder, Session};
use crate::transport::TunneledConnection;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// Negotiate a CONNECT to `target` over `conn`
///
/// The destination is resolved before anything is written, so a resolution
/// failure leaves the connection untouched. On success the connection's
/// deadlines are cleared and it is marked established.
pub async fn handshake<S>(
    session: &Session<'_>,
    conn: &mut TunneledConnection<S>,
    variant: Socks4Variant,
    target: &Target<'_>,
    resolver: &dyn Resolver,
) -> Result<(), SocksError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let dest = resolve_destination(variant, target.host, resolver).await?;

    let mut frame = session.frame();
    encode_request(&mut frame, target.port, &dest);

    let reply = session.send_receive(conn, frame.as_bytes()).await?;
    if reply.len() != SOCKS4_REPLY_LEN {
        return Err(SocksError::ProtocolFormat {
            stage: Stage::Socks4Connect,
            expected: SOCKS4_REPLY_LEN,
            actual: reply.len(),
        });
    }
    // Byte 0 is the reply version, which proxies fill inconsistently.
    socks4_status(reply[1])?;

    conn.establish();
    debug!("SOCKS4 tunnel established to {}", target);
    Ok(())
}

fn encode_request(frame: &mut FrameBuilder<'_>, port: u16, dest: &Socks4Destination<'_>) {
    frame
        .put_u8(SOCKS4_VERSION)
        .put_u8(SOCKS4_CMD_CONNECT)
        .put_u16(port)
        .put_slice(&dest.ip)
        // Empty user-id
        .put_u8(0);
    if let Some(host) = dest.hostname {
        frame.put_str(host).put_u8(0);
    }
}
