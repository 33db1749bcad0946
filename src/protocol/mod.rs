//! Wire layer shared by the SOCKS4 and SOCKS5 handshakes
//!
//! A handshake builds each request with a [`FrameBuilder`] and trades it for
//! one reply through [`Session::send_receive`]. Both borrow their storage from
//! the session's [`BufferPool`](crate::pool::BufferPool).

mod exchange;
mod frame;

pub use exchange::{Reply, Session};
pub use frame::FrameBuilder;
