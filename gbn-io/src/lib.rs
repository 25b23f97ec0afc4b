//! UDP transport for the GBN protocol
//!
//! Implements the [`gbn_protocol::Transport`] primitives over a real UDP
//! socket: datagram send, non-blocking poll, and blocking receive with a
//! deadline. Everything operating-system specific lives here; the protocol
//! core never sees a socket.

pub mod socket;

pub use socket::{resolve, SocketError, UdpLink};
