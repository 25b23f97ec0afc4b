//! Transport abstraction
//!
//! The ARQ engines never touch a socket directly; they speak to the channel
//! through this trait. `gbn-io` implements it over UDP, and tests implement
//! it over in-memory channels. The channel is assumed to be unreliable: it
//! may drop, duplicate, or reorder datagrams, but never corrupts a datagram's
//! length (truncation is surfaced as a checksum failure by the codec).

use std::io;
use std::time::Duration;

/// Datagram channel to a single peer
pub trait Transport {
    /// Send one datagram to the peer
    ///
    /// A transport-level send failure is fatal to the transfer; there is no
    /// retry below the ARQ layer itself.
    fn send(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Block until the next datagram arrives
    ///
    /// Returns the number of bytes written into `buf`.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Non-blocking poll: the next datagram if one has already arrived
    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>>;

    /// Block until a datagram arrives or `timeout` elapses
    ///
    /// Returns `None` on timeout. A zero timeout degenerates to
    /// [`try_recv`](Transport::try_recv).
    fn recv_deadline(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>>;
}
