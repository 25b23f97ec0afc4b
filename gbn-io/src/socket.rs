//! UDP socket wrapper
//!
//! Provides a cross-platform UDP link to a single peer. The sender connects
//! to a resolved address; the receiver binds a port and locks onto the first
//! peer it hears from. Blocking-with-deadline and non-blocking receives are
//! implemented by switching the socket's blocking mode and read timeout per
//! call, which keeps the protocol loops free of zero-timeout spinning.

use gbn_protocol::Transport;
use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, ErrorKind};
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::time::Duration;
use thiserror::Error;

/// Socket configuration errors
#[derive(Error, Debug)]
pub enum SocketError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("could not resolve '{0}' to a socket address")]
    Resolve(String),

    #[error("invalid socket address")]
    InvalidAddress,
}

/// Resolve a hostname and port to a socket address
///
/// Prefers an IPv4 result when the name maps to several addresses.
pub fn resolve(host: &str, port: u16) -> Result<SocketAddr, SocketError> {
    let mut addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|_| SocketError::Resolve(host.to_string()))?
        .collect();
    addrs.sort_by_key(|addr| !addr.is_ipv4());
    addrs
        .into_iter()
        .next()
        .ok_or_else(|| SocketError::Resolve(host.to_string()))
}

/// UDP datagram link to a single peer
pub struct UdpLink {
    inner: Socket,
    /// Destination for outgoing datagrams; a bound server learns it from the
    /// first datagram it receives
    peer: Option<SocketAddr>,
}

impl UdpLink {
    /// Bind a server-side link on the given local port
    pub fn bind(port: u16) -> Result<Self, SocketError> {
        let addr: SocketAddr = (Ipv4Addr::UNSPECIFIED, port).into();
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;

        tracing::debug!(port, "bound UDP link");
        Ok(UdpLink {
            inner: socket,
            peer: None,
        })
    }

    /// Create a client-side link to `host:port`
    pub fn connect(host: &str, port: u16) -> Result<Self, SocketError> {
        let peer = resolve(host, port)?;
        let domain = if peer.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        let local: SocketAddr = if peer.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        socket.bind(&local.into())?;

        tracing::debug!(%peer, "connected UDP link");
        Ok(UdpLink {
            inner: socket,
            peer: Some(peer),
        })
    }

    /// Local address the socket is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        self.inner
            .local_addr()?
            .as_socket()
            .ok_or(SocketError::InvalidAddress)
    }

    /// The peer datagrams are sent to, once known
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Set the send buffer size
    pub fn set_send_buffer_size(&self, size: usize) -> Result<(), SocketError> {
        self.inner.set_send_buffer_size(size)?;
        Ok(())
    }

    /// Set the receive buffer size
    pub fn set_recv_buffer_size(&self, size: usize) -> Result<(), SocketError> {
        self.inner.set_recv_buffer_size(size)?;
        Ok(())
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        // socket2 takes MaybeUninit; the buffer is already initialized.
        use std::mem::MaybeUninit;
        let uninit_buf = unsafe {
            std::slice::from_raw_parts_mut(buf.as_mut_ptr() as *mut MaybeUninit<u8>, buf.len())
        };

        let (n, addr) = self.inner.recv_from(uninit_buf)?;
        let addr = addr
            .as_socket()
            .ok_or_else(|| io::Error::new(ErrorKind::InvalidData, "non-inet peer address"))?;
        Ok((n, addr))
    }

    fn note_peer(&mut self, addr: SocketAddr) {
        if self.peer.is_none() {
            tracing::debug!(%addr, "locked onto peer");
            self.peer = Some(addr);
        }
    }
}

impl Transport for UdpLink {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        let peer = self
            .peer
            .ok_or_else(|| io::Error::new(ErrorKind::NotConnected, "peer address not yet known"))?;

        let sent = self.inner.send_to(frame, &peer.into())?;
        if sent != frame.len() {
            return Err(io::Error::new(
                ErrorKind::Other,
                format!("short datagram send: {} of {} bytes", sent, frame.len()),
            ));
        }
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.set_nonblocking(false)?;
        self.inner.set_read_timeout(None)?;

        let (n, addr) = self.recv_from(buf)?;
        self.note_peer(addr);
        Ok(n)
    }

    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        self.inner.set_nonblocking(true)?;

        match self.recv_from(buf) {
            Ok((n, addr)) => {
                self.note_peer(addr);
                Ok(Some(n))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn recv_deadline(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        if timeout.is_zero() {
            return self.try_recv(buf);
        }

        self.inner.set_nonblocking(false)?;
        self.inner.set_read_timeout(Some(timeout))?;

        match self.recv_from(buf) {
            Ok((n, addr)) => {
                self.note_peer(addr);
                Ok(Some(n))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn pair() -> (UdpLink, UdpLink) {
        let server = UdpLink::bind(0).unwrap();
        let port = server.local_addr().unwrap().port();
        let client = UdpLink::connect("127.0.0.1", port).unwrap();
        (client, server)
    }

    #[test]
    fn test_bind_assigns_port() {
        let link = UdpLink::bind(0).unwrap();
        assert!(link.local_addr().unwrap().port() > 0);
        assert!(link.peer_addr().is_none());
    }

    #[test]
    fn test_resolve_localhost() {
        let addr = resolve("localhost", 9000).unwrap();
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn test_resolve_failure() {
        assert!(matches!(
            resolve("no.such.host.invalid", 9000),
            Err(SocketError::Resolve(_))
        ));
    }

    #[test]
    fn test_send_recv_roundtrip() {
        let (mut client, mut server) = pair();

        client.send(b"ping").unwrap();

        let mut buf = [0u8; 64];
        let n = server.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ping");
        // The server learned the client's address and can answer.
        assert!(server.peer_addr().is_some());

        server.send(b"pong").unwrap();
        let n = client
            .recv_deadline(&mut buf, Duration::from_secs(2))
            .unwrap()
            .expect("reply within deadline");
        assert_eq!(&buf[..n], b"pong");
    }

    #[test]
    fn test_send_without_peer_fails() {
        let mut server = UdpLink::bind(0).unwrap();
        let err = server.send(b"nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConnected);
    }

    #[test]
    fn test_try_recv_empty_returns_none() {
        let (_client, mut server) = pair();
        let mut buf = [0u8; 64];
        assert!(server.try_recv(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_recv_deadline_times_out() {
        let (_client, mut server) = pair();
        let mut buf = [0u8; 64];

        let start = Instant::now();
        let got = server
            .recv_deadline(&mut buf, Duration::from_millis(50))
            .unwrap();
        assert!(got.is_none());
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_buffer_sizes() {
        let link = UdpLink::bind(0).unwrap();
        link.set_send_buffer_size(262_144).unwrap();
        link.set_recv_buffer_size(262_144).unwrap();
    }
}
