//! Shared harness for GBN integration tests
//!
//! Provides an in-memory datagram link pair implementing
//! [`gbn_protocol::Transport`] over channels. The channel itself is reliable
//! and ordered; loss is injected where the protocol expects it, on the
//! receiver side via the loss simulator.

use gbn_protocol::Transport;
use std::io;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// One end of an in-memory datagram channel
pub struct PairLink {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

/// Create a connected pair of in-memory links
pub fn link_pair() -> (PairLink, PairLink) {
    let (a_tx, b_rx) = channel();
    let (b_tx, a_rx) = channel();
    (
        PairLink { tx: a_tx, rx: a_rx },
        PairLink { tx: b_tx, rx: b_rx },
    )
}

fn peer_gone() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "peer endpoint dropped")
}

fn deliver(frame: Vec<u8>, buf: &mut [u8]) -> usize {
    buf[..frame.len()].copy_from_slice(&frame);
    frame.len()
}

impl Transport for PairLink {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        self.tx.send(frame.to_vec()).map_err(|_| peer_gone())
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let frame = self.rx.recv().map_err(|_| peer_gone())?;
        Ok(deliver(frame, buf))
    }

    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        match self.rx.try_recv() {
            Ok(frame) => Ok(Some(deliver(frame, buf))),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(peer_gone()),
        }
    }

    fn recv_deadline(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(deliver(frame, buf))),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(peer_gone()),
        }
    }
}

/// Deterministic payload pattern for end-to-end comparisons
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31) % 251) as u8).collect()
}
