//! Go-Back-N send-side engine
//!
//! The sender owns the sliding window, the sequence counter, and the
//! retransmission timer, and drives them from a single-threaded cooperative
//! loop. Each iteration polls the timer (resending the whole in-flight
//! window on expiry), drains every acknowledgment that has already arrived,
//! and, while the window has room, sends one new segment. When nothing can
//! be sent the loop blocks on the transport with the time remaining until the
//! retransmit deadline, so it never spins.

use crate::datagram::{Datagram, Flag, MAX_DATAGRAM_SIZE, MAX_PAYLOAD_SIZE};
use crate::sequence::SeqNumber;
use crate::timer::RetransmitTimer;
use crate::transport::Transport;
use crate::window::{SendWindow, WindowError};
use bytes::Bytes;
use std::io::{self, Read};
use std::time::Duration;
use thiserror::Error;

/// Default retransmission timeout
pub const DEFAULT_RETRANSMIT_TIMEOUT: Duration = Duration::from_millis(500);

/// Sender errors
///
/// Transport failures are fatal: the engine gives up and the error propagates
/// to the caller, which is expected to terminate the transfer.
#[derive(Error, Debug)]
pub enum SenderError {
    #[error("transport send failed: {0}")]
    TransportSend(#[source] io::Error),

    #[error("transport receive failed: {0}")]
    TransportReceive(#[source] io::Error),

    #[error("reading input source failed: {0}")]
    Input(#[source] io::Error),

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error("max segment size must be between 1 and {MAX_PAYLOAD_SIZE}, got {0}")]
    InvalidSegmentSize(usize),
}

/// Send-side lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    /// Nothing sent yet
    Idle,
    /// Segments in flight, input remaining
    Sending,
    /// Input exhausted, waiting for the window to drain
    Draining,
    /// CLOSE sent
    Closed,
}

/// Counters for one transfer
#[derive(Debug, Clone, Default)]
pub struct SenderStats {
    /// New segments transmitted
    pub segments_sent: u64,
    /// Segments retransmitted by timer expiry
    pub segments_retransmitted: u64,
    /// Go-back-N resend bursts
    pub retransmit_bursts: u64,
    /// Payload bytes transmitted (new segments only)
    pub bytes_sent: u64,
    /// Acknowledgments accepted
    pub acks_accepted: u64,
    /// Stale, duplicate, or malformed acknowledgments ignored
    pub acks_ignored: u64,
}

/// Go-Back-N sender for one transfer
pub struct Sender<T: Transport> {
    transport: T,
    window: SendWindow,
    timer: RetransmitTimer,
    state: SenderState,
    mss: usize,
    stats: SenderStats,
    recv_buf: Vec<u8>,
}

impl<T: Transport> Sender<T> {
    /// Create a sender with window capacity N and the given segment size
    pub fn new(
        transport: T,
        window_size: usize,
        mss: usize,
        timeout: Duration,
    ) -> Result<Self, SenderError> {
        if mss == 0 || mss > MAX_PAYLOAD_SIZE {
            return Err(SenderError::InvalidSegmentSize(mss));
        }

        Ok(Sender {
            transport,
            window: SendWindow::new(window_size)?,
            timer: RetransmitTimer::new(timeout),
            state: SenderState::Idle,
            mss,
            stats: SenderStats::default(),
            recv_buf: vec![0u8; MAX_DATAGRAM_SIZE],
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> SenderState {
        self.state
    }

    /// Transfer counters
    pub fn stats(&self) -> &SenderStats {
        &self.stats
    }

    /// The sliding window
    pub fn window(&self) -> &SendWindow {
        &self.window
    }

    /// The retransmission timer
    pub fn timer(&self) -> &RetransmitTimer {
        &self.timer
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Configured maximum segment size
    pub fn mss(&self) -> usize {
        self.mss
    }

    /// Send one new segment
    ///
    /// Assigns the next sequence number, encodes and checksums the datagram,
    /// stores a copy in the window, and transmits it. The caller must ensure
    /// the window has room; a full window is an error, not a wait.
    pub fn send_segment(&mut self, payload: &[u8]) -> Result<SeqNumber, SenderError> {
        debug_assert!(payload.len() <= self.mss);

        let was_empty = self.window.is_empty();
        let frame = Datagram::data(self.window.next_seq(), Bytes::copy_from_slice(payload))
            .to_bytes()
            .freeze();

        let seq = self.window.record_sent(frame.clone(), payload.len())?;
        self.transport
            .send(&frame)
            .map_err(SenderError::TransportSend)?;

        if was_empty {
            self.timer.arm();
        }
        self.state = SenderState::Sending;
        self.stats.segments_sent += 1;
        self.stats.bytes_sent += payload.len() as u64;
        tracing::trace!(seq = seq.as_raw(), len = payload.len(), "sent DATA segment");
        Ok(seq)
    }

    /// Apply a cumulative acknowledgment
    ///
    /// Returns the number of window slots freed; zero for a stale, duplicate,
    /// or out-of-range acknowledgment, which causes no state change. An
    /// accepted acknowledgment restarts the timer, or clears it once the
    /// window is fully drained.
    pub fn on_ack(&mut self, ack: SeqNumber) -> usize {
        match self.window.acknowledge(ack) {
            Some(freed) => {
                self.stats.acks_accepted += 1;
                if self.window.is_empty() {
                    self.timer.clear();
                } else {
                    self.timer.arm();
                }
                tracing::debug!(
                    ack = ack.as_raw(),
                    freed,
                    in_flight = self.window.in_flight(),
                    "accepted cumulative ACK"
                );
                freed
            }
            None => {
                self.stats.acks_ignored += 1;
                tracing::trace!(ack = ack.as_raw(), "ignored stale or out-of-range ACK");
                0
            }
        }
    }

    /// Go-back-N recovery: retransmit every in-flight segment
    ///
    /// Resends the buffered segments in increasing sequence order, oldest
    /// first, each with its stored original bytes, then restarts the timer.
    /// Returns the number of segments retransmitted.
    pub fn on_timer_expiry(&mut self) -> Result<usize, SenderError> {
        let mut resent = 0usize;
        for (seq, frame) in self.window.unacked() {
            self.transport
                .send(frame)
                .map_err(SenderError::TransportSend)?;
            tracing::debug!(seq = seq.as_raw(), "retransmitted segment");
            resent += 1;
        }

        if resent > 0 {
            self.stats.segments_retransmitted += resent as u64;
            self.stats.retransmit_bursts += 1;
            self.timer.arm();
            tracing::debug!(resent, "go-back-N resend burst complete");
        } else {
            self.timer.clear();
        }
        Ok(resent)
    }

    /// Process every acknowledgment that has already arrived
    pub fn drain_acks(&mut self) -> Result<(), SenderError> {
        loop {
            let received = self
                .transport
                .try_recv(&mut self.recv_buf)
                .map_err(SenderError::TransportReceive)?;
            match received {
                Some(len) => self.process_ack_frame(len),
                None => return Ok(()),
            }
        }
    }

    /// Send the zero-payload CLOSE and finish
    pub fn send_close(&mut self) -> Result<(), SenderError> {
        let frame = Datagram::close(self.window.next_seq()).to_bytes();
        self.transport
            .send(&frame)
            .map_err(SenderError::TransportSend)?;
        self.timer.clear();
        self.state = SenderState::Closed;
        tracing::info!(seq = self.window.next_seq().as_raw(), "sent CLOSE");
        Ok(())
    }

    /// Drive a complete transfer
    ///
    /// Reads `input` in MSS-sized segments until exhausted, then drains the
    /// window and sends CLOSE. CLOSE goes out only after every data segment
    /// has been acknowledged, so a clean return means the receiver holds the
    /// full byte stream.
    pub fn run<R: Read>(&mut self, input: &mut R) -> Result<SenderStats, SenderError> {
        let mut chunk = vec![0u8; self.mss];
        let mut input_done = false;

        loop {
            if self.timer.expired() {
                self.on_timer_expiry()?;
            }

            self.drain_acks()?;

            if !input_done && self.window.has_room() {
                let n = fill_segment(input, &mut chunk).map_err(SenderError::Input)?;
                if n == 0 {
                    input_done = true;
                    if !self.window.is_empty() {
                        self.state = SenderState::Draining;
                        tracing::debug!(
                            in_flight = self.window.in_flight(),
                            "input exhausted, draining window"
                        );
                    }
                } else {
                    self.send_segment(&chunk[..n])?;
                    continue;
                }
            }

            if input_done && self.window.is_empty() {
                self.send_close()?;
                return Ok(self.stats.clone());
            }

            // Window full, or draining: wait for an acknowledgment or the
            // retransmit deadline, whichever comes first.
            let wait = self.timer.remaining().unwrap_or(Duration::ZERO);
            if wait.is_zero() {
                continue;
            }
            let received = self
                .transport
                .recv_deadline(&mut self.recv_buf, wait)
                .map_err(SenderError::TransportReceive)?;
            if let Some(len) = received {
                self.process_ack_frame(len);
            }
        }
    }

    fn process_ack_frame(&mut self, len: usize) {
        let decoded = Datagram::from_bytes(&self.recv_buf[..len]);
        match decoded {
            Ok(datagram) => match datagram.header.flag {
                Flag::Ack => {
                    self.on_ack(datagram.header.seq);
                }
                flag => {
                    tracing::warn!(flag = ?flag, "unexpected datagram on acknowledgment path");
                }
            },
            Err(e) => {
                self.stats.acks_ignored += 1;
                tracing::warn!(error = %e, "discarding malformed acknowledgment");
            }
        }
    }
}

/// Read up to `buf.len()` bytes, looping over short reads
fn fill_segment<R: Read>(input: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
