//! Receiver-side sequencer
//!
//! Enforces strict in-order acceptance: a segment is accepted only when its
//! checksum verifies over the exact received bytes and its sequence number is
//! the next expected one. There is no reordering buffer; anything arriving
//! out of order is discarded and recovered by the sender's timeout. Accepted
//! payload goes to the output sink and is acknowledged cumulatively. There is
//! no NACK: failure is communicated only by the absence of an
//! acknowledgment, except for a bounded defensive re-ACK after repeated
//! consecutive failures, which unsticks a sender whose ACK was lost.

use crate::datagram::{verify_checksum, Datagram, Flag, Header, HEADER_SIZE, MAX_DATAGRAM_SIZE};
use crate::loss::LossSimulator;
use crate::sequence::SeqNumber;
use crate::transport::Transport;
use std::io::{self, Write};
use thiserror::Error;

/// Consecutive failures tolerated before the last ACK is resent
pub const REACK_THRESHOLD: u32 = 5;

/// Receiver errors
///
/// Checksum and sequence mismatches are not errors at this level: they are
/// recoverable, counted in [`ReceiverStats`], and silently dropped. Only
/// transport and sink failures are fatal.
#[derive(Error, Debug)]
pub enum ReceiverError {
    #[error("transport receive failed: {0}")]
    TransportReceive(#[source] io::Error),

    #[error("transport send failed: {0}")]
    TransportSend(#[source] io::Error),

    #[error("writing output sink failed: {0}")]
    Sink(#[from] io::Error),
}

/// Counters for one receiving session
#[derive(Debug, Clone, Default)]
pub struct ReceiverStats {
    /// Segments accepted in order
    pub segments_accepted: u64,
    /// Payload bytes written to the sink
    pub bytes_written: u64,
    /// Acknowledgments sent (including defensive re-ACKs)
    pub acks_sent: u64,
    /// Datagrams discarded for checksum or framing failures
    pub checksum_failures: u64,
    /// Datagrams discarded for arriving out of order
    pub sequence_discards: u64,
    /// Datagrams dropped by the loss simulator
    pub simulated_drops: u64,
    /// Defensive re-ACKs of the last accepted sequence
    pub defensive_reacks: u64,
}

/// Strictly in-order receiver for one logical connection
pub struct Receiver<T: Transport, W: Write> {
    transport: T,
    sink: W,
    loss: LossSimulator,
    /// Next sequence number accepted
    expected: SeqNumber,
    /// Newest sequence number accepted so far
    last_accepted: Option<SeqNumber>,
    consecutive_failures: u32,
    closed: bool,
    stats: ReceiverStats,
}

impl<T: Transport, W: Write> Receiver<T, W> {
    /// Create a receiver writing accepted payload to `sink`
    pub fn new(transport: T, sink: W, loss: LossSimulator) -> Self {
        Receiver {
            transport,
            sink,
            loss,
            expected: SeqNumber::ZERO,
            last_accepted: None,
            consecutive_failures: 0,
            closed: false,
            stats: ReceiverStats::default(),
        }
    }

    /// Session counters
    pub fn stats(&self) -> &ReceiverStats {
        &self.stats
    }

    /// Next sequence number that will be accepted
    pub fn expected(&self) -> SeqNumber {
        self.expected
    }

    /// `true` once a CLOSE has been observed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the receiver and hand back the output sink
    pub fn into_sink(self) -> W {
        self.sink
    }

    /// Receive datagrams until the peer closes the connection
    ///
    /// One blocking receive per iteration; the sink is flushed before
    /// returning.
    pub fn run(&mut self) -> Result<ReceiverStats, ReceiverError> {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

        while !self.closed {
            let len = self
                .transport
                .recv(&mut buf)
                .map_err(ReceiverError::TransportReceive)?;
            self.on_datagram(&buf[..len])?;
        }

        self.sink.flush()?;
        tracing::info!(
            segments = self.stats.segments_accepted,
            bytes = self.stats.bytes_written,
            "connection closed"
        );
        Ok(self.stats.clone())
    }

    /// Process one raw datagram
    ///
    /// Teardown is handled before anything else: a CLOSE flag terminates the
    /// session even if the loss simulator or checksum would otherwise
    /// interfere. A simulated drop makes the datagram invisible to every
    /// later step.
    pub fn on_datagram(&mut self, raw: &[u8]) -> Result<(), ReceiverError> {
        let header = match Header::from_bytes(raw) {
            Ok(header) => header,
            Err(e) => {
                self.stats.checksum_failures += 1;
                tracing::warn!(error = %e, "discarding unparseable datagram");
                return self.on_failure();
            }
        };

        match header.flag {
            Flag::Close => {
                tracing::info!(seq = header.seq.as_raw(), "received CLOSE");
                self.closed = true;
                return Ok(());
            }
            Flag::Ack => {
                tracing::warn!(seq = header.seq.as_raw(), "unexpected ACK at receiver");
                return Ok(());
            }
            Flag::Data => {}
        }

        if self.loss.should_drop() {
            self.stats.simulated_drops += 1;
            tracing::trace!(seq = header.seq.as_raw(), "simulated datagram loss");
            return Ok(());
        }

        if let Err(e) = verify_checksum(raw, header.checksum) {
            self.stats.checksum_failures += 1;
            tracing::warn!(seq = header.seq.as_raw(), error = %e, "checksum failure, no ACK sent");
            return self.on_failure();
        }

        if header.seq != self.expected {
            self.stats.sequence_discards += 1;
            tracing::debug!(
                seq = header.seq.as_raw(),
                expected = self.expected.as_raw(),
                "out-of-order segment discarded"
            );
            return self.on_failure();
        }

        let payload = &raw[HEADER_SIZE..];
        self.sink.write_all(payload)?;

        self.stats.segments_accepted += 1;
        self.stats.bytes_written += payload.len() as u64;
        self.last_accepted = Some(header.seq);
        self.expected.increment();
        self.consecutive_failures = 0;
        tracing::trace!(seq = header.seq.as_raw(), len = payload.len(), "accepted segment");

        self.send_ack(header.seq)
    }

    /// Bookkeeping for a discarded datagram
    ///
    /// Past the threshold, re-ACK the newest accepted sequence in case the
    /// sender never saw that acknowledgment, then start counting again.
    fn on_failure(&mut self) -> Result<(), ReceiverError> {
        self.consecutive_failures += 1;
        if self.consecutive_failures > REACK_THRESHOLD {
            if let Some(last) = self.last_accepted {
                self.send_ack(last)?;
                self.stats.defensive_reacks += 1;
                tracing::debug!(ack = last.as_raw(), "defensive re-ACK");
            }
            self.consecutive_failures = 0;
        }
        Ok(())
    }

    fn send_ack(&mut self, seq: SeqNumber) -> Result<(), ReceiverError> {
        let frame = Datagram::ack(seq).to_bytes();
        self.transport
            .send(&frame)
            .map_err(ReceiverError::TransportSend)?;
        self.stats.acks_sent += 1;
        Ok(())
    }
}
