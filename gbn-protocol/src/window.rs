//! Sender-side sliding window
//!
//! A bounded ring of the most recent unacknowledged outgoing segments. The
//! slot for a segment lives at index `seq mod N` and is only overwritten
//! after a cumulative acknowledgment has freed it. Each slot stores the
//! encoded frame bytes at their exact length together with the true payload
//! length, so retransmission never has to guess how long a buffered segment
//! is.

use crate::sequence::SeqNumber;
use bytes::Bytes;
use thiserror::Error;

/// Window errors
#[derive(Error, Debug)]
pub enum WindowError {
    #[error("window is full: {0} segments in flight")]
    Full(usize),

    #[error("window capacity must be at least 1")]
    ZeroCapacity,
}

/// A buffered in-flight segment
#[derive(Clone)]
struct Slot {
    /// Encoded frame, exactly as first transmitted
    frame: Bytes,
    /// True payload length in bytes
    payload_len: usize,
    /// Sequence number assigned at send time
    seq: SeqNumber,
}

/// Bounded ring of unacknowledged outgoing segments
///
/// ```text
///  send_base          next_seq
///      │                  │
///  ────┼──────────────────┼──────────────▶ seq space
///      │ <── in flight ──▶│
/// ```
pub struct SendWindow {
    slots: Vec<Option<Slot>>,
    capacity: usize,
    /// Oldest unacknowledged sequence number (left window edge)
    send_base: SeqNumber,
    /// Sequence number assigned to the next new segment
    next_seq: SeqNumber,
    /// Total segments ever stored (not counting retransmissions)
    total_sent: u64,
}

impl SendWindow {
    /// Create a window of capacity N
    pub fn new(capacity: usize) -> Result<Self, WindowError> {
        if capacity == 0 {
            return Err(WindowError::ZeroCapacity);
        }

        Ok(SendWindow {
            slots: vec![None; capacity],
            capacity,
            send_base: SeqNumber::ZERO,
            next_seq: SeqNumber::ZERO,
            total_sent: 0,
        })
    }

    #[inline]
    fn index(&self, seq: SeqNumber) -> usize {
        (seq.as_raw() as usize) % self.capacity
    }

    /// Number of segments currently awaiting acknowledgment
    pub fn in_flight(&self) -> usize {
        let d = self.send_base.distance_to(self.next_seq);
        debug_assert!(d >= 0);
        d as usize
    }

    /// `true` when a new segment may be stored
    pub fn has_room(&self) -> bool {
        self.in_flight() < self.capacity
    }

    /// `true` when every stored segment has been acknowledged
    pub fn is_empty(&self) -> bool {
        self.in_flight() == 0
    }

    /// Window capacity N
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest unacknowledged sequence number
    pub fn send_base(&self) -> SeqNumber {
        self.send_base
    }

    /// Sequence number the next new segment will get
    pub fn next_seq(&self) -> SeqNumber {
        self.next_seq
    }

    /// Total segments ever stored
    pub fn total_sent(&self) -> u64 {
        self.total_sent
    }

    /// Store a just-encoded segment and assign it the next sequence number
    ///
    /// Returns the assigned sequence number. Fails when the window already
    /// holds `capacity` unacknowledged segments.
    pub fn record_sent(&mut self, frame: Bytes, payload_len: usize) -> Result<SeqNumber, WindowError> {
        if !self.has_room() {
            return Err(WindowError::Full(self.in_flight()));
        }

        let seq = self.next_seq;
        let idx = self.index(seq);
        debug_assert!(self.slots[idx].is_none(), "overwriting an unacked slot");
        self.slots[idx] = Some(Slot {
            frame,
            payload_len,
            seq,
        });

        self.next_seq = seq.next();
        self.total_sent += 1;
        Ok(seq)
    }

    /// Apply a cumulative acknowledgment for `ack`
    ///
    /// Accepts only acknowledgments inside `[send_base, next_seq)`; everything
    /// up to and including `ack` is freed and the number of freed slots is
    /// returned. Stale or duplicate acknowledgments (behind `send_base`) and
    /// acknowledgments for unsent sequence numbers return `None` with no
    /// state change.
    pub fn acknowledge(&mut self, ack: SeqNumber) -> Option<usize> {
        let offset = self.send_base.distance_to(ack);
        if offset < 0 || offset >= self.in_flight() as i32 {
            return None;
        }

        let freed = (offset + 1) as usize;
        let mut seq = self.send_base;
        for _ in 0..freed {
            let idx = self.index(seq);
            debug_assert!(self.slots[idx].is_some());
            self.slots[idx] = None;
            seq = seq.next();
        }
        self.send_base = seq;
        Some(freed)
    }

    /// Iterate over the in-flight segments in increasing sequence order
    ///
    /// Yields each segment's sequence number and its stored frame bytes at
    /// their exact original length. This is the go-back-N retransmission set:
    /// every buffered still-unacknowledged segment, oldest first.
    pub fn unacked(&self) -> impl Iterator<Item = (SeqNumber, &[u8])> + '_ {
        (0..self.in_flight() as u32).map(move |i| {
            let seq = self.send_base + i;
            let slot = self.slots[self.index(seq)]
                .as_ref()
                .expect("in-flight slot is populated");
            (slot.seq, &slot.frame[..])
        })
    }

    /// True payload length of the in-flight segment `seq`, if buffered
    pub fn payload_len(&self, seq: SeqNumber) -> Option<usize> {
        let offset = self.send_base.distance_to(seq);
        if offset < 0 || offset >= self.in_flight() as i32 {
            return None;
        }
        self.slots[self.index(seq)].as_ref().map(|s| s.payload_len)
    }
}
