//! Datagram Format and Serialization
//!
//! Every datagram starts with a fixed 8-byte header in network byte order:
//!
//! | Bytes | Field           | Notes                                   |
//! |-------|-----------------|-----------------------------------------|
//! | 0–3   | sequence number | u32                                     |
//! | 4–5   | checksum        | zeroed while the checksum is computed   |
//! | 6–7   | flag            | DATA=0x5555, ACK=0xAAAA, CLOSE=0xFFFF   |
//! | 8…    | payload         | empty for ACK and CLOSE                 |
//!
//! Serialization writes the header with a zero checksum field, appends the
//! payload, computes the checksum over the whole frame, and patches it into
//! bytes 4–5. Deserialization recomputes over exactly the received bytes
//! (checksum field re-zeroed) and compares; the two sides must never assume
//! different lengths.

use crate::checksum::ones_complement_sum;
use crate::sequence::SeqNumber;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Size of the datagram header in bytes
pub const HEADER_SIZE: usize = 8;

/// Largest datagram a UDP payload can carry (65535 - IP/UDP headers)
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Maximum payload per datagram
pub const MAX_PAYLOAD_SIZE: usize = MAX_DATAGRAM_SIZE - HEADER_SIZE;

/// Offset of the checksum field within the header
const CHECKSUM_OFFSET: usize = 4;

/// Datagram type flag (bytes 6–7 of the header)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Flag {
    /// Payload-carrying segment
    Data = 0x5555,
    /// Cumulative acknowledgment; the sequence field names the newest
    /// segment acknowledged
    Ack = 0xAAAA,
    /// Explicit teardown; terminates both sides
    Close = 0xFFFF,
}

impl Flag {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x5555 => Some(Flag::Data),
            0xAAAA => Some(Flag::Ack),
            0xFFFF => Some(Flag::Close),
            _ => None,
        }
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Datagram header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Segment sequence number (or acknowledged sequence number for ACK)
    pub seq: SeqNumber,
    /// Checksum as carried on the wire; zero until serialization
    pub checksum: u16,
    /// Datagram type
    pub flag: Flag,
}

impl Header {
    /// Parse a header from the first 8 bytes of a frame
    ///
    /// Does not verify the checksum; teardown handling inspects the flag
    /// before any integrity check.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatagramError> {
        if bytes.len() < HEADER_SIZE {
            return Err(DatagramError::Truncated { actual: bytes.len() });
        }

        let mut buf = &bytes[..HEADER_SIZE];
        let seq = SeqNumber::new(buf.get_u32());
        let checksum = buf.get_u16();
        let raw_flag = buf.get_u16();
        let flag = Flag::from_u16(raw_flag).ok_or(DatagramError::UnknownFlag(raw_flag))?;

        Ok(Header { seq, checksum, flag })
    }

    fn put(&self, buf: &mut BytesMut, checksum: u16) {
        buf.put_u32(self.seq.as_raw());
        buf.put_u16(checksum);
        buf.put_u16(self.flag.as_u16());
    }
}

/// A decoded datagram: header plus payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub header: Header,
    pub payload: Bytes,
}

impl Datagram {
    /// Create a payload-carrying DATA datagram
    pub fn data(seq: SeqNumber, payload: Bytes) -> Self {
        debug_assert!(payload.len() <= MAX_PAYLOAD_SIZE);
        Datagram {
            header: Header {
                seq,
                checksum: 0, // filled in by to_bytes
                flag: Flag::Data,
            },
            payload,
        }
    }

    /// Create a zero-payload cumulative ACK for `seq`
    pub fn ack(seq: SeqNumber) -> Self {
        Datagram {
            header: Header {
                seq,
                checksum: 0,
                flag: Flag::Ack,
            },
            payload: Bytes::new(),
        }
    }

    /// Create a zero-payload CLOSE carrying the current sequence counter
    pub fn close(seq: SeqNumber) -> Self {
        Datagram {
            header: Header {
                seq,
                checksum: 0,
                flag: Flag::Close,
            },
            payload: Bytes::new(),
        }
    }

    /// Total size of the encoded frame (header + payload)
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Serialize the datagram, computing and embedding the checksum
    pub fn to_bytes(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());
        self.header.put(&mut buf, 0);
        buf.put_slice(&self.payload);

        // Checksum field is zero at this point, so the sum is taken with the
        // field zeroed, exactly as the receiver will recompute it.
        let checksum = ones_complement_sum(&buf);
        buf[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 2].copy_from_slice(&checksum.to_be_bytes());
        buf
    }

    /// Parse and validate a datagram from exactly the received bytes
    ///
    /// Verifies the checksum over `bytes.len()` bytes with the checksum field
    /// re-zeroed, and rejects ACK/CLOSE frames that carry a payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatagramError> {
        let header = Header::from_bytes(bytes)?;

        verify_checksum(bytes, header.checksum)?;

        let payload = if bytes.len() > HEADER_SIZE {
            Bytes::copy_from_slice(&bytes[HEADER_SIZE..])
        } else {
            Bytes::new()
        };

        if header.flag != Flag::Data && !payload.is_empty() {
            return Err(DatagramError::UnexpectedPayload {
                flag: header.flag,
                len: payload.len(),
            });
        }

        Ok(Datagram { header, payload })
    }
}

/// Recompute the checksum over exactly `bytes` with the checksum field
/// zeroed, and compare against `expected`.
pub fn verify_checksum(bytes: &[u8], expected: u16) -> Result<(), DatagramError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DatagramError::Truncated { actual: bytes.len() });
    }

    let mut scratch = bytes.to_vec();
    scratch[CHECKSUM_OFFSET] = 0;
    scratch[CHECKSUM_OFFSET + 1] = 0;
    let actual = ones_complement_sum(&scratch);

    if actual != expected {
        return Err(DatagramError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}

/// Datagram parsing and validation errors
#[derive(Error, Debug)]
pub enum DatagramError {
    #[error("datagram too short: {actual} bytes, header is {HEADER_SIZE}")]
    Truncated { actual: usize },

    #[error("unknown flag value {0:#06x}")]
    UnknownFlag(u16),

    #[error("checksum mismatch: header {expected:#06x}, computed {actual:#06x}")]
    ChecksumMismatch { expected: u16, actual: u16 },

    #[error("{flag:?} datagram carries {len} payload bytes")]
    UnexpectedPayload { flag: Flag, len: usize },
}
