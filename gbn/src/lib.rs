//! GBN - Go-Back-N reliable transfer over UDP
//!
//! High-level Rust API for the GBN ARQ protocol.

pub use gbn_io as io;
pub use gbn_protocol as protocol;

// Re-export commonly used types
pub use protocol::{Datagram, Flag, LossSimulator, Receiver, Sender, SeqNumber, Transport};
