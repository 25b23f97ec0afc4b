//! GBN Protocol Core Implementation
//!
//! This crate implements the core of a go-back-N ARQ reliable byte-stream
//! transfer protocol layered over an unreliable datagram transport, including
//! the wire datagram format and checksum, sequence number handling, the
//! sender-side sliding window with timer-driven retransmission, the strictly
//! in-order receiver sequencer with cumulative acknowledgments, and a
//! receiver-side loss simulator for exercising recovery.
//!
//! All socket I/O goes through the [`Transport`] trait; the crate has no
//! dependency on any operating-system socket API.

pub mod checksum;
pub mod datagram;
pub mod loss;
pub mod receiver;
pub mod sender;
pub mod sequence;
pub mod timer;
pub mod transport;
pub mod window;

pub use datagram::{
    Datagram, DatagramError, Flag, Header, HEADER_SIZE, MAX_DATAGRAM_SIZE, MAX_PAYLOAD_SIZE,
};
pub use loss::LossSimulator;
pub use receiver::{Receiver, ReceiverError, ReceiverStats};
pub use sender::{Sender, SenderError, SenderState, SenderStats, DEFAULT_RETRANSMIT_TIMEOUT};
pub use sequence::SeqNumber;
pub use timer::RetransmitTimer;
pub use transport::Transport;
pub use window::{SendWindow, WindowError};
