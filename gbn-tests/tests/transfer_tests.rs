//! End-to-end transfer tests
//!
//! The sender and receiver engines run against each other over an in-memory
//! datagram channel (loss injected by the receiver-side simulator, the way
//! the protocol models it) and over real UDP sockets on localhost.

use gbn_protocol::{Datagram, Flag, LossSimulator, Receiver, Sender, SeqNumber};
use gbn_tests::{link_pair, pattern, PairLink};
use std::io::Cursor;
use std::thread;
use std::time::Duration;

fn spawn_receiver(
    link: PairLink,
    loss: LossSimulator,
) -> thread::JoinHandle<(gbn_protocol::ReceiverStats, Vec<u8>)> {
    thread::spawn(move || {
        let mut receiver = Receiver::new(link, Vec::new(), loss);
        let stats = receiver.run().expect("receiver failed");
        (stats, receiver.into_sink())
    })
}

#[test]
fn lossless_transfer_is_byte_identical() {
    // Scenario A: window 4, MSS 100, 10 segments, lossless channel.
    let (sender_link, receiver_link) = link_pair();
    let receiver = spawn_receiver(receiver_link, LossSimulator::disabled());

    let input = pattern(1000);
    let mut sender = Sender::new(sender_link, 4, 100, Duration::from_millis(200)).unwrap();
    let stats = sender.run(&mut Cursor::new(input.clone())).unwrap();

    let (recv_stats, output) = receiver.join().unwrap();

    assert_eq!(output, input);
    assert_eq!(stats.segments_sent, 10);
    assert_eq!(stats.bytes_sent, 1000);
    assert_eq!(stats.acks_accepted, 10);
    assert_eq!(stats.retransmit_bursts, 0);
    assert_eq!(recv_stats.segments_accepted, 10);
    assert_eq!(recv_stats.acks_sent, 10);
    assert_eq!(recv_stats.bytes_written, 1000);
}

#[test]
fn transfer_survives_simulated_loss() {
    // A quarter of arriving datagrams are dropped by the receiver; go-back-N
    // resends must still deliver the exact byte stream, in order, without
    // duplication.
    let (sender_link, receiver_link) = link_pair();
    let receiver = spawn_receiver(receiver_link, LossSimulator::from_seed(0.25, 42));

    let input = pattern(5000); // 50 segments of 100 bytes
    let mut sender = Sender::new(sender_link, 8, 100, Duration::from_millis(30)).unwrap();
    let stats = sender.run(&mut Cursor::new(input.clone())).unwrap();

    let (recv_stats, output) = receiver.join().unwrap();

    assert_eq!(output, input);
    assert_eq!(recv_stats.segments_accepted, 50);
    assert!(recv_stats.simulated_drops > 0, "seeded run should drop datagrams");
    assert!(stats.retransmit_bursts > 0, "loss must trigger resend bursts");
}

#[test]
fn empty_input_transfers_cleanly() {
    let (sender_link, receiver_link) = link_pair();
    let receiver = spawn_receiver(receiver_link, LossSimulator::disabled());

    let mut sender = Sender::new(sender_link, 4, 100, Duration::from_millis(200)).unwrap();
    let stats = sender.run(&mut Cursor::new(Vec::new())).unwrap();

    let (recv_stats, output) = receiver.join().unwrap();
    assert!(output.is_empty());
    assert_eq!(stats.segments_sent, 0);
    assert_eq!(recv_stats.segments_accepted, 0);
}

#[test]
fn input_not_a_multiple_of_mss() {
    let (sender_link, receiver_link) = link_pair();
    let receiver = spawn_receiver(receiver_link, LossSimulator::disabled());

    let input = pattern(1234); // 12 full segments + 34-byte tail
    let mut sender = Sender::new(sender_link, 4, 100, Duration::from_millis(200)).unwrap();
    let stats = sender.run(&mut Cursor::new(input.clone())).unwrap();

    let (_, output) = receiver.join().unwrap();
    assert_eq!(output, input);
    assert_eq!(stats.segments_sent, 13);
}

#[test]
fn full_loss_resends_identical_window() {
    // Scenario B: the peer never acknowledges anything. The timer must fire
    // repeatedly and each go-back-N burst must replay the full window with
    // payload bytes identical to the first transmission.
    struct SilentLink {
        sent: Vec<Vec<u8>>,
    }

    impl gbn_protocol::Transport for SilentLink {
        fn send(&mut self, frame: &[u8]) -> std::io::Result<()> {
            self.sent.push(frame.to_vec());
            Ok(())
        }

        fn recv(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "silent link never delivers",
            ))
        }

        fn try_recv(&mut self, _buf: &mut [u8]) -> std::io::Result<Option<usize>> {
            Ok(None)
        }

        fn recv_deadline(
            &mut self,
            _buf: &mut [u8],
            timeout: Duration,
        ) -> std::io::Result<Option<usize>> {
            thread::sleep(timeout);
            Ok(None)
        }
    }

    let timeout = Duration::from_millis(50);
    let mut sender = Sender::new(SilentLink { sent: Vec::new() }, 4, 100, timeout).unwrap();

    // Fill the window.
    for i in 0..4u8 {
        sender.send_segment(&[i; 100]).unwrap();
    }
    let first_burst: Vec<Vec<u8>> = sender.transport().sent.clone();
    assert_eq!(first_burst.len(), 4);

    // Two full timeout intervals fit comfortably inside 3x the timeout.
    for _ in 0..2 {
        thread::sleep(timeout + Duration::from_millis(10));
        assert!(sender.timer().expired());
        let resent = sender.on_timer_expiry().unwrap();
        assert_eq!(resent, 4);
    }

    let sent = &sender.transport().sent;
    assert_eq!(sent.len(), 12); // initial window + 2 bursts
    assert_eq!(&sent[4..8], &first_burst[..]);
    assert_eq!(&sent[8..12], &first_burst[..]);
    assert_eq!(sender.stats().retransmit_bursts, 2);
    assert_eq!(sender.stats().segments_retransmitted, 8);
}

#[test]
fn ack_trace_is_cumulative_in_order() {
    // Inspect the raw ACK stream of a lossless transfer: sequences 0..N-1,
    // each acknowledged exactly once, in order.
    struct TapLink {
        inner: PairLink,
        acks_seen: Vec<u32>,
    }

    impl gbn_protocol::Transport for TapLink {
        fn send(&mut self, frame: &[u8]) -> std::io::Result<()> {
            let datagram = Datagram::from_bytes(frame).expect("receiver sends valid frames");
            assert_eq!(datagram.header.flag, Flag::Ack);
            self.acks_seen.push(datagram.header.seq.as_raw());
            self.inner.send(frame)
        }

        fn recv(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inner.recv(buf)
        }

        fn try_recv(&mut self, buf: &mut [u8]) -> std::io::Result<Option<usize>> {
            self.inner.try_recv(buf)
        }

        fn recv_deadline(
            &mut self,
            buf: &mut [u8],
            timeout: Duration,
        ) -> std::io::Result<Option<usize>> {
            self.inner.recv_deadline(buf, timeout)
        }
    }

    let (sender_link, receiver_link) = link_pair();
    let receiver = thread::spawn(move || {
        let tap = TapLink {
            inner: receiver_link,
            acks_seen: Vec::new(),
        };
        let mut receiver = Receiver::new(tap, Vec::new(), LossSimulator::disabled());
        receiver.run().expect("receiver failed");
        receiver.transport().acks_seen.clone()
    });

    let input = pattern(1000);
    let mut sender = Sender::new(sender_link, 4, 100, Duration::from_millis(200)).unwrap();
    sender.run(&mut Cursor::new(input)).unwrap();

    let acks_seen = receiver.join().unwrap();
    assert_eq!(acks_seen, (0u32..10).collect::<Vec<_>>());
}

#[test]
fn udp_loopback_transfer() {
    use gbn::io::UdpLink;

    let server = UdpLink::bind(0).unwrap();
    let port = server.local_addr().unwrap().port();

    let receiver = thread::spawn(move || {
        let mut receiver = Receiver::new(server, Vec::new(), LossSimulator::disabled());
        let stats = receiver.run().expect("receiver failed");
        (stats, receiver.into_sink())
    });

    let client = UdpLink::connect("127.0.0.1", port).unwrap();
    let input = pattern(64 * 1024);
    let mut sender = Sender::new(client, 16, 1024, Duration::from_millis(250)).unwrap();
    let stats = sender.run(&mut Cursor::new(input.clone())).unwrap();

    let (recv_stats, output) = receiver.join().unwrap();

    assert_eq!(output, input);
    assert_eq!(stats.segments_sent, 64);
    assert_eq!(recv_stats.bytes_written, 64 * 1024);
}

#[test]
fn close_carries_final_sequence_number() {
    let (sender_link, receiver_link) = link_pair();
    let receiver = spawn_receiver(receiver_link, LossSimulator::disabled());

    let mut sender = Sender::new(sender_link, 4, 100, Duration::from_millis(200)).unwrap();
    sender.run(&mut Cursor::new(pattern(300))).unwrap();
    receiver.join().unwrap();

    // Three segments sent, so the counter stands at 3 when CLOSE goes out.
    assert_eq!(sender.window().next_seq(), SeqNumber::new(3));
    assert_eq!(sender.state(), gbn_protocol::SenderState::Closed);
}
