//! Statistics display and formatting

use gbn_protocol::{ReceiverStats, SenderStats};
use std::time::Duration;

/// Format bytes in human-readable form
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format bandwidth in human-readable form
pub fn format_bandwidth(bps: u64) -> String {
    const KBPS: u64 = 1000;
    const MBPS: u64 = KBPS * 1000;
    const GBPS: u64 = MBPS * 1000;

    if bps >= GBPS {
        format!("{:.2} Gbps", bps as f64 / GBPS as f64)
    } else if bps >= MBPS {
        format!("{:.2} Mbps", bps as f64 / MBPS as f64)
    } else if bps >= KBPS {
        format!("{:.2} Kbps", bps as f64 / KBPS as f64)
    } else {
        format!("{} bps", bps)
    }
}

/// Format duration in human-readable form
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

fn throughput(bytes: u64, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        ((bytes as f64 * 8.0) / secs) as u64
    } else {
        0
    }
}

/// Display the end-of-transfer summary for the sender
pub fn display_sender_summary(stats: &SenderStats, elapsed: Duration) {
    println!("\n┌───────────────────────────────────────────────┐");
    println!("│ TRANSFER COMPLETE                             │");
    println!("├───────────────────────────────────────────────┤");
    println!("│ Segments sent:      {:<25} │", stats.segments_sent);
    println!("│ Retransmitted:      {:<25} │", stats.segments_retransmitted);
    println!("│ Resend bursts:      {:<25} │", stats.retransmit_bursts);
    println!("│ Payload:            {:<25} │", format_bytes(stats.bytes_sent));
    println!("│ ACKs accepted:      {:<25} │", stats.acks_accepted);
    println!("│ ACKs ignored:       {:<25} │", stats.acks_ignored);
    println!("│ Elapsed:            {:<25} │", format_duration(elapsed));
    println!(
        "│ Goodput:            {:<25} │",
        format_bandwidth(throughput(stats.bytes_sent, elapsed))
    );
    println!("└───────────────────────────────────────────────┘");
}

/// Display the end-of-session summary for the receiver
pub fn display_receiver_summary(stats: &ReceiverStats, elapsed: Duration) {
    println!("\n┌───────────────────────────────────────────────┐");
    println!("│ SESSION COMPLETE                              │");
    println!("├───────────────────────────────────────────────┤");
    println!("│ Segments accepted:  {:<25} │", stats.segments_accepted);
    println!("│ Payload written:    {:<25} │", format_bytes(stats.bytes_written));
    println!("│ ACKs sent:          {:<25} │", stats.acks_sent);
    println!("│ Checksum failures:  {:<25} │", stats.checksum_failures);
    println!("│ Sequence discards:  {:<25} │", stats.sequence_discards);
    println!("│ Simulated drops:    {:<25} │", stats.simulated_drops);
    println!("│ Defensive re-ACKs:  {:<25} │", stats.defensive_reacks);
    println!("│ Elapsed:            {:<25} │", format_duration(elapsed));
    println!("└───────────────────────────────────────────────┘");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(2 * 1024 * 1024), "2.00 MB");
    }

    #[test]
    fn test_format_bandwidth() {
        assert_eq!(format_bandwidth(500), "500 bps");
        assert_eq!(format_bandwidth(10_000), "10.00 Kbps");
        assert_eq!(format_bandwidth(10_000_000), "10.00 Mbps");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 01m 01s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }

    #[test]
    fn test_throughput() {
        assert_eq!(throughput(1_000_000, Duration::from_secs(1)), 8_000_000);
        assert_eq!(throughput(1_000_000, Duration::ZERO), 0);
    }
}
