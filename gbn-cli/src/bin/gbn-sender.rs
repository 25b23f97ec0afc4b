//! GBN Sender - reliable file sender over UDP
//!
//! Reads a file and transfers it to a GBN receiver using go-back-N ARQ.

use anyhow::Context;
use clap::Parser;
use gbn_cli::stats::display_sender_summary;
use gbn_io::UdpLink;
use gbn_protocol::Sender;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "gbn-sender")]
#[command(about = "Go-Back-N reliable file sender over UDP", long_about = None)]
struct Args {
    /// Server hostname or IP address
    host: String,

    /// Server UDP port
    port: u16,

    /// File to transfer
    file: PathBuf,

    /// Sliding window size N (segments)
    #[arg(short = 'w', long, default_value = "64")]
    window: usize,

    /// Maximum segment size in bytes
    #[arg(short = 's', long, default_value = "1024")]
    mss: usize,

    /// Retransmission timeout in milliseconds
    #[arg(long, default_value = "500")]
    timeout_ms: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let link = UdpLink::connect(&args.host, args.port)
        .with_context(|| format!("connecting to {}:{}", args.host, args.port))?;
    tracing::info!(
        host = %args.host,
        port = args.port,
        window = args.window,
        mss = args.mss,
        "GBN sender starting"
    );

    let file = File::open(&args.file)
        .with_context(|| format!("opening input file {}", args.file.display()))?;
    let mut reader = BufReader::new(file);

    let mut sender = Sender::new(
        link,
        args.window,
        args.mss,
        Duration::from_millis(args.timeout_ms),
    )?;

    let started = Instant::now();
    let stats = sender.run(&mut reader).context("transfer failed")?;
    display_sender_summary(&stats, started.elapsed());

    Ok(())
}
