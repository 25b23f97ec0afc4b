//! GBN Receiver - reliable file receiver over UDP
//!
//! Listens on a UDP port, reassembles the in-order byte stream, and writes it
//! to a file. An artificial drop probability can be supplied to exercise the
//! sender's timeout-driven recovery.

use anyhow::Context;
use clap::Parser;
use gbn_cli::stats::display_receiver_summary;
use gbn_io::UdpLink;
use gbn_protocol::{LossSimulator, Receiver};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "gbn-receiver")]
#[command(about = "Go-Back-N reliable file receiver over UDP", long_about = None)]
struct Args {
    /// UDP port to listen on
    port: u16,

    /// Output file path
    output: PathBuf,

    /// Probability in [0, 1] that an arriving datagram is artificially dropped
    #[arg(short = 'd', long, default_value = "0.0")]
    drop_probability: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    if !(0.0..=1.0).contains(&args.drop_probability) {
        anyhow::bail!("drop probability must be within [0, 1]");
    }

    let link = UdpLink::bind(args.port).with_context(|| format!("binding port {}", args.port))?;
    tracing::info!(
        port = args.port,
        drop_probability = args.drop_probability,
        "GBN receiver listening"
    );

    let file = File::create(&args.output)
        .with_context(|| format!("creating output file {}", args.output.display()))?;
    let sink = BufWriter::new(file);

    let mut receiver = Receiver::new(link, sink, LossSimulator::new(args.drop_probability));

    let started = Instant::now();
    let stats = receiver.run().context("receive session failed")?;
    display_receiver_summary(&stats, started.elapsed());

    Ok(())
}
