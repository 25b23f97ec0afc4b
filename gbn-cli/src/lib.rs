//! Shared pieces of the GBN command-line tools

pub mod config;
pub mod stats;
