//! Configuration file support for GBN CLI tools

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Sender configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Server hostname or IP address
    pub host: String,
    /// Server UDP port
    pub port: u16,
    /// Input file path
    pub input: String,
    /// Sliding window size N (segments)
    #[serde(default = "default_window")]
    pub window: usize,
    /// Maximum segment size in bytes
    #[serde(default = "default_mss")]
    pub mss: usize,
    /// Retransmission timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_window() -> usize {
    64
}

fn default_mss() -> usize {
    1024
}

fn default_timeout_ms() -> u64 {
    gbn_protocol::DEFAULT_RETRANSMIT_TIMEOUT.as_millis() as u64
}

/// Receiver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// UDP port to listen on
    pub port: u16,
    /// Output file path
    pub output: String,
    /// Probability in [0, 1] that an arriving datagram is artificially dropped
    #[serde(default)]
    pub drop_probability: f64,
}

/// Combined configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sender configuration
    pub sender: Option<SenderConfig>,
    /// Receiver configuration
    pub receiver: Option<ReceiverConfig>,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(sender) = &self.sender {
            if sender.window == 0 {
                return Err(ConfigError::Invalid("window must be at least 1".into()));
            }
            if sender.mss == 0 || sender.mss > gbn_protocol::MAX_PAYLOAD_SIZE {
                return Err(ConfigError::Invalid(format!(
                    "mss must be between 1 and {}",
                    gbn_protocol::MAX_PAYLOAD_SIZE
                )));
            }
        }
        if let Some(receiver) = &self.receiver {
            if !(0.0..=1.0).contains(&receiver.drop_probability) {
                return Err(ConfigError::Invalid(
                    "drop_probability must be within [0, 1]".into(),
                ));
            }
        }
        Ok(())
    }

    /// Create example sender configuration
    pub fn example_sender() -> Self {
        Config {
            sender: Some(SenderConfig {
                host: "192.168.1.10".to_string(),
                port: 9000,
                input: "payload.bin".to_string(),
                window: 64,
                mss: 1024,
                timeout_ms: 500,
            }),
            receiver: None,
        }
    }

    /// Create example receiver configuration
    pub fn example_receiver() -> Self {
        Config {
            sender: None,
            receiver: Some(ReceiverConfig {
                port: 9000,
                output: "received.bin".to_string(),
                drop_probability: 0.0,
            }),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
