//! # Configuration Management
//!
//! Protocol constants and runtime configuration for the mesh chat core.
//!
//! The constants in this module are part of the wire format: changing any of
//! them is a breaking change against every peer speaking the same protocol.
//! The `MeshConfig` structure covers the tunable, node-local settings:
//! relay budget, compression policy, transport limits, and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-variable overrides via `from_env()`

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Current supported protocol version. Decoding rejects any other value.
pub const PROTOCOL_VERSION: u8 = 1;

/// Fixed packet header: version (1), type (1), ttl (1), timestamp (8),
/// flags (1), payload length (2). Earlier implementations of this format
/// declared the header as 13 bytes while writing all six fields; the field
/// widths are what actually cross the wire, so the sum is authoritative.
pub const HEADER_SIZE: usize = 14;

/// Fixed-width peer identifier carried in every packet.
pub const SENDER_ID_SIZE: usize = 8;

/// Optional recipient identifier, present when the recipient flag is set.
pub const RECIPIENT_ID_SIZE: usize = 8;

/// Optional trailing signature, present when the signature flag is set.
pub const SIGNATURE_SIZE: usize = 64;

/// Max payload size representable by the 16-bit payload length field.
pub const MAX_PAYLOAD_SIZE: usize = 65535;

/// Largest possible encoded packet (all optional sections present).
pub const MAX_PACKET_SIZE: usize =
    HEADER_SIZE + SENDER_ID_SIZE + RECIPIENT_ID_SIZE + MAX_PAYLOAD_SIZE + SIGNATURE_SIZE;

/// Smallest decodable packet: header plus sender id.
pub const MIN_PACKET_SIZE: usize = HEADER_SIZE + SENDER_ID_SIZE;

/// Decoded message content is clamped to this many bytes, matching the
/// fixed storage the constrained targets allocate per message.
pub const CONTENT_CAPACITY: usize = 255;

/// Default hop budget for newly built packets.
pub const DEFAULT_TTL: u8 = 7;

/// Single-frame limit of the radio transport. Packets larger than this
/// cannot be sent in one frame; splitting is the transport's concern.
pub const BLE_MTU: usize = 512;

/// Maximum number of simultaneously tracked peers.
pub const MAX_PEERS: usize = 8;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct MeshConfig {
    /// Node-local settings (nickname, relay budget)
    #[serde(default)]
    pub node: NodeConfig,

    /// Transport configuration
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MeshConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(nickname) = std::env::var("MESHCHAT_NICKNAME") {
            config.node.nickname = Some(nickname);
        }

        if let Ok(ttl) = std::env::var("MESHCHAT_DEFAULT_TTL") {
            if let Ok(val) = ttl.parse::<u8>() {
                config.node.default_ttl = val;
            }
        }

        if let Ok(mtu) = std::env::var("MESHCHAT_TRANSPORT_MTU") {
            if let Ok(val) = mtu.parse::<usize>() {
                config.transport.mtu = val;
            }
        }

        if let Ok(threshold) = std::env::var("MESHCHAT_COMPRESSION_THRESHOLD") {
            if let Ok(val) = threshold.parse::<usize>() {
                config.transport.compression_threshold_bytes = val;
            }
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        errors.extend(self.node.validate());
        errors.extend(self.transport.validate());
        errors.extend(self.logging.validate());

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Node-local configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
    /// Display nickname override. When unset, the identity's stored
    /// nickname is used.
    pub nickname: Option<String>,

    /// Hop budget assigned to locally originated packets
    pub default_ttl: u8,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            nickname: None,
            default_ttl: DEFAULT_TTL,
        }
    }
}

impl NodeConfig {
    /// Validate node configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(ref nickname) = self.nickname {
            if nickname.is_empty() {
                errors.push("Nickname cannot be empty when set".to_string());
            } else if nickname.len() > 31 {
                errors.push(format!(
                    "Nickname too long: {} bytes (maximum: 31)",
                    nickname.len()
                ));
            }
        }

        if self.default_ttl == 0 {
            errors.push("Default TTL must be greater than 0".to_string());
        }

        errors
    }
}

/// Transport configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    /// Single-frame size limit for the radio link
    pub mtu: usize,

    /// Maximum number of tracked peers
    pub max_peers: usize,

    /// Whether to compress outbound payloads
    pub compression_enabled: bool,

    /// Minimum payload size (bytes) before compression is applied.
    /// Payloads smaller than this threshold bypass compression to reduce overhead.
    #[serde(default)]
    pub compression_threshold_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            mtu: BLE_MTU,
            max_peers: MAX_PEERS,
            compression_enabled: false,
            compression_threshold_bytes: 128,
        }
    }
}

impl TransportConfig {
    /// Validate transport configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.mtu < MIN_PACKET_SIZE {
            errors.push(format!(
                "MTU too small: {} bytes (minimum: {MIN_PACKET_SIZE})",
                self.mtu
            ));
        } else if self.mtu > MAX_PACKET_SIZE {
            errors.push(format!(
                "MTU larger than any packet: {} bytes (maximum useful: {MAX_PACKET_SIZE})",
                self.mtu
            ));
        }

        if self.max_peers == 0 {
            errors.push("Max peers must be greater than 0".to_string());
        }

        if self.compression_enabled && self.compression_threshold_bytes > MAX_PAYLOAD_SIZE {
            errors.push("Compression threshold cannot exceed max payload size".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("meshchat-protocol"),
            log_level: Level::INFO,
            log_to_console: true,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
