//! Configuration file support for the learning switch.
//!
//! Loads and validates configuration from TOML files.
//! Default location: /etc/l2switch/l2switch.toml

use crate::error::{L2SwitchError, Result};
use l2switch_types::EtherType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/l2switch/l2switch.toml";

/// What to do with a unicast frame whose destination has not been learned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownDestinationPolicy {
    /// Flood like a broadcast; no rule is installed.
    #[default]
    Flood,
    /// No rule, no packet-out.
    Drop,
}

/// How packet-in handling is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Serialization {
    /// One exclusive section per switch; switches proceed in parallel.
    #[default]
    PerSwitch,
    /// One packet-in at a time across all switches.
    Global,
}

impl FromStr for Serialization {
    type Err = L2SwitchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "per-switch" => Ok(Serialization::PerSwitch),
            "global" => Ok(Serialization::Global),
            other => Err(L2SwitchError::Config(format!(
                "unknown serialization '{}'",
                other
            ))),
        }
    }
}

/// Forwarding behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardingConfig {
    #[serde(default)]
    pub unknown_destination: UnknownDestinationPolicy,

    /// Ether types left to other applications
    #[serde(default = "default_filtered_ether_types")]
    pub filtered_ether_types: Vec<EtherType>,

    /// Ether type placed in the match of installed rules
    #[serde(default = "default_flow_ether_type")]
    pub flow_ether_type: EtherType,
}

/// Concurrency configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    #[serde(default)]
    pub serialization: Serialization,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; RUST_LOG takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of compact text
    #[serde(default)]
    pub json: bool,
}

/// Complete learning switch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct L2SwitchConfig {
    #[serde(default)]
    pub forwarding: ForwardingConfig,

    #[serde(default)]
    pub concurrency: ConcurrencyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_filtered_ether_types() -> Vec<EtherType> {
    crate::classifier::DEFAULT_FILTERED_ETHER_TYPES.to_vec()
}

fn default_flow_ether_type() -> EtherType {
    EtherType::IPV4
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            unknown_destination: UnknownDestinationPolicy::default(),
            filtered_ether_types: default_filtered_ether_types(),
            flow_ether_type: default_flow_ether_type(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl L2SwitchConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| L2SwitchError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => {
                let config = toml::from_str(&content).map_err(|e| {
                    L2SwitchError::Config(format!(
                        "Failed to parse config file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(L2SwitchError::Io(e)),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> Result<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            L2SwitchError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path.as_ref(), content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self
            .forwarding
            .filtered_ether_types
            .iter()
            .find(|t| !t.is_ether_ii())
        {
            return Err(L2SwitchError::Config(format!(
                "filtered_ether_types entry {} is an 802.3 length, not an ether type",
                t
            )));
        }

        if !self.forwarding.flow_ether_type.is_ether_ii() {
            return Err(L2SwitchError::Config(format!(
                "flow_ether_type {} is not an ether type",
                self.forwarding.flow_ether_type
            )));
        }

        if self.logging.level.trim().is_empty() {
            return Err(L2SwitchError::Config("logging.level must not be empty".to_string()));
        }

        Ok(())
    }
}
