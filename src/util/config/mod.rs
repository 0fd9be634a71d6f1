//! Tickbridge configuration
//!
//! Configuration is written in RON. Every field is optional:
//!
//! ```text
//! (
//!     scheduler: (async_workers: 4, thread_name: "tick-async"),
//!     logging: (level: Info),
//! )
//! ```
//!
//! # Usage
//!
//! ```rust
//! use tickbridge::util::config::Config;
//!
//! let config = Config::from_ron_str("(scheduler: (async_workers: 2))").unwrap();
//! assert_eq!(config.scheduler.async_workers, 2);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::runtime::scheduler::SchedulerConfig;
use crate::util::logger::{self, LogLevel};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Host scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum level emitted
    #[serde(default = "default_level")]
    pub level: LogLevel,
}

fn default_level() -> LogLevel {
    LogLevel::Info
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl Config {
    /// Parse RON text
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(ConfigError::Parse)
    }

    /// Load from a RON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Load from a RON file, or defaults if it doesn't exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Install the global logger at the configured level.
    ///
    /// Returns `false` if a subscriber was already installed.
    pub fn init_logger(&self) -> bool {
        logger::try_init_with_level(self.logging.level)
    }

    /// Serialize as pretty RON
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(ConfigError::Serialize)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(ron::error::SpannedError),
    #[error("Config serialize error: {0}")]
    Serialize(ron::Error),
}
