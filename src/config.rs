//! # Container Configuration
//!
//! YAML configuration for the container and its HTTP framer.
//!
//! ```yaml
//! addr: 0.0.0.0:8080
//! app_base: webapps
//! read_timeout_secs: 30
//! framer:
//!   line_length: 2048
//!   new_line: "\r\n\r\n"
//!   max_header_bytes: 65536
//! ```
//!
//! Every key is optional; missing keys take the defaults shown above. CLI
//! flags override values loaded from the file.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default chunk size for socket reads
pub const DEFAULT_LINE_LENGTH: usize = 2048;
/// Default header terminator
pub const DEFAULT_NEW_LINE: &str = "\r\n\r\n";
/// Default maximum header block size
pub const DEFAULT_MAX_HEADER_BYTES: usize = 64 * 1024;

/// Socket framing parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramerConfig {
    /// Maximum bytes requested per socket read
    pub line_length: usize,
    /// Sequence terminating the header block
    pub new_line: String,
    /// Header bytes accepted before giving up on finding the terminator
    pub max_header_bytes: usize,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            line_length: DEFAULT_LINE_LENGTH,
            new_line: DEFAULT_NEW_LINE.to_string(),
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
        }
    }
}

impl FramerConfig {
    /// Check the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero line length, an empty terminator or
    /// a header limit smaller than the terminator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.line_length == 0 {
            return Err(ConfigError::ZeroLineLength);
        }
        if self.new_line.is_empty() {
            return Err(ConfigError::EmptyNewLine);
        }
        if self.max_header_bytes < self.new_line.len() {
            return Err(ConfigError::HeaderLimitTooSmall {
                limit: self.max_header_bytes,
            });
        }
        Ok(())
    }
}

/// Top-level container configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Address and port to bind
    pub addr: String,
    /// Directory whose subdirectories are deployed as applications
    pub app_base: PathBuf,
    /// Socket read timeout; 0 disables it
    pub read_timeout_secs: u64,
    pub framer: FramerConfig,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            app_base: PathBuf::from("webapps"),
            read_timeout_secs: 30,
            framer: FramerConfig::default(),
        }
    }
}

impl ContainerConfig {
    /// Load and validate a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not valid YAML for this schema,
    /// or describes unusable framing parameters.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: ContainerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.framer.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_secs > 0).then(|| Duration::from_secs(self.read_timeout_secs))
    }
}

/// Invalid configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroLineLength,
    EmptyNewLine,
    HeaderLimitTooSmall { limit: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroLineLength => write!(f, "framer.line_length must be greater than 0"),
            ConfigError::EmptyNewLine => write!(f, "framer.new_line must not be empty"),
            ConfigError::HeaderLimitTooSmall { limit } => write!(
                f,
                "framer.max_header_bytes ({}) is smaller than the header terminator",
                limit
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
