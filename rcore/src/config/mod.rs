//! Configuration for the RCore engine
//!
//! Configuration can come from a TOML file ([`EngineConfig::from_file`]), from environment
//! variables ([`EngineConfig::from_env`]) or from [`Default`].
//!
//! ```toml
//! warn = "immediate"
//! max_recursion_depth = 64
//!
//! [analysis]
//! include_implicit_casts = true
//! max_samples = 128
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for '{key}': {value}")]
    Invalid { key: String, value: String },
}

/// How warnings are reported, mirroring R's `options(warn = )`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarnLevel {
    /// warn = -1: warnings are dropped
    Ignore,
    /// warn = 0: warnings are collected for later reporting
    #[default]
    Deferred,
    /// warn = 1: collected and logged as soon as they occur
    Immediate,
    /// warn = 2: warnings are turned into errors
    Error,
}

impl WarnLevel {
    pub fn from_option(value: i32) -> Self {
        match value {
            v if v < 0 => WarnLevel::Ignore,
            0 => WarnLevel::Deferred,
            1 => WarnLevel::Immediate,
            _ => WarnLevel::Error,
        }
    }
}

/// Settings for the cast pipeline analyser and samples collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Consult the implicit cast table (scalar boxing, numeric widening) when deciding convertibility
    pub include_implicit_casts: bool,
    /// Upper bound on the samples kept per type expression
    pub max_samples: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            include_implicit_casts: true,
            max_samples: 128,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub warn: WarnLevel,
    /// Deepest list nesting `[[<-` may descend into
    pub max_recursion_depth: usize,
    /// Longest vector an assignment may grow its receiver to
    pub max_vector_length: usize,
    pub analysis: AnalysisConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            warn: WarnLevel::Deferred,
            max_recursion_depth: 64,
            max_vector_length: 1 << 28,
            analysis: AnalysisConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Create a configuration from environment variables, starting from defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = EngineConfig::default();

        if let Ok(warn) = std::env::var("RCORE_WARN") {
            let level = warn.trim().parse::<i32>().map_err(|_| ConfigError::Invalid {
                key: "RCORE_WARN".to_string(),
                value: warn.clone(),
            })?;
            config.warn = WarnLevel::from_option(level);
        }

        if let Ok(implicits) = std::env::var("RCORE_IMPLICIT_CASTS") {
            config.analysis.include_implicit_casts = match implicits.trim() {
                "1" | "true" | "TRUE" => true,
                "0" | "false" | "FALSE" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "RCORE_IMPLICIT_CASTS".to_string(),
                        value: implicits,
                    })
                }
            };
        }

        if let Ok(depth) = std::env::var("RCORE_MAX_RECURSION") {
            config.max_recursion_depth =
                depth.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "RCORE_MAX_RECURSION".to_string(),
                    value: depth.clone(),
                })?;
        }

        if let Ok(length) = std::env::var("RCORE_MAX_VECTOR_LENGTH") {
            config.max_vector_length =
                length.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "RCORE_MAX_VECTOR_LENGTH".to_string(),
                    value: length.clone(),
                })?;
        }

        Ok(config)
    }
}
