//! Protocol configuration.
//!
//! Sources, lowest to highest precedence:
//! 1. Default values
//! 2. A YAML file
//! 3. Environment variables with the `QTOKEN_` prefix
//!
//! Command-line flags are applied on top by the binary.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::verify::{
    DEFAULT_MAX_IN_FLIGHT, DEFAULT_SHOTS, DEFAULT_TOLERANCE_RATE, Tolerance, VerificationPolicy,
};

/// Settings for issuing and verifying tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Qubits per token
    #[serde(default = "default_qubits")]
    pub qubits: u32,

    /// Shots per qubit during verification
    #[serde(default = "default_shots")]
    pub shots: u32,

    /// Absolute bound on `1` outcomes per qubit; overrides the rate when set
    #[serde(default)]
    pub tolerance: Option<u64>,

    /// Bound on `1` outcomes as a fraction of shots
    #[serde(default = "default_tolerance_rate")]
    pub tolerance_rate: f64,

    /// Token time-to-live in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,

    /// Concurrent backend calls during verification
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Seed for angles and sampling; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_qubits() -> u32 {
    1
}

fn default_shots() -> u32 {
    DEFAULT_SHOTS
}

fn default_tolerance_rate() -> f64 {
    DEFAULT_TOLERANCE_RATE
}

fn default_ttl() -> u64 {
    300 // 5 minutes
}

fn default_max_in_flight() -> usize {
    DEFAULT_MAX_IN_FLIGHT
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            qubits: default_qubits(),
            shots: default_shots(),
            tolerance: None,
            tolerance_rate: default_tolerance_rate(),
            ttl_seconds: default_ttl(),
            max_in_flight: default_max_in_flight(),
            seed: None,
        }
    }
}

impl ProtocolConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml_ng::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    /// 3. Validate
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = Self::resolve(config_file)?;
        config.validate()?;
        Ok(config)
    }

    /// File and environment layers without validation, for callers that
    /// apply further overrides before calling [`validate`](Self::validate).
    pub fn resolve(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => ProtocolConfig::default(),
        };
        config.merge_env_with(|key| std::env::var(key).ok())
    }

    /// Apply `QTOKEN_*` overrides from `lookup`.
    ///
    /// Only keys `lookup` returns a value for are applied. A value that does
    /// not parse is an error rather than being skipped.
    pub fn merge_env_with<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "QTOKEN_QUBITS")? {
            self.qubits = v;
        }
        if let Some(v) = parse_var(&lookup, "QTOKEN_SHOTS")? {
            self.shots = v;
        }
        if let Some(v) = parse_var(&lookup, "QTOKEN_TOLERANCE_RATE")? {
            self.tolerance_rate = v;
            self.tolerance = None;
        }
        if let Some(v) = parse_var(&lookup, "QTOKEN_TOLERANCE")? {
            self.tolerance = Some(v);
        }
        if let Some(v) = parse_var(&lookup, "QTOKEN_TTL_SECONDS")? {
            self.ttl_seconds = v;
        }
        if let Some(v) = parse_var(&lookup, "QTOKEN_MAX_IN_FLIGHT")? {
            self.max_in_flight = v;
        }
        if let Some(v) = parse_var(&lookup, "QTOKEN_SEED")? {
            self.seed = Some(v);
        }
        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.qubits == 0 {
            return Err(ConfigError::Validation(
                "qubits must be greater than 0".to_string(),
            ));
        }
        if self.shots == 0 {
            return Err(ConfigError::Validation(
                "shots must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.tolerance_rate) {
            return Err(ConfigError::Validation(format!(
                "tolerance_rate must be within [0, 1], got {}",
                self.tolerance_rate
            )));
        }
        if self.ttl_seconds == 0 {
            return Err(ConfigError::Validation(
                "ttl_seconds must be greater than 0".to_string(),
            ));
        }
        if self.max_in_flight == 0 {
            return Err(ConfigError::Validation(
                "max_in_flight must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective tolerance.
    pub fn tolerance(&self) -> Tolerance {
        match self.tolerance {
            Some(n) => Tolerance::Absolute(n),
            None => Tolerance::Rate(self.tolerance_rate),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Verification policy described by this configuration.
    pub fn to_policy(&self) -> VerificationPolicy {
        VerificationPolicy {
            shots: self.shots,
            tolerance: self.tolerance(),
            max_in_flight: self.max_in_flight,
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    let parsed = value.trim().parse::<T>();
    match parsed {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(ConfigError::Env { key, value }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid value for {key}: '{value}'")]
    Env { key: &'static str, value: String },

    #[error("Validation error: {0}")]
    Validation(String),
}
