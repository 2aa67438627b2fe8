//! Explicit, non-env-var configuration for RIG extraction.
//!
//! This crate never reads environment variables or ambient configuration
//! files. Every knob a caller might want is a field here with a
//! conservative default; `rig-cli` is the only layer allowed to translate
//! CLI flags (or, eventually, a config file) into a `RigConfig`.

use serde::{Deserialize, Serialize};

use crate::errors::{RigError, RigResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigConfig {
    #[serde(default)]
    pub normalization: NormalizationConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            normalization: NormalizationConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Controls for path/text normalization applied while reading build-system
/// output, independent of any particular plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationConfig {
    /// Newline mode applied to captured subprocess stdout before JSON parse.
    #[serde(default)]
    pub newline: NewlineMode,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            newline: NewlineMode::Lf,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NewlineMode {
    Lf,
}

impl Default for NewlineMode {
    fn default() -> Self {
        NewlineMode::Lf
    }
}

/// Resource limits bounding an extraction run (§5.1). Exceeding any of these
/// is a `RigError::LimitExceeded`, never a silent truncation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "LimitsConfig::default_max_targets")]
    pub max_targets: u64,

    #[serde(default = "LimitsConfig::default_max_tests")]
    pub max_tests: u64,

    /// Mirrors the fixed bound in SPEC_FULL.md §4.1; exposed so tests can
    /// shrink it, but the reference plugin never needs to raise it.
    #[serde(default = "LimitsConfig::default_max_backtrace_depth")]
    pub max_backtrace_depth: u32,

    #[serde(default = "LimitsConfig::default_max_reply_bytes")]
    pub max_reply_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_targets: Self::default_max_targets(),
            max_tests: Self::default_max_tests(),
            max_backtrace_depth: Self::default_max_backtrace_depth(),
            max_reply_bytes: Self::default_max_reply_bytes(),
        }
    }
}

impl LimitsConfig {
    fn default_max_targets() -> u64 {
        50_000
    }
    fn default_max_tests() -> u64 {
        100_000
    }
    fn default_max_backtrace_depth() -> u32 {
        50
    }
    fn default_max_reply_bytes() -> u64 {
        256 * 1024 * 1024
    }
}

/// Validate a `RigConfig`. Core does not read the environment; callers must
/// construct and validate configuration explicitly before running a pipeline.
pub fn validate_config(cfg: &RigConfig) -> RigResult<()> {
    if cfg.limits.max_backtrace_depth == 0 {
        return Err(RigError::InvalidConfig {
            message: "limits.max_backtrace_depth must be > 0".to_string(),
        });
    }
    if cfg.limits.max_targets == 0 {
        return Err(RigError::InvalidConfig {
            message: "limits.max_targets must be > 0".to_string(),
        });
    }
    if cfg.limits.max_reply_bytes == 0 {
        return Err(RigError::InvalidConfig {
            message: "limits.max_reply_bytes must be > 0".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&RigConfig::default()).is_ok());
    }

    #[test]
    fn zero_backtrace_depth_rejected() {
        let mut cfg = RigConfig::default();
        cfg.limits.max_backtrace_depth = 0;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn serde_roundtrip_preserves_defaults() {
        let cfg = RigConfig::default();
        let s = serde_json::to_string(&cfg).unwrap();
        let back: RigConfig = serde_json::from_str(&s).unwrap();
        assert_eq!(back.limits.max_targets, cfg.limits.max_targets);
    }
}
