//! Error Types
//!
//! Per-command processing never fails (every path ends in a `Decision`),
//! so the only library error is a configuration rejected at construction.

use thiserror::Error;

/// Configuration rejected by `GatewayConfig::validate`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("threshold order invalid: warn {warn} must be < block {block}")]
    ThresholdOrder { warn: f64, block: f64 },

    #[error("{name} must be within [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f64 },

    #[error("fusion weight for {detector} must be finite and within [0, 1], got {value}")]
    InvalidWeight { detector: &'static str, value: f64 },

    #[error("enabled detectors carry zero total fusion weight")]
    ZeroWeightMass,

    #[error("range for {field} is invalid: [{min}, {max}]")]
    InvalidRange { field: &'static str, min: f64, max: f64 },

    #[error("{name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("signature '{name}' is invalid: {reason}")]
    InvalidSignature { name: String, reason: String },
}

impl ConfigError {
    pub(crate) fn param(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
