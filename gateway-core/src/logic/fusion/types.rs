//! Fusion Types

use serde::{Deserialize, Serialize};

use crate::logic::detectors::DetectorKind;

/// Where the primary reason came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "detector")]
pub enum PrimarySource {
    /// Nothing contributed any risk
    Nominal,
    /// Schema or range rule
    Rule,
    Detector(DetectorKind),
}

impl PrimarySource {
    /// Tie-break rank, lower wins: Rule, then detectors by priority
    pub fn rank(&self) -> u8 {
        match self {
            PrimarySource::Rule => 0,
            PrimarySource::Detector(kind) => 1 + kind.priority(),
            PrimarySource::Nominal => u8::MAX,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PrimarySource::Nominal => "nominal",
            PrimarySource::Rule => "rule",
            PrimarySource::Detector(kind) => kind.as_str(),
        }
    }
}

impl std::fmt::Display for PrimarySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Fused risk for one command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionResult {
    /// `max(rule_contribution, weighted_sum)`, unrounded
    pub risk: f64,
    pub weighted_sum: f64,
    /// Largest fixed violation contribution
    pub rule_contribution: f64,
    pub primary_reason: String,
    pub primary_source: PrimarySource,
    /// Share of normalized weight held by triggered detectors, in [0, 1]
    pub triggered_mass: f64,
}
