//! Detector Types
//!
//! Shared types for all detectors: the kind enum (fixed priority order)
//! and the per-command score.

use serde::{Deserialize, Serialize};

use crate::logic::validation::Violation;

// ============================================================================
// DETECTOR KIND
// ============================================================================

/// Detector identity. Declaration order is the fusion tie-break priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    Fdia,
    Physics,
    Replay,
    Spike,
    Behavior,
    Memory,
}

impl DetectorKind {
    /// All kinds, highest priority first
    pub const ALL: [DetectorKind; 6] = [
        DetectorKind::Fdia,
        DetectorKind::Physics,
        DetectorKind::Replay,
        DetectorKind::Spike,
        DetectorKind::Behavior,
        DetectorKind::Memory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::Fdia => "fdia",
            DetectorKind::Physics => "physics",
            DetectorKind::Replay => "replay",
            DetectorKind::Spike => "spike",
            DetectorKind::Behavior => "behavior",
            DetectorKind::Memory => "memory",
        }
    }

    /// Lower value = higher priority
    pub fn priority(&self) -> u8 {
        *self as u8
    }
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// DETECTOR SCORE
// ============================================================================

/// Output of one detector for one command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorScore {
    pub kind: DetectorKind,
    /// Risk in [0, 1]
    pub score: f64,
    pub reason: String,
    /// Score reached the detector-local trigger threshold
    pub triggered: bool,
    /// Weighted share `wᵢ·sᵢ` of the fused sum, set by fusion
    #[serde(default)]
    pub contribution: f64,
    /// Absolute violation that also enters the fusion dominance term
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<Violation>,
}

impl DetectorScore {
    /// Build a score, clamping into [0, 1] and deriving `triggered`
    pub fn new(kind: DetectorKind, score: f64, trigger: f64, reason: impl Into<String>) -> Self {
        let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            kind,
            score,
            reason: reason.into(),
            triggered: score > 0.0 && score >= trigger,
            contribution: 0.0,
            violation: None,
        }
    }

    /// Nothing to report
    pub fn clear(kind: DetectorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            score: 0.0,
            reason: reason.into(),
            triggered: false,
            contribution: 0.0,
            violation: None,
        }
    }

    pub fn with_violation(mut self, violation: Violation) -> Self {
        self.violation = Some(violation);
        self
    }
}
