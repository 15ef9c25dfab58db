//! Decision Types
//!
//! Core types cho gateway decisions.
//! KHÔNG chứa logic - chỉ data structures và pure accessors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::detectors::DetectorScore;
use crate::logic::fusion::PrimarySource;
use crate::logic::validation::Violation;

// ============================================================================
// CATEGORY
// ============================================================================

/// Decision category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    /// Allow
    Safe,
    /// Allow, flag for review
    Warning,
    /// Block
    Critical,
}

impl Category {
    /// Pure function of risk and thresholds
    pub fn from_risk(risk: f64, warn: f64, block: f64) -> Self {
        if risk < warn {
            Category::Safe
        } else if risk < block {
            Category::Warning
        } else {
            Category::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Safe => "SAFE",
            Category::Warning => "WARNING",
            Category::Critical => "CRITICAL",
        }
    }

    pub fn verdict(&self) -> Verdict {
        match self {
            Category::Safe => Verdict::Allow,
            Category::Warning => Verdict::AllowFlagged,
            Category::Critical => Verdict::Block,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// VERDICT
// ============================================================================

/// What the request layer should do with the command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Allow,
    AllowFlagged,
    Block,
}

// ============================================================================
// STAGE
// ============================================================================

/// Pipeline state machine: Received → Validated → Scored → Decided.
/// FATAL schema violations jump straight from Received to Decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Validated,
    Scored,
    Decided,
}

impl Stage {
    /// Legal successor stages
    pub fn can_advance_to(&self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Stage::Received, Stage::Validated)
                | (Stage::Received, Stage::Decided)
                | (Stage::Validated, Stage::Scored)
                | (Stage::Scored, Stage::Decided)
        )
    }
}

// ============================================================================
// DECISION
// ============================================================================

/// Final, risk-scored decision for one command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub category: Category,
    /// Unrounded fused risk in [0, 1]
    pub risk_score: f64,
    pub primary_reason: String,
    pub primary_source: PrimarySource,
    /// Detector scores in priority order; empty on FATAL
    pub per_detector: Vec<DetectorScore>,
    pub confidence: f64,
    /// All HIGH/FATAL violations, rules first
    pub violations: Vec<Violation>,
    pub explanation: String,
    pub stages: Vec<Stage>,
    /// SHA-256 of the canonical command, empty when the schema rejected it
    pub command_digest: String,
    pub source_id: String,
    pub received_at: DateTime<Utc>,
}

impl Decision {
    pub fn verdict(&self) -> Verdict {
        self.category.verdict()
    }

    /// Only CRITICAL stops the command
    pub fn is_forwardable(&self) -> bool {
        self.category != Category::Critical
    }

    /// Risk rounded to 2 decimals, display only
    pub fn display_risk(&self) -> f64 {
        (self.risk_score * 100.0).round() / 100.0
    }

    /// Schema rejected the command before any detector ran
    pub fn is_fatal(&self) -> bool {
        self.violations.iter().any(Violation::is_fatal)
    }
}
