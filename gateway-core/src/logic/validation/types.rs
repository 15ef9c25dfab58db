//! Validation Types
//!
//! Core types cho schema/rule validation.
//! KHÔNG chứa logic - chỉ data structures.

use serde::{Deserialize, Serialize};

// ============================================================================
// SEVERITY
// ============================================================================

/// Violation severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Out-of-policy value; enters fusion with a fixed contribution
    High,
    /// Malformed command; short-circuits the pipeline
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Fatal => "FATAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// VIOLATION
// ============================================================================

/// A single failed check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub reason: String,
    pub severity: Severity,
    /// Fixed risk this violation contributes to fusion (1.0 for FATAL)
    pub contribution: f64,
}

impl Violation {
    pub fn fatal(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
            severity: Severity::Fatal,
            contribution: 1.0,
        }
    }

    pub fn high(field: impl Into<String>, reason: impl Into<String>, contribution: f64) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
            severity: Severity::High,
            contribution,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

// ============================================================================
// VALIDATION OUTCOME
// ============================================================================

/// Result of schema + rule checks, one per command
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub passed: bool,
    pub violations: Vec<Violation>,
}

impl ValidationOutcome {
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
        }
    }

    /// Largest fixed contribution, 0.0 when clean
    pub fn max_contribution(&self) -> f64 {
        self.violations
            .iter()
            .map(|v| v.contribution)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_tracks_passed() {
        let outcome = ValidationOutcome::from_violations(vec![]);
        assert!(outcome.passed);
        assert_eq!(outcome.max_contribution(), 0.0);

        let outcome = ValidationOutcome::from_violations(vec![Violation::high("primary_value", "too high", 0.8)]);
        assert!(!outcome.passed);
        assert_eq!(outcome.max_contribution(), 0.8);
    }

    #[test]
    fn test_fatal_contribution_is_max() {
        let outcome = ValidationOutcome::from_violations(vec![
            Violation::high("secondary_value", "low", 0.8),
            Violation::fatal("actuator_state", "missing"),
        ]);
        assert!(outcome.violations.iter().any(Violation::is_fatal));
        assert_eq!(outcome.max_contribution(), 1.0);
    }
}
