//! Explanation Engine
//!
//! Human-readable explanation per category. Pure text templating over the
//! fusion result and detector scores.

use crate::logic::decision::Category;
use crate::logic::detectors::DetectorScore;
use crate::logic::fusion::{FusionResult, PrimarySource};
use crate::logic::validation::Violation;

/// Scores in this band are worth mentioning on a SAFE decision
const MINOR_LOW: f64 = 0.1;
const MINOR_HIGH: f64 = 0.3;
/// Other detectors above this back up a WARNING
const SUPPORTING_MIN: f64 = 0.2;
/// Detectors above this count as threat indicators on CRITICAL
const INDICATOR_MIN: f64 = 0.5;

pub fn explain(category: Category, fusion: &FusionResult, scores: &[DetectorScore]) -> String {
    match category {
        Category::Safe => explain_safe(scores),
        Category::Warning => explain_warning(fusion, scores),
        Category::Critical => explain_critical(fusion, scores),
    }
}

/// Explanation for a command the schema rejected
pub fn explain_fatal(violations: &[Violation]) -> String {
    let reasons: Vec<&str> = violations.iter().map(|v| v.reason.as_str()).collect();
    format!("CRITICAL: Malformed command rejected: {}", reasons.join("; "))
}

fn explain_safe(scores: &[DetectorScore]) -> String {
    let minor = scores
        .iter()
        .find(|s| s.score > MINOR_LOW && s.score < MINOR_HIGH);
    match minor {
        Some(s) => format!("All systems normal. Minor variance detected: {}", s.reason),
        None => "All systems normal. No security threats detected.".to_string(),
    }
}

fn explain_warning(fusion: &FusionResult, scores: &[DetectorScore]) -> String {
    let supporting = scores
        .iter()
        .find(|s| !is_primary(fusion, s) && s.score > SUPPORTING_MIN);
    match supporting {
        Some(s) => format!(
            "WARNING: {}. Supporting evidence: {}",
            fusion.primary_reason, s.reason
        ),
        None => format!("WARNING: {}", fusion.primary_reason),
    }
}

fn explain_critical(fusion: &FusionResult, scores: &[DetectorScore]) -> String {
    let indicators = scores.iter().filter(|s| s.score > INDICATOR_MIN).count();
    if indicators > 1 {
        format!(
            "CRITICAL: {}. Multiple threat indicators detected ({} detectors)",
            fusion.primary_reason, indicators
        )
    } else {
        format!("CRITICAL: {}", fusion.primary_reason)
    }
}

fn is_primary(fusion: &FusionResult, score: &DetectorScore) -> bool {
    fusion.primary_source == PrimarySource::Detector(score.kind)
}
