//! Fusion Engine
//!
//! CHỈ combine scores - không threshold, không category.
//! Input: violations + per-detector scores
//! Output: FusionResult

use super::types::{FusionResult, PrimarySource};
use super::weights::NormalizedWeights;
use crate::logic::config::FusionWeights;
use crate::logic::detectors::{DetectorKind, DetectorScore};
use crate::logic::error::ConfigError;
use crate::logic::validation::Violation;

pub const NOMINAL_REASON: &str = "All checks passed; command within normal operating envelope";

pub struct FusionEngine {
    weights: NormalizedWeights,
}

/// One candidate for the primary reason
struct Candidate<'a> {
    contribution: f64,
    source: PrimarySource,
    reason: &'a str,
}

impl FusionEngine {
    pub fn new(raw: &FusionWeights, enabled: &[DetectorKind]) -> Result<Self, ConfigError> {
        Ok(Self {
            weights: NormalizedWeights::new(raw, enabled)?,
        })
    }

    pub fn weights(&self) -> &NormalizedWeights {
        &self.weights
    }

    /// Fill each score's weighted contribution
    pub fn attribute(&self, scores: &mut [DetectorScore]) {
        for s in scores {
            s.contribution = self.weights.get(s.kind) * s.score;
        }
    }

    /// `risk = max(rule_contribution, Σ wᵢ·sᵢ)`.
    ///
    /// `violations` are the rule violations; detector-raised violations are
    /// read from the scores themselves.
    pub fn fuse(&self, violations: &[Violation], scores: &[DetectorScore]) -> FusionResult {
        let mut weighted_sum = 0.0;
        let mut triggered_mass = 0.0;
        let mut rule_contribution: f64 = 0.0;
        let mut candidates: Vec<Candidate<'_>> = Vec::with_capacity(violations.len() + scores.len());

        for v in violations {
            rule_contribution = rule_contribution.max(v.contribution);
            candidates.push(Candidate {
                contribution: v.contribution,
                source: PrimarySource::Rule,
                reason: &v.reason,
            });
        }

        for s in scores {
            let w = self.weights.get(s.kind);
            let weighted = w * s.score;
            weighted_sum += weighted;
            if s.triggered {
                triggered_mass += w;
            }

            let fixed = s.violation.as_ref().map_or(0.0, |v| v.contribution);
            rule_contribution = rule_contribution.max(fixed);
            candidates.push(Candidate {
                contribution: weighted.max(fixed),
                source: PrimarySource::Detector(s.kind),
                reason: &s.reason,
            });
        }

        let weighted_sum = weighted_sum.clamp(0.0, 1.0);
        let risk = rule_contribution.max(weighted_sum).clamp(0.0, 1.0);

        // Highest contribution wins; equal contributions go to the higher-priority source.
        candidates.sort_by_key(|c| c.source.rank());
        let mut best: Option<&Candidate<'_>> = None;
        for c in &candidates {
            if c.contribution > 0.0 && best.map_or(true, |b| c.contribution > b.contribution) {
                best = Some(c);
            }
        }

        let (primary_reason, primary_source) = match best {
            Some(c) => (c.reason.to_string(), c.source),
            None => (NOMINAL_REASON.to_string(), PrimarySource::Nominal),
        };

        FusionResult {
            risk,
            weighted_sum,
            rule_contribution,
            primary_reason,
            primary_source,
            triggered_mass: triggered_mass.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> FusionEngine {
        FusionEngine::new(&FusionWeights::default(), &DetectorKind::ALL).unwrap()
    }

    fn score(kind: DetectorKind, value: f64) -> DetectorScore {
        DetectorScore::new(kind, value, 0.5, format!("{} reason", kind))
    }

    #[test]
    fn test_all_zero_is_nominal() {
        let scores: Vec<_> = DetectorKind::ALL.iter().map(|k| score(*k, 0.0)).collect();
        let result = engine().fuse(&[], &scores);
        assert_eq!(result.risk, 0.0);
        assert_eq!(result.primary_source, PrimarySource::Nominal);
        assert_eq!(result.primary_reason, NOMINAL_REASON);
        assert_eq!(result.triggered_mass, 0.0);
    }

    #[test]
    fn test_weighted_sum() {
        let scores = vec![score(DetectorKind::Replay, 0.5), score(DetectorKind::Spike, 1.0)];
        let result = engine().fuse(&[], &scores);
        assert!((result.risk - (0.17 * 0.5 + 0.12)).abs() < 1e-12);
        assert_eq!(result.primary_source, PrimarySource::Detector(DetectorKind::Spike));
        assert!((result.triggered_mass - 0.29).abs() < 1e-12);
    }

    #[test]
    fn test_attribute_contributions() {
        let mut scores = vec![score(DetectorKind::Fdia, 0.5), score(DetectorKind::Memory, 1.0)];
        let e = engine();
        e.attribute(&mut scores);
        assert!((scores[0].contribution - 0.14).abs() < 1e-12);
        assert!((scores[1].contribution - 0.08).abs() < 1e-12);

        let total: f64 = scores.iter().map(|s| s.contribution).sum();
        assert!((e.fuse(&[], &scores).weighted_sum - total).abs() < 1e-12);
    }

    #[test]
    fn test_rule_dominates() {
        let violations = vec![Violation::high("primary_value", "Voltage too high", 0.90)];
        let scores = vec![score(DetectorKind::Memory, 1.0)];
        let result = engine().fuse(&violations, &scores);
        assert!(result.risk >= 0.90);
        assert_eq!(result.rule_contribution, 0.90);
        assert_eq!(result.primary_source, PrimarySource::Rule);
        assert_eq!(result.primary_reason, "Voltage too high");
    }

    #[test]
    fn test_detector_violation_enters_max_term() {
        let physics = score(DetectorKind::Physics, 1.0)
            .with_violation(Violation::high("physics", "off_state_carries_flow", 1.0));
        let violations = vec![Violation::high("primary_value", "low", 0.80)];
        let result = engine().fuse(&violations, &[physics]);
        assert_eq!(result.risk, 1.0);
        assert_eq!(result.primary_source, PrimarySource::Detector(DetectorKind::Physics));
    }

    #[test]
    fn test_tie_prefers_rule_then_priority() {
        let replay = score(DetectorKind::Replay, 1.0)
            .with_violation(Violation::high("replay", "replayed", 0.80));
        let violations = vec![Violation::high("secondary_value", "range", 0.80)];
        let result = engine().fuse(&violations, &[replay.clone()]);
        assert_eq!(result.primary_source, PrimarySource::Rule);

        let physics = score(DetectorKind::Physics, 1.0)
            .with_violation(Violation::high("physics", "slew", 0.80));
        let result = engine().fuse(&[], &[replay, physics]);
        assert_eq!(result.primary_source, PrimarySource::Detector(DetectorKind::Physics));
    }
}
