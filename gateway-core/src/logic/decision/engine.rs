//! Decision Engine
//!
//! Gateway façade: owns the detectors, the fusion engine and every
//! source's rolling state. One call per command, always returns a
//! `Decision`.
//!
//! Received → Validated → Scored → Decided, with FATAL schema violations
//! jumping straight to Decided without touching any state.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::types::{Category, Decision, Stage};
use crate::logic::command::{Command, RawCommand};
use crate::logic::config::{GatewayConfig, Signature};
use crate::logic::detectors::{build_detectors, Detector, DetectorScore, SignatureSet};
use crate::logic::error::ConfigError;
use crate::logic::explain;
use crate::logic::fusion::{FusionEngine, FusionResult, PrimarySource};
use crate::logic::state::{SourceProfile, SourceRegistry};
use crate::logic::telemetry::{DecisionSink, NoopSink};
use crate::logic::validation::{self, ValidationOutcome, Violation};

pub struct DecisionEngine {
    config: GatewayConfig,
    detectors: Vec<Box<dyn Detector>>,
    signatures: Arc<SignatureSet>,
    fusion: FusionEngine,
    registry: SourceRegistry,
    sink: Arc<dyn DecisionSink>,
}

impl DecisionEngine {
    /// Validate config and build the detector set
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        Self::with_sink(config, Arc::new(NoopSink))
    }

    pub fn with_sink(config: GatewayConfig, sink: Arc<dyn DecisionSink>) -> Result<Self, ConfigError> {
        config.validate()?;

        let enabled = config.detectors.enabled_kinds();
        let fusion = FusionEngine::new(&config.weights, &enabled)?;
        let signatures = Arc::new(SignatureSet::from_config(&config.detectors.memory));
        let detectors = build_detectors(&config, &signatures);
        let registry = SourceRegistry::new(config.history_capacity);

        log::info!(
            "[Gateway] Decision engine ready: {} detectors, thresholds {}/{}",
            detectors.len(),
            config.thresholds.warn,
            config.thresholds.block
        );

        Ok(Self {
            config,
            detectors,
            signatures,
            fusion,
            registry,
            sink,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Number of sources with live state
    pub fn source_count(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Behavior and memory summary of one source
    pub fn source_profile(&self, source_id: &str) -> Option<SourceProfile> {
        self.registry.profile(source_id)
    }

    /// Add (or replace by name) an attack signature at runtime. Applies from
    /// the next scored command on; `config()` keeps the startup set.
    pub fn add_signature(&self, signature: Signature) -> Result<(), ConfigError> {
        self.signatures.add(&signature)?;
        log::info!(
            "[Gateway] Attack signature '{}' registered ({} total)",
            signature.name,
            self.signatures.len()
        );
        Ok(())
    }

    pub fn signature_names(&self) -> Vec<String> {
        self.signatures.names()
    }

    // ------------------------------------------------------------------------
    // ENTRY POINTS
    // ------------------------------------------------------------------------

    /// Evaluate a raw request record
    pub fn evaluate(&self, raw: &RawCommand) -> Decision {
        match validation::validate_schema(raw) {
            Ok(command) => self.run(&command),
            Err(violations) => {
                self.finish(fatal_decision(&raw.source_id, raw.received_at, String::new(), violations))
            }
        }
    }

    /// Evaluate an already typed command. Finite values and a non-empty
    /// source are still enforced.
    pub fn evaluate_command(&self, command: &Command) -> Decision {
        let violations = validation::check_command(command);
        if !violations.is_empty() {
            return self.finish(fatal_decision(
                command.source_id(),
                command.received_at(),
                command.digest(),
                violations,
            ));
        }
        self.run(command)
    }

    /// Drop state of sources idle for longer than `max_idle`
    pub fn evict_idle(&self, now: DateTime<Utc>, max_idle: Duration) -> usize {
        let removed = self.registry.evict_idle(now, max_idle);
        if removed > 0 {
            log::info!("[Gateway] Evicted {} idle sources", removed);
        }
        removed
    }

    // ------------------------------------------------------------------------
    // PIPELINE
    // ------------------------------------------------------------------------

    fn run(&self, command: &Command) -> Decision {
        let mut stages = vec![Stage::Received];
        advance(&mut stages, Stage::Validated);
        let outcome = ValidationOutcome::from_violations(validation::check_ranges(command, &self.config.ranges));
        log::debug!(
            "[Gateway] {} validated: {} rule violations, max contribution {:.2}",
            command.source_id(),
            outcome.violations.len(),
            outcome.max_contribution()
        );

        let handle = self.registry.get_or_create(command.source_id());
        let (scores, fusion, category) = {
            let mut state = handle.lock();

            let mut scores: Vec<DetectorScore> = self
                .detectors
                .iter()
                .map(|d| d.score(command, &state))
                .collect();
            self.fusion.attribute(&mut scores);

            let fusion = self.fusion.fuse(&outcome.violations, &scores);
            let t = &self.config.thresholds;
            let category = Category::from_risk(fusion.risk, t.warn, t.block);

            let accepted = category != Category::Critical;
            for detector in &self.detectors {
                detector.observe(command, accepted, &mut state);
            }
            state.touch(command.received_at());

            (scores, fusion, category)
        };
        advance(&mut stages, Stage::Scored);
        log::debug!(
            "[Gateway] {} scored: risk={:.3} weighted={:.3} rule={:.3}",
            command.source_id(),
            fusion.risk,
            fusion.weighted_sum,
            fusion.rule_contribution
        );

        let mut violations = outcome.violations;
        violations.extend(scores.iter().filter_map(|s| s.violation.clone()));

        advance(&mut stages, Stage::Decided);
        let decision = Decision {
            category,
            risk_score: fusion.risk,
            primary_reason: fusion.primary_reason.clone(),
            primary_source: fusion.primary_source,
            confidence: confidence(category, &fusion),
            explanation: explain::explain(category, &fusion, &scores),
            per_detector: scores,
            violations,
            stages,
            command_digest: command.digest(),
            source_id: command.source_id().to_string(),
            received_at: command.received_at(),
        };

        if category == Category::Critical {
            log::warn!(
                "[Gateway] BLOCK {} risk={:.2}: {}",
                decision.source_id,
                decision.display_risk(),
                decision.primary_reason
            );
        }
        self.finish(decision)
    }

    fn finish(&self, decision: Decision) -> Decision {
        self.sink.record(&decision);
        decision
    }
}

/// Confidence from the triggered weight mass `t`: agreement raises
/// confidence in a flag, silence raises confidence in SAFE.
pub fn confidence(category: Category, fusion: &FusionResult) -> f64 {
    let t = fusion.triggered_mass.clamp(0.0, 1.0);
    match category {
        Category::Safe => 0.5 + 0.5 * (1.0 - t),
        Category::Warning | Category::Critical => 0.5 + 0.5 * t,
    }
}

/// Append the next pipeline stage; an illegal transition is a bug
fn advance(stages: &mut Vec<Stage>, next: Stage) {
    debug_assert!(
        stages.last().map_or(false, |s| s.can_advance_to(next)),
        "illegal stage transition {:?} -> {:?}",
        stages.last(),
        next
    );
    stages.push(next);
}

fn fatal_decision(
    source_id: &str,
    received_at: DateTime<Utc>,
    command_digest: String,
    violations: Vec<Violation>,
) -> Decision {
    let primary_reason = violations
        .first()
        .map(|v| v.reason.clone())
        .unwrap_or_else(|| "Malformed command".to_string());
    log::warn!("[Gateway] FATAL from '{}': {}", source_id, primary_reason);
    let mut stages = vec![Stage::Received];
    advance(&mut stages, Stage::Decided);

    Decision {
        category: Category::Critical,
        risk_score: 1.0,
        primary_reason,
        primary_source: PrimarySource::Rule,
        per_detector: vec![],
        confidence: 1.0,
        explanation: explain::explain_fatal(&violations),
        violations,
        stages,
        command_digest,
        source_id: source_id.to_string(),
        received_at,
    }
}

// ============================================================================
// TESTS
// ============================================================================
