//! Gateway Configuration
//!
//! Typed configuration for the whole pipeline. Every field has a default
//! drawn from `constants.rs`, so a partial JSON file is enough.
//! `GatewayConfig::validate` runs once inside `DecisionEngine::new`.

use serde::{Deserialize, Serialize};

use super::detectors::DetectorKind;
use super::error::ConfigError;
use crate::constants::*;

// ============================================================================
// RANGES
// ============================================================================

/// Closed interval `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Boundary values are inside
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min >= self.max {
            return Err(ConfigError::InvalidRange {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Safe operating ranges checked by the rule validator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RangesConfig {
    pub primary: Range,
    pub secondary: Range,
    pub flow: Range,
    /// Fixed fusion contribution of a range violation
    pub violation_risk: f64,
}

impl Default for RangesConfig {
    fn default() -> Self {
        Self {
            primary: Range::new(PRIMARY_MIN, PRIMARY_MAX),
            secondary: Range::new(SECONDARY_MIN, SECONDARY_MAX),
            flow: Range::new(FLOW_MIN, FLOW_MAX),
            violation_risk: RANGE_VIOLATION_RISK,
        }
    }
}

// ============================================================================
// THRESHOLDS
// ============================================================================

/// Category thresholds: SAFE below `warn`, CRITICAL at or above `block`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    pub warn: f64,
    pub block: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            warn: WARN_THRESHOLD,
            block: BLOCK_THRESHOLD,
        }
    }
}

// ============================================================================
// FUSION WEIGHTS
// ============================================================================

/// Raw per-detector weights. Renormalized over enabled detectors by the fusion engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub fdia: f64,
    pub physics: f64,
    pub replay: f64,
    pub spike: f64,
    pub behavior: f64,
    pub memory: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            fdia: WEIGHT_FDIA,
            physics: WEIGHT_PHYSICS,
            replay: WEIGHT_REPLAY,
            spike: WEIGHT_SPIKE,
            behavior: WEIGHT_BEHAVIOR,
            memory: WEIGHT_MEMORY,
        }
    }
}

impl FusionWeights {
    pub fn get(&self, kind: DetectorKind) -> f64 {
        match kind {
            DetectorKind::Fdia => self.fdia,
            DetectorKind::Physics => self.physics,
            DetectorKind::Replay => self.replay,
            DetectorKind::Spike => self.spike,
            DetectorKind::Behavior => self.behavior,
            DetectorKind::Memory => self.memory,
        }
    }

    pub fn set(&mut self, kind: DetectorKind, value: f64) {
        match kind {
            DetectorKind::Fdia => self.fdia = value,
            DetectorKind::Physics => self.physics = value,
            DetectorKind::Replay => self.replay = value,
            DetectorKind::Spike => self.spike = value,
            DetectorKind::Behavior => self.behavior = value,
            DetectorKind::Memory => self.memory = value,
        }
    }
}

// ============================================================================
// DETECTOR CONFIGS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub enabled: bool,
    pub window_ms: i64,
    /// Occurrences (current included) that saturate the score
    pub trigger_count: usize,
    pub float_tolerance: f64,
    /// Fixed contribution of a triggered replay
    pub contribution: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: REPLAY_WINDOW_MS,
            trigger_count: REPLAY_TRIGGER_COUNT,
            float_tolerance: REPLAY_FLOAT_TOLERANCE,
            contribution: REPLAY_CONTRIBUTION,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeConfig {
    pub enabled: bool,
    pub max_primary_delta: f64,
    pub max_secondary_delta: f64,
    pub max_flow_delta: f64,
    pub trigger: f64,
}

impl Default for SpikeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_primary_delta: SPIKE_MAX_PRIMARY_DELTA,
            max_secondary_delta: SPIKE_MAX_SECONDARY_DELTA,
            max_flow_delta: SPIKE_MAX_FLOW_DELTA,
            trigger: SPIKE_TRIGGER,
        }
    }
}

/// FDIA correlation detector
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    pub enabled: bool,
    pub min_samples: usize,
    /// r at or above this is healthy (score 0)
    pub healthy_low: f64,
    /// r at or below this saturates (score 1)
    pub floor: f64,
    pub primary_margin: f64,
    pub secondary_margin: f64,
    pub boundary_score: f64,
    pub trigger: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_samples: FDIA_MIN_SAMPLES,
            healthy_low: FDIA_HEALTHY_LOW,
            floor: FDIA_FLOOR,
            primary_margin: FDIA_PRIMARY_MARGIN,
            secondary_margin: FDIA_SECONDARY_MARGIN,
            boundary_score: FDIA_BOUNDARY_SCORE,
            trigger: FDIA_TRIGGER,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub enabled: bool,
    pub flow_tolerance: f64,
    /// Primary below this counts as de-energized
    pub dead_primary: f64,
    /// Secondary above this counts as live
    pub live_secondary: f64,
    pub max_slew_hz_per_sec: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            flow_tolerance: PHYSICS_FLOW_TOLERANCE,
            dead_primary: PHYSICS_DEAD_PRIMARY,
            live_secondary: PHYSICS_LIVE_SECONDARY,
            max_slew_hz_per_sec: PHYSICS_MAX_SLEW_HZ_PER_SEC,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub enabled: bool,
    /// Normal hours are `start <= hour < end`
    pub normal_start_hour: u32,
    pub normal_end_hour: u32,
    /// Local time offset applied before reading the hour
    pub utc_offset_minutes: i32,
    pub off_hours_score: f64,
    pub max_toggles_per_hour: usize,
    pub min_toggle_interval_ms: i64,
    pub rapid_toggle_score: f64,
    pub learn_hours: bool,
    pub hour_decay: f64,
    pub learned_share: f64,
    pub learn_min_samples: u64,
    pub trigger: f64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            normal_start_hour: BEHAVIOR_NORMAL_START_HOUR,
            normal_end_hour: BEHAVIOR_NORMAL_END_HOUR,
            utc_offset_minutes: 0,
            off_hours_score: BEHAVIOR_OFF_HOURS_SCORE,
            max_toggles_per_hour: BEHAVIOR_MAX_TOGGLES_PER_HOUR,
            min_toggle_interval_ms: BEHAVIOR_MIN_TOGGLE_INTERVAL_MS,
            rapid_toggle_score: BEHAVIOR_RAPID_TOGGLE_SCORE,
            learn_hours: false,
            hour_decay: BEHAVIOR_HOUR_DECAY,
            learned_share: BEHAVIOR_LEARNED_SHARE,
            learn_min_samples: BEHAVIOR_LEARN_MIN_SAMPLES,
            trigger: BEHAVIOR_TRIGGER,
        }
    }
}

/// Known attack feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub vector: [f64; 3],
}

impl Signature {
    pub fn new(name: impl Into<String>, vector: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            vector,
        }
    }

    /// Non-empty name, finite non-zero vector
    pub fn validate(&self) -> Result<(), ConfigError> {
        let reason = if self.name.trim().is_empty() {
            "empty name"
        } else if self.vector.iter().any(|x| !x.is_finite()) {
            "non-finite component"
        } else if self.vector.iter().all(|x| *x == 0.0) {
            "zero vector"
        } else {
            return Ok(());
        };
        Err(ConfigError::InvalidSignature {
            name: self.name.clone(),
            reason: reason.to_string(),
        })
    }

    /// Built-in signature set
    pub fn defaults() -> Vec<Signature> {
        vec![
            Signature::new("FDIA coordinated injection", [0.9, 0.9, 0.5]),
            Signature::new("Voltage manipulation", [1.0, 0.0, 0.0]),
            Signature::new("Frequency manipulation", [0.0, 1.0, 0.0]),
            Signature::new("Load redistribution", [0.0, 0.0, 1.0]),
            Signature::new("Zero-day pattern", [-0.8, -0.5, 0.8]),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub enabled: bool,
    pub primary_nominal: f64,
    pub secondary_nominal: f64,
    pub primary_scale: f64,
    pub secondary_scale: f64,
    pub flow_scale: f64,
    pub similarity_threshold: f64,
    pub min_magnitude: f64,
    pub novelty_min_samples: usize,
    pub novelty_weight: f64,
    pub trigger: f64,
    pub signatures: Vec<Signature>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            primary_nominal: MEMORY_PRIMARY_NOMINAL,
            secondary_nominal: MEMORY_SECONDARY_NOMINAL,
            primary_scale: MEMORY_PRIMARY_SCALE,
            secondary_scale: MEMORY_SECONDARY_SCALE,
            flow_scale: MEMORY_FLOW_SCALE,
            similarity_threshold: MEMORY_SIMILARITY_THRESHOLD,
            min_magnitude: MEMORY_MIN_MAGNITUDE,
            novelty_min_samples: MEMORY_NOVELTY_MIN_SAMPLES,
            novelty_weight: MEMORY_NOVELTY_WEIGHT,
            trigger: MEMORY_TRIGGER,
            signatures: Signature::defaults(),
        }
    }
}

/// Per-detector settings; each can be switched off individually
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorsConfig {
    pub replay: ReplayConfig,
    pub spike: SpikeConfig,
    pub correlation: CorrelationConfig,
    pub physics: PhysicsConfig,
    pub behavior: BehaviorConfig,
    pub memory: MemoryConfig,
}

impl DetectorsConfig {
    pub fn is_enabled(&self, kind: DetectorKind) -> bool {
        match kind {
            DetectorKind::Fdia => self.correlation.enabled,
            DetectorKind::Physics => self.physics.enabled,
            DetectorKind::Replay => self.replay.enabled,
            DetectorKind::Spike => self.spike.enabled,
            DetectorKind::Behavior => self.behavior.enabled,
            DetectorKind::Memory => self.memory.enabled,
        }
    }

    pub fn enabled_kinds(&self) -> Vec<DetectorKind> {
        DetectorKind::ALL
            .into_iter()
            .filter(|k| self.is_enabled(*k))
            .collect()
    }
}

// ============================================================================
// GATEWAY CONFIG
// ============================================================================

/// Root configuration (can be loaded from a JSON file)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub ranges: RangesConfig,
    pub thresholds: ThresholdsConfig,
    pub weights: FusionWeights,
    /// Capacity of every per-source history window
    pub history_capacity: usize,
    pub detectors: DetectorsConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ranges: RangesConfig::default(),
            thresholds: ThresholdsConfig::default(),
            weights: FusionWeights::default(),
            history_capacity: HISTORY_CAPACITY,
            detectors: DetectorsConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Strict mode - lower thresholds, replay saturates on the first repeat
    pub fn strict() -> Self {
        let mut config = Self::default();
        config.thresholds = ThresholdsConfig {
            warn: 0.20,
            block: 0.50,
        };
        config.detectors.replay.trigger_count = 2;
        config
    }

    /// Rules only - every stateful detector off, fusion is range checks alone
    pub fn rules_only() -> Self {
        let mut config = Self::default();
        config.detectors.replay.enabled = false;
        config.detectors.spike.enabled = false;
        config.detectors.correlation.enabled = false;
        config.detectors.physics.enabled = false;
        config.detectors.behavior.enabled = false;
        config.detectors.memory.enabled = false;
        config
    }

    /// Reject inconsistent settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ranges.primary.validate("primary_value")?;
        self.ranges.secondary.validate("secondary_value")?;
        self.ranges.flow.validate("derived_flow")?;
        unit("ranges.violation_risk", self.ranges.violation_risk)?;

        let t = self.thresholds;
        unit("thresholds.warn", t.warn)?;
        unit("thresholds.block", t.block)?;
        if t.warn >= t.block {
            return Err(ConfigError::ThresholdOrder {
                warn: t.warn,
                block: t.block,
            });
        }

        for kind in DetectorKind::ALL {
            let w = self.weights.get(kind);
            if !w.is_finite() || !(0.0..=1.0).contains(&w) {
                return Err(ConfigError::InvalidWeight {
                    detector: kind.as_str(),
                    value: w,
                });
            }
        }
        // Rules-only is valid: no detectors means no weighted term at all.
        let enabled = self.detectors.enabled_kinds();
        let mass: f64 = enabled.iter().map(|k| self.weights.get(*k)).sum();
        if !enabled.is_empty() && mass <= 0.0 {
            return Err(ConfigError::ZeroWeightMass);
        }

        if self.history_capacity == 0 {
            return Err(ConfigError::param("history_capacity", "must be > 0"));
        }

        self.validate_detectors()
    }

    fn validate_detectors(&self) -> Result<(), ConfigError> {
        let d = &self.detectors;

        if d.replay.window_ms <= 0 {
            return Err(ConfigError::param("replay.window_ms", "must be > 0"));
        }
        if d.replay.trigger_count < 2 {
            return Err(ConfigError::param("replay.trigger_count", "must be >= 2"));
        }
        if !d.replay.float_tolerance.is_finite() || d.replay.float_tolerance < 0.0 {
            return Err(ConfigError::param("replay.float_tolerance", "must be finite and >= 0"));
        }
        unit("replay.contribution", d.replay.contribution)?;

        positive("spike.max_primary_delta", d.spike.max_primary_delta)?;
        positive("spike.max_secondary_delta", d.spike.max_secondary_delta)?;
        positive("spike.max_flow_delta", d.spike.max_flow_delta)?;
        unit("spike.trigger", d.spike.trigger)?;

        let c = &d.correlation;
        if c.min_samples < 2 {
            return Err(ConfigError::param("correlation.min_samples", "must be >= 2"));
        }
        if !(c.floor < c.healthy_low) || c.floor < -1.0 || c.healthy_low > 1.0 {
            return Err(ConfigError::param(
                "correlation.floor",
                "must satisfy -1 <= floor < healthy_low <= 1",
            ));
        }
        unit("correlation.boundary_score", c.boundary_score)?;
        unit("correlation.trigger", c.trigger)?;

        positive("physics.max_slew_hz_per_sec", d.physics.max_slew_hz_per_sec)?;

        let b = &d.behavior;
        if b.normal_start_hour > 23 || b.normal_end_hour > 24 || b.normal_start_hour >= b.normal_end_hour {
            return Err(ConfigError::param(
                "behavior.normal_hours",
                "must satisfy start < end <= 24",
            ));
        }
        if b.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::param("behavior.utc_offset_minutes", "must be within one day"));
        }
        if b.max_toggles_per_hour == 0 {
            return Err(ConfigError::param("behavior.max_toggles_per_hour", "must be > 0"));
        }
        // The toggle window holds history_capacity entries; it must be able
        // to hold one toggle past the limit.
        if b.max_toggles_per_hour >= self.history_capacity {
            return Err(ConfigError::param(
                "behavior.max_toggles_per_hour",
                format!("must be < history_capacity ({})", self.history_capacity),
            ));
        }
        unit("behavior.off_hours_score", b.off_hours_score)?;
        unit("behavior.rapid_toggle_score", b.rapid_toggle_score)?;
        unit("behavior.hour_decay", b.hour_decay)?;
        unit("behavior.learned_share", b.learned_share)?;
        unit("behavior.trigger", b.trigger)?;

        let m = &d.memory;
        positive("memory.primary_scale", m.primary_scale)?;
        positive("memory.secondary_scale", m.secondary_scale)?;
        positive("memory.flow_scale", m.flow_scale)?;
        unit("memory.similarity_threshold", m.similarity_threshold)?;
        unit("memory.novelty_weight", m.novelty_weight)?;
        unit("memory.trigger", m.trigger)?;
        for sig in &m.signatures {
            sig.validate()?;
        }

        Ok(())
    }
}

fn unit(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::param(name, "must be finite and > 0"))
    }
}

// ============================================================================
// TESTS
// ============================================================================
