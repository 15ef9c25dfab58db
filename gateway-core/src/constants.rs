//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every `Default` impl in `logic::config` reads from here.

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "GridGuard";

// ============================================================================
// SAFE OPERATING RANGES (closed intervals)
// ============================================================================

/// Voltage range (per unit)
pub const PRIMARY_MIN: f64 = 0.90;
pub const PRIMARY_MAX: f64 = 1.10;

/// Frequency range (Hz)
pub const SECONDARY_MIN: f64 = 49.0;
pub const SECONDARY_MAX: f64 = 51.0;

/// Power flow range (MW)
pub const FLOW_MIN: f64 = 0.0;
pub const FLOW_MAX: f64 = 200.0;

/// Fixed risk of a range violation
pub const RANGE_VIOLATION_RISK: f64 = 0.80;

// ============================================================================
// DECISION THRESHOLDS
// ============================================================================

/// Risk below this = SAFE
pub const WARN_THRESHOLD: f64 = 0.30;

/// Risk at or above this = CRITICAL
pub const BLOCK_THRESHOLD: f64 = 0.60;

// ============================================================================
// FUSION WEIGHTS (priority order, sum = 1.0)
// ============================================================================

pub const WEIGHT_FDIA: f64 = 0.28;
pub const WEIGHT_PHYSICS: f64 = 0.25;
pub const WEIGHT_REPLAY: f64 = 0.17;
pub const WEIGHT_SPIKE: f64 = 0.12;
pub const WEIGHT_BEHAVIOR: f64 = 0.10;
pub const WEIGHT_MEMORY: f64 = 0.08;

// ============================================================================
// HISTORY
// ============================================================================

/// Per-source history capacity
pub const HISTORY_CAPACITY: usize = 100;

// ============================================================================
// REPLAY
// ============================================================================

pub const REPLAY_WINDOW_MS: i64 = 5_000;
pub const REPLAY_TRIGGER_COUNT: usize = 3;
pub const REPLAY_FLOAT_TOLERANCE: f64 = 1e-9;
pub const REPLAY_CONTRIBUTION: f64 = 0.90;

// ============================================================================
// SPIKE
// ============================================================================

pub const SPIKE_MAX_PRIMARY_DELTA: f64 = 0.15;
pub const SPIKE_MAX_SECONDARY_DELTA: f64 = 1.0;
pub const SPIKE_MAX_FLOW_DELTA: f64 = 50.0;
pub const SPIKE_TRIGGER: f64 = 0.5;

// ============================================================================
// CORRELATION (FDIA)
// ============================================================================

pub const FDIA_MIN_SAMPLES: usize = 5;
pub const FDIA_HEALTHY_LOW: f64 = 0.8;
pub const FDIA_FLOOR: f64 = 0.3;
pub const FDIA_PRIMARY_MARGIN: f64 = 0.01;
pub const FDIA_SECONDARY_MARGIN: f64 = 0.1;
/// Boundary heuristic score. Together with a full memory match and the
/// off-hours score it must stay below WARN_THRESHOLD for a fresh source.
pub const FDIA_BOUNDARY_SCORE: f64 = 0.60;
pub const FDIA_TRIGGER: f64 = 0.5;

// ============================================================================
// PHYSICS
// ============================================================================

pub const PHYSICS_FLOW_TOLERANCE: f64 = 0.01;
pub const PHYSICS_DEAD_PRIMARY: f64 = 0.01;
pub const PHYSICS_LIVE_SECONDARY: f64 = 1.0;
pub const PHYSICS_MAX_SLEW_HZ_PER_SEC: f64 = 2.0;

// ============================================================================
// BEHAVIOR
// ============================================================================

pub const BEHAVIOR_NORMAL_START_HOUR: u32 = 6;
pub const BEHAVIOR_NORMAL_END_HOUR: u32 = 22;
pub const BEHAVIOR_OFF_HOURS_SCORE: f64 = 0.4;
pub const BEHAVIOR_MAX_TOGGLES_PER_HOUR: usize = 10;
pub const BEHAVIOR_MIN_TOGGLE_INTERVAL_MS: i64 = 5_000;
pub const BEHAVIOR_RAPID_TOGGLE_SCORE: f64 = 0.3;
pub const BEHAVIOR_HOUR_DECAY: f64 = 0.98;
pub const BEHAVIOR_LEARNED_SHARE: f64 = 0.05;
pub const BEHAVIOR_LEARN_MIN_SAMPLES: u64 = 50;
pub const BEHAVIOR_TRIGGER: f64 = 0.5;

// ============================================================================
// MEMORY / SIMILARITY
// ============================================================================

pub const MEMORY_PRIMARY_NOMINAL: f64 = 1.0;
pub const MEMORY_SECONDARY_NOMINAL: f64 = 50.0;
pub const MEMORY_PRIMARY_SCALE: f64 = 0.1;
pub const MEMORY_SECONDARY_SCALE: f64 = 1.0;
pub const MEMORY_FLOW_SCALE: f64 = 100.0;
pub const MEMORY_SIMILARITY_THRESHOLD: f64 = 0.85;
pub const MEMORY_MIN_MAGNITUDE: f64 = 0.5;
pub const MEMORY_NOVELTY_MIN_SAMPLES: usize = 10;
pub const MEMORY_NOVELTY_WEIGHT: f64 = 0.5;
pub const MEMORY_TRIGGER: f64 = 0.5;
