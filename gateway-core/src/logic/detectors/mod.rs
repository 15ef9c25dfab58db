//! Detectors Module
//!
//! Independent risk detectors. Each one scores one aspect of a command
//! against the source's rolling state, then observes the outcome.
//! Thresholding into categories is NOT done here - see `fusion`/`decision`.
//!
//! ## Structure
//! - `types`: DetectorKind, DetectorScore
//! - `replay`: identical commands in a short window
//! - `spike`: step change against the last accepted value
//! - `correlation`: FDIA, primary/secondary correlation
//! - `physics`: absolute physical invariants
//! - `behavior`: timing and toggle profile
//! - `memory`: attack signatures and novelty

pub mod behavior;
pub mod correlation;
pub mod memory;
pub mod physics;
pub mod replay;
pub mod spike;
pub mod types;

pub use behavior::BehaviorDetector;
pub use correlation::CorrelationDetector;
pub use memory::{FeatureVector, MemoryDetector, SignatureSet};
pub use physics::PhysicsDetector;
pub use replay::ReplayDetector;
pub use spike::SpikeDetector;
pub use types::{DetectorKind, DetectorScore};

use std::sync::Arc;

use crate::logic::command::Command;
use crate::logic::config::GatewayConfig;
use crate::logic::state::SourceState;

// ============================================================================
// DETECTOR TRAIT
// ============================================================================

/// One risk detector.
///
/// `score` must not mutate anything; `observe` is the only writer of the
/// detector's slice of `SourceState`.
pub trait Detector: Send + Sync {
    fn kind(&self) -> DetectorKind;
    fn score(&self, command: &Command, state: &SourceState) -> DetectorScore;
    fn observe(&self, command: &Command, accepted: bool, state: &mut SourceState);
}

/// Enabled detectors, highest priority first. The memory detector reads
/// `signatures`, so signatures added later are seen on the next command.
pub fn build_detectors(config: &GatewayConfig, signatures: &Arc<SignatureSet>) -> Vec<Box<dyn Detector>> {
    let d = &config.detectors;
    let mut detectors: Vec<Box<dyn Detector>> = Vec::new();

    if d.correlation.enabled {
        detectors.push(Box::new(CorrelationDetector::new(
            d.correlation.clone(),
            config.ranges.primary,
            config.ranges.secondary,
        )));
    }
    if d.physics.enabled {
        detectors.push(Box::new(PhysicsDetector::new(d.physics.clone())));
    }
    if d.replay.enabled {
        detectors.push(Box::new(ReplayDetector::new(d.replay.clone())));
    }
    if d.spike.enabled {
        detectors.push(Box::new(SpikeDetector::new(d.spike.clone())));
    }
    if d.behavior.enabled {
        detectors.push(Box::new(BehaviorDetector::new(d.behavior.clone())));
    }
    if d.memory.enabled {
        detectors.push(Box::new(MemoryDetector::with_signatures(
            d.memory.clone(),
            Arc::clone(signatures),
        )));
    }

    detectors
}
