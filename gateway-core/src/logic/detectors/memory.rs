//! Memory / Similarity Detector
//!
//! Compares the command's deviation-from-nominal vector against known
//! attack signatures (cosine similarity) and against the centroid of what
//! this source has recently sent (novelty).

use std::sync::Arc;

use parking_lot::RwLock;

use super::types::{DetectorKind, DetectorScore};
use super::Detector;
use crate::logic::command::Command;
use crate::logic::config::{MemoryConfig, Signature};
use crate::logic::error::ConfigError;
use crate::logic::history::HistoryWindow;
use crate::logic::state::SourceState;

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// `[primary, secondary, flow]` deviation from nominal, scaled
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; 3]);

impl FeatureVector {
    pub fn from_command(command: &Command, config: &MemoryConfig) -> Self {
        Self([
            (command.primary_value() - config.primary_nominal) / config.primary_scale,
            (command.secondary_value() - config.secondary_nominal) / config.secondary_scale,
            command.flow_or_zero() / config.flow_scale,
        ])
    }

    pub fn magnitude(&self) -> f64 {
        self.0.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    pub fn dot(&self, other: &FeatureVector) -> f64 {
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }

    /// Cosine similarity, 0.0 if either vector is zero
    pub fn cosine(&self, other: &FeatureVector) -> f64 {
        let denom = self.magnitude() * other.magnitude();
        if denom <= f64::EPSILON {
            return 0.0;
        }
        (self.dot(other) / denom).clamp(-1.0, 1.0)
    }

    pub fn centroid<'a, I>(vectors: I) -> Option<FeatureVector>
    where
        I: IntoIterator<Item = &'a FeatureVector>,
    {
        let mut sum = [0.0; 3];
        let mut n = 0usize;
        for v in vectors {
            for (acc, x) in sum.iter_mut().zip(v.0.iter()) {
                *acc += x;
            }
            n += 1;
        }
        if n == 0 {
            return None;
        }
        Some(FeatureVector(sum.map(|x| x / n as f64)))
    }
}

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone)]
pub struct MemoryState {
    pub vectors: HistoryWindow<FeatureVector>,
}

impl MemoryState {
    pub fn new(capacity: usize) -> Self {
        Self {
            vectors: HistoryWindow::new(capacity),
        }
    }
}

// ============================================================================
// DETECTOR
// ============================================================================

/// Attack signatures, shared between the engine and the memory detector.
/// The request path only reads; `add` takes the write lock.
#[derive(Debug, Default)]
pub struct SignatureSet {
    entries: RwLock<Vec<(String, FeatureVector)>>,
}

impl SignatureSet {
    pub fn from_config(config: &MemoryConfig) -> Self {
        let entries = config
            .signatures
            .iter()
            .map(|s| (s.name.clone(), FeatureVector(s.vector)))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Add a signature, replacing one with the same name
    pub fn add(&self, signature: &Signature) -> Result<(), ConfigError> {
        signature.validate()?;
        let vector = FeatureVector(signature.vector);
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|(name, _)| *name == signature.name) {
            Some(entry) => entry.1 = vector,
            None => entries.push((signature.name.clone(), vector)),
        }
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.read().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Most similar signature at or above `threshold`
    pub fn best_match(&self, v: &FeatureVector, threshold: f64) -> Option<(String, f64)> {
        let entries = self.entries.read();
        let mut best: Option<(&str, f64)> = None;
        for (name, sig) in entries.iter() {
            let sim = v.cosine(sig);
            if sim >= threshold && best.map_or(true, |(_, b)| sim > b) {
                best = Some((name.as_str(), sim));
            }
        }
        best.map(|(name, sim)| (name.to_string(), sim))
    }
}

pub struct MemoryDetector {
    config: MemoryConfig,
    signatures: Arc<SignatureSet>,
}

impl MemoryDetector {
    pub fn new(config: MemoryConfig) -> Self {
        let signatures = Arc::new(SignatureSet::from_config(&config));
        Self::with_signatures(config, signatures)
    }

    pub fn with_signatures(config: MemoryConfig, signatures: Arc<SignatureSet>) -> Self {
        Self { config, signatures }
    }

    fn novelty(&self, v: &FeatureVector, state: &MemoryState) -> Option<f64> {
        if state.vectors.len() < self.config.novelty_min_samples {
            return None;
        }
        let centroid = FeatureVector::centroid(state.vectors.iter())?;
        let sim = if centroid.magnitude() < self.config.min_magnitude {
            0.0
        } else {
            v.cosine(&centroid)
        };
        Some(self.config.novelty_weight * (1.0 - sim.max(0.0)))
    }
}

impl Detector for MemoryDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Memory
    }

    fn score(&self, command: &Command, state: &SourceState) -> DetectorScore {
        let v = FeatureVector::from_command(command, &self.config);
        if v.magnitude() < self.config.min_magnitude {
            return DetectorScore::clear(DetectorKind::Memory, "Near nominal operating point");
        }

        let signature = self.signatures.best_match(&v, self.config.similarity_threshold);
        let novelty = self.novelty(&v, &state.memory).unwrap_or(0.0);

        match signature {
            Some((name, sim)) if sim >= novelty => DetectorScore::new(
                DetectorKind::Memory,
                sim,
                self.config.trigger,
                format!("Matches known attack pattern '{}' (similarity {:.2})", name, sim),
            ),
            _ if novelty > 0.0 => DetectorScore::new(
                DetectorKind::Memory,
                novelty,
                self.config.trigger,
                format!("Novel pattern for this source (novelty {:.2})", novelty),
            ),
            _ => DetectorScore::clear(DetectorKind::Memory, "No known attack pattern matched"),
        }
    }

    fn observe(&self, command: &Command, _accepted: bool, state: &mut SourceState) {
        state
            .memory
            .vectors
            .push(FeatureVector::from_command(command, &self.config));
    }
}

// ============================================================================
// TESTS
// ============================================================================
