//! Normalized Fusion Weights
//!
//! Raw weights from config, renormalized over the enabled detectors so
//! they always sum to 1.

use crate::logic::config::FusionWeights;
use crate::logic::detectors::DetectorKind;
use crate::logic::error::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedWeights {
    entries: Vec<(DetectorKind, f64)>,
}

impl NormalizedWeights {
    /// Fails when the enabled detectors carry no weight at all.
    /// An empty `enabled` set is allowed and yields no weights.
    pub fn new(raw: &FusionWeights, enabled: &[DetectorKind]) -> Result<Self, ConfigError> {
        for kind in enabled {
            let w = raw.get(*kind);
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    detector: kind.as_str(),
                    value: w,
                });
            }
        }

        let total: f64 = enabled.iter().map(|k| raw.get(*k)).sum();
        if enabled.is_empty() {
            return Ok(Self { entries: vec![] });
        }
        if total <= 0.0 {
            return Err(ConfigError::ZeroWeightMass);
        }

        let mut entries: Vec<(DetectorKind, f64)> = enabled
            .iter()
            .map(|k| (*k, raw.get(*k) / total))
            .collect();
        entries.sort_by_key(|(k, _)| k.priority());
        entries.dedup_by_key(|(k, _)| *k);
        Ok(Self { entries })
    }

    /// Normalized weight, 0.0 for a disabled detector
    pub fn get(&self, kind: DetectorKind) -> f64 {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(DetectorKind, f64)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
