//! Per-Source State
//!
//! `SourceState` bundles every detector's rolling state for one source.
//! `SourceRegistry` maps source ids to lock-protected states: sources run in
//! parallel, commands from one source are serialized by its own mutex.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use super::command::ActuatorState;
use super::detectors::behavior::BehaviorState;
use super::detectors::correlation::{pearson, CorrelationState};
use super::detectors::memory::{FeatureVector, MemoryState};
use super::detectors::physics::PhysicsState;
use super::detectors::replay::ReplayState;
use super::detectors::spike::SpikeState;

// ============================================================================
// SOURCE STATE
// ============================================================================

/// Rolling state of one source. Each field has exactly one writer: the
/// matching detector's `observe`.
#[derive(Debug, Clone)]
pub struct SourceState {
    pub replay: ReplayState,
    pub spike: SpikeState,
    pub correlation: CorrelationState,
    pub physics: PhysicsState,
    pub behavior: BehaviorState,
    pub memory: MemoryState,
    last_seen: Option<DateTime<Utc>>,
    commands_seen: u64,
}

impl SourceState {
    pub fn new(capacity: usize) -> Self {
        Self {
            replay: ReplayState::new(capacity),
            spike: SpikeState::default(),
            correlation: CorrelationState::new(capacity),
            physics: PhysicsState::default(),
            behavior: BehaviorState::new(capacity),
            memory: MemoryState::new(capacity),
            last_seen: None,
            commands_seen: 0,
        }
    }

    /// Record that a command from this source was fully processed
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_seen = Some(match self.last_seen {
            Some(prev) if prev > at => prev,
            _ => at,
        });
        self.commands_seen += 1;
    }

    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    pub fn commands_seen(&self) -> u64 {
        self.commands_seen
    }

    /// Summary of the rolling state, relative to the last processed command
    pub fn profile(&self, source_id: &str) -> SourceProfile {
        let samples: Vec<(f64, f64)> = self.correlation.samples.iter().copied().collect();
        let b = &self.behavior;

        SourceProfile {
            source_id: source_id.to_string(),
            commands_seen: self.commands_seen,
            last_seen: self.last_seen,
            last_accepted_state: b.last_accepted_state,
            toggles_last_hour: self.last_seen.map_or(0, |at| b.toggles_in_window(at)),
            peak_hour: b.hours.peak_hour(),
            hour_samples: b.hours.samples(),
            correlation_samples: samples.len(),
            correlation: pearson(&samples),
            memory_vectors: self.memory.vectors.len(),
            memory_centroid: FeatureVector::centroid(self.memory.vectors.iter()).map(|v| v.0),
        }
    }
}

/// Read-only view of one source's behavior and memory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceProfile {
    pub source_id: String,
    pub commands_seen: u64,
    pub last_seen: Option<DateTime<Utc>>,
    pub last_accepted_state: Option<ActuatorState>,
    pub toggles_last_hour: usize,
    /// Learned busiest hour, in the behavior detector's offset
    pub peak_hour: Option<u32>,
    pub hour_samples: u64,
    pub correlation_samples: usize,
    /// Pearson r over the accepted samples, None below two samples
    pub correlation: Option<f64>,
    pub memory_vectors: usize,
    pub memory_centroid: Option<[f64; 3]>,
}

// ============================================================================
// SOURCE REGISTRY
// ============================================================================

pub struct SourceRegistry {
    sources: RwLock<HashMap<String, Arc<Mutex<SourceState>>>>,
    capacity: usize,
}

impl SourceRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            sources: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// State handle for a source, created lazily on first use
    pub fn get_or_create(&self, source_id: &str) -> Arc<Mutex<SourceState>> {
        if let Some(state) = self.sources.read().get(source_id) {
            return Arc::clone(state);
        }

        let mut sources = self.sources.write();
        let state = sources
            .entry(source_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(SourceState::new(self.capacity))));
        Arc::clone(state)
    }

    pub fn get(&self, source_id: &str) -> Option<Arc<Mutex<SourceState>>> {
        self.sources.read().get(source_id).cloned()
    }

    /// Profile of a known source; takes the source lock briefly
    pub fn profile(&self, source_id: &str) -> Option<SourceProfile> {
        let state = self.get(source_id)?;
        let guard = state.lock();
        Some(guard.profile(source_id))
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.sources.read().contains_key(source_id)
    }

    pub fn len(&self) -> usize {
        self.sources.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.read().is_empty()
    }

    pub fn source_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sources.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Remove sources idle for longer than `max_idle`. Returns how many
    /// were dropped.
    ///
    /// A source is kept while any handle to it lives outside the map (a
    /// command is between `get_or_create` and `touch`), while its lock is
    /// held, and while it has never been touched. Handles are only cloned
    /// under the map lock, so the count cannot grow during the sweep.
    pub fn evict_idle(&self, now: DateTime<Utc>, max_idle: Duration) -> usize {
        let mut sources = self.sources.write();
        let before = sources.len();
        sources.retain(|_, state| {
            if Arc::strong_count(state) > 1 {
                return true;
            }
            match state.try_lock() {
                Some(guard) => match guard.last_seen() {
                    Some(seen) => now - seen <= max_idle,
                    None => true,
                },
                None => true,
            }
        });
        before - sources.len()
    }

    pub fn clear(&self) {
        self.sources.write().clear();
    }
}
