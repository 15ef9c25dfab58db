//! Behavior Profiler
//!
//! Operator timing profile: off-hours operation, excessive actuator
//! toggling within an hour, and toggles fired right after the previous
//! command. Optionally learns which hours are normal for a source.

use chrono::{DateTime, Duration, FixedOffset, Timelike, Utc};

use super::types::{DetectorKind, DetectorScore};
use super::Detector;
use crate::logic::command::{ActuatorState, Command};
use crate::logic::config::BehaviorConfig;
use crate::logic::history::HistoryWindow;
use crate::logic::state::SourceState;

const TOGGLE_WINDOW_SECS: i64 = 3600;

// ============================================================================
// HOUR PROFILE
// ============================================================================

/// Exponentially decayed per-hour activity histogram
#[derive(Debug, Clone, PartialEq)]
pub struct HourProfile {
    weights: [f64; 24],
    samples: u64,
}

impl Default for HourProfile {
    fn default() -> Self {
        Self {
            weights: [0.0; 24],
            samples: 0,
        }
    }
}

impl HourProfile {
    pub fn record(&mut self, hour: u32, decay: f64) {
        for w in self.weights.iter_mut() {
            *w *= decay;
        }
        self.weights[(hour % 24) as usize] += 1.0;
        self.samples += 1;
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Hour carrying the most recent activity
    pub fn peak_hour(&self) -> Option<u32> {
        if self.samples == 0 {
            return None;
        }
        let mut peak = 0;
        for (hour, w) in self.weights.iter().enumerate() {
            if *w > self.weights[peak] {
                peak = hour;
            }
        }
        Some(peak as u32)
    }

    /// Share of recent activity that fell in `hour`
    pub fn share(&self, hour: u32) -> f64 {
        let total: f64 = self.weights.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }
        self.weights[(hour % 24) as usize] / total
    }

    pub fn is_learned(&self, hour: u32, min_samples: u64, min_share: f64) -> bool {
        self.samples >= min_samples && self.share(hour) >= min_share
    }
}

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone)]
pub struct BehaviorState {
    pub timestamps: HistoryWindow<DateTime<Utc>>,
    /// Toggle times within the trailing hour
    pub toggles: HistoryWindow<DateTime<Utc>>,
    pub last_accepted_state: Option<ActuatorState>,
    pub hours: HourProfile,
}

impl BehaviorState {
    pub fn new(capacity: usize) -> Self {
        Self {
            timestamps: HistoryWindow::new(capacity),
            toggles: HistoryWindow::new(capacity),
            last_accepted_state: None,
            hours: HourProfile::default(),
        }
    }

    fn is_toggle(&self, command: &Command) -> bool {
        self.last_accepted_state
            .map_or(false, |prev| prev != command.actuator_state())
    }

    /// Toggles in `(now - 1h, now]`
    pub fn toggles_in_window(&self, now: DateTime<Utc>) -> usize {
        let start = now - Duration::seconds(TOGGLE_WINDOW_SECS);
        self.toggles.iter().filter(|t| **t > start && **t <= now).count()
    }
}

// ============================================================================
// DETECTOR
// ============================================================================

pub struct BehaviorDetector {
    config: BehaviorConfig,
}

impl BehaviorDetector {
    pub fn new(config: BehaviorConfig) -> Self {
        Self { config }
    }

    /// Hour of day in the configured local offset
    pub fn local_hour(&self, at: DateTime<Utc>) -> u32 {
        match FixedOffset::east_opt(self.config.utc_offset_minutes * 60) {
            Some(offset) => at.with_timezone(&offset).hour(),
            None => at.hour(),
        }
    }

    fn in_normal_hours(&self, hour: u32) -> bool {
        hour >= self.config.normal_start_hour && hour < self.config.normal_end_hour
    }
}

impl Detector for BehaviorDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Behavior
    }

    fn score(&self, command: &Command, state: &SourceState) -> DetectorScore {
        let b = &state.behavior;
        let now = command.received_at();
        let mut total = 0.0;
        let mut reasons = Vec::new();

        let hour = self.local_hour(now);
        let learned = self.config.learn_hours
            && b.hours.is_learned(hour, self.config.learn_min_samples, self.config.learned_share);
        if !self.in_normal_hours(hour) && !learned {
            total += self.config.off_hours_score;
            reasons.push(format!("Operation during off-hours ({:02}:00)", hour));
        }

        let toggle = b.is_toggle(command);
        let toggles = b.toggles_in_window(now) + usize::from(toggle);
        let max = self.config.max_toggles_per_hour;
        if toggles > max {
            total += ((toggles - max) as f64 / max as f64).min(1.0);
            reasons.push(format!("Excessive actuator toggling ({} toggles in 1 hour)", toggles));
        }

        if toggle {
            if let Some(prev) = b.timestamps.last() {
                let gap = (now - *prev).num_milliseconds();
                if gap >= 0 && gap < self.config.min_toggle_interval_ms {
                    total += self.config.rapid_toggle_score;
                    reasons.push(format!("Rapid toggle {} ms after previous command", gap));
                }
            }
        }

        if reasons.is_empty() {
            return DetectorScore::clear(DetectorKind::Behavior, "Normal operator behavior pattern");
        }
        let reason = if reasons.len() > 1 {
            format!("{} (+{} more anomalies)", reasons[0], reasons.len() - 1)
        } else {
            reasons.remove(0)
        };
        DetectorScore::new(DetectorKind::Behavior, total, self.config.trigger, reason)
    }

    fn observe(&self, command: &Command, accepted: bool, state: &mut SourceState) {
        let now = command.received_at();
        let b = &mut state.behavior;

        // Attempted toggles count toward the hourly limit even when blocked
        if b.is_toggle(command) {
            b.toggles.push(now);
        }
        let start = now - Duration::seconds(TOGGLE_WINDOW_SECS);
        b.toggles.prune_front(|t| *t <= start);
        b.timestamps.push(now);

        if accepted {
            b.last_accepted_state = Some(command.actuator_state());
            if self.config.learn_hours {
                let hour = self.local_hour(now);
                b.hours.record(hour, self.config.hour_decay);
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
