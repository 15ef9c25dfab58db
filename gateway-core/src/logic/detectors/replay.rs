//! Replay Detector
//!
//! Counts field-wise identical commands from the same source in a short
//! trailing window. The score ramps linearly and saturates at the trigger
//! count; a saturated replay also raises a HIGH violation.

use chrono::{DateTime, Duration, Utc};

use super::types::{DetectorKind, DetectorScore};
use super::Detector;
use crate::logic::command::{ActuatorState, Command};
use crate::logic::config::ReplayConfig;
use crate::logic::history::HistoryWindow;
use crate::logic::state::SourceState;
use crate::logic::validation::Violation;

/// One remembered command
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayEntry {
    pub actuator_state: ActuatorState,
    pub primary_value: f64,
    pub secondary_value: f64,
    pub flow: f64,
    pub at: DateTime<Utc>,
}

impl ReplayEntry {
    fn from_command(command: &Command) -> Self {
        Self {
            actuator_state: command.actuator_state(),
            primary_value: command.primary_value(),
            secondary_value: command.secondary_value(),
            flow: command.flow_or_zero(),
            at: command.received_at(),
        }
    }

    fn matches(&self, command: &Command, tolerance: f64) -> bool {
        self.actuator_state == command.actuator_state()
            && (self.primary_value - command.primary_value()).abs() <= tolerance
            && (self.secondary_value - command.secondary_value()).abs() <= tolerance
            && (self.flow - command.flow_or_zero()).abs() <= tolerance
    }
}

#[derive(Debug, Clone)]
pub struct ReplayState {
    pub history: HistoryWindow<ReplayEntry>,
}

impl ReplayState {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: HistoryWindow::new(capacity),
        }
    }
}

pub struct ReplayDetector {
    config: ReplayConfig,
}

impl ReplayDetector {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }

    /// Occurrences in the trailing window, the current command included
    pub fn count_matches(&self, command: &Command, state: &ReplayState) -> usize {
        let now = command.received_at();
        let window = Duration::milliseconds(self.config.window_ms);
        let earlier = state
            .history
            .iter()
            .filter(|e| e.at <= now && now - e.at <= window)
            .filter(|e| e.matches(command, self.config.float_tolerance))
            .count();
        earlier + 1
    }

    fn window_secs(&self) -> f64 {
        self.config.window_ms as f64 / 1000.0
    }
}

impl Detector for ReplayDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Replay
    }

    fn score(&self, command: &Command, state: &SourceState) -> DetectorScore {
        let count = self.count_matches(command, &state.replay);
        if count <= 1 {
            return DetectorScore::clear(DetectorKind::Replay, "No repeated command in window");
        }

        let span = (self.config.trigger_count - 1) as f64;
        let score = ((count - 1) as f64 / span).clamp(0.0, 1.0);
        // Saturation is the trigger: score is exactly 1.0 at trigger_count.
        let result = DetectorScore::new(
            DetectorKind::Replay,
            score,
            1.0,
            format!(
                "Replay attack detected: {} identical commands within {}s window",
                count,
                self.window_secs()
            ),
        );

        if result.triggered {
            let violation = Violation::high("replay", result.reason.clone(), self.config.contribution);
            result.with_violation(violation)
        } else {
            result
        }
    }

    fn observe(&self, command: &Command, _accepted: bool, state: &mut SourceState) {
        state.replay.history.push(ReplayEntry::from_command(command));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_ms(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_040_000_000 + ms).unwrap()
    }

    fn cmd(ms: i64) -> Command {
        Command::new("op-1", ActuatorState::On, 1.0, 50.0, at_ms(ms))
    }

    #[test]
    fn test_ramp_and_trigger() {
        let detector = ReplayDetector::new(ReplayConfig::default());
        let mut state = SourceState::new(100);

        let first = detector.score(&cmd(0), &state);
        assert_eq!(first.score, 0.0);
        detector.observe(&cmd(0), true, &mut state);

        let second = detector.score(&cmd(500), &state);
        assert_eq!(second.score, 0.5);
        assert!(!second.triggered);
        assert!(second.violation.is_none());
        detector.observe(&cmd(500), true, &mut state);

        let third = detector.score(&cmd(1000), &state);
        assert_eq!(third.score, 1.0);
        assert!(third.triggered);
        assert!(third.reason.contains("3 identical"));
        assert!(third.reason.contains("5s"));
        assert_eq!(third.violation.map(|v| v.contribution), Some(0.90));
    }

    #[test]
    fn test_window_expiry() {
        let detector = ReplayDetector::new(ReplayConfig::default());
        let mut state = SourceState::new(100);
        detector.observe(&cmd(0), true, &mut state);
        detector.observe(&cmd(100), true, &mut state);

        assert_eq!(detector.count_matches(&cmd(5_000), &state.replay), 3);
        assert_eq!(detector.count_matches(&cmd(5_050), &state.replay), 2);
        assert_eq!(detector.count_matches(&cmd(20_000), &state.replay), 1);
    }

    #[test]
    fn test_different_fields_do_not_match() {
        let detector = ReplayDetector::new(ReplayConfig::default());
        let mut state = SourceState::new(100);
        detector.observe(&cmd(0), false, &mut state);

        let other = Command::new("op-1", ActuatorState::On, 1.0 + 1e-6, 50.0, at_ms(10));
        assert_eq!(detector.count_matches(&other, &state.replay), 1);
        let flowing = cmd(10).with_flow(3.0);
        assert_eq!(detector.count_matches(&flowing, &state.replay), 1);
    }
}
