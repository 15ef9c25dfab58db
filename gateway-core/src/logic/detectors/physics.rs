//! Physics Validator
//!
//! Absolute invariants between actuator state and the electrical fields.
//! Any violated invariant raises a HIGH violation carrying the score, so
//! a physically impossible command dominates fusion instead of being
//! averaged away.

use chrono::{DateTime, Utc};

use super::types::{DetectorKind, DetectorScore};
use super::Detector;
use crate::logic::command::{ActuatorState, Command};
use crate::logic::config::PhysicsConfig;
use crate::logic::state::SourceState;
use crate::logic::validation::Violation;

const OFF_STATE_FLOW_SCORE: f64 = 1.0;
const FREQUENCY_WITHOUT_VOLTAGE_SCORE: f64 = 1.0;
const FLOW_BEFORE_VOLTAGE_SCORE: f64 = 0.90;
const SLEW_SCORE: f64 = 0.85;

/// Physical invariants, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invariant {
    OffStateCarriesFlow,
    FrequencyWithoutVoltage,
    FlowBeforeVoltageObserved,
    FrequencySlewExceeded,
}

impl Invariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Invariant::OffStateCarriesFlow => "off_state_carries_flow",
            Invariant::FrequencyWithoutVoltage => "frequency_without_voltage",
            Invariant::FlowBeforeVoltageObserved => "flow_before_voltage_observed",
            Invariant::FrequencySlewExceeded => "frequency_slew_exceeded",
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            Invariant::OffStateCarriesFlow => OFF_STATE_FLOW_SCORE,
            Invariant::FrequencyWithoutVoltage => FREQUENCY_WITHOUT_VOLTAGE_SCORE,
            Invariant::FlowBeforeVoltageObserved => FLOW_BEFORE_VOLTAGE_SCORE,
            Invariant::FrequencySlewExceeded => SLEW_SCORE,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhysicsState {
    /// An accepted command has carried live primary voltage
    pub primary_observed: bool,
    /// Secondary value and time of the last accepted command
    pub last: Option<(f64, DateTime<Utc>)>,
}

pub struct PhysicsDetector {
    config: PhysicsConfig,
}

impl PhysicsDetector {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    /// Every invariant the command breaks
    pub fn violated(&self, command: &Command, state: &PhysicsState) -> Vec<Invariant> {
        let mut out = Vec::new();
        let p = command.primary_value();
        let s = command.secondary_value();
        let carries_flow = command.flow_or_zero().abs() > self.config.flow_tolerance;

        if command.actuator_state() == ActuatorState::Off && carries_flow {
            out.push(Invariant::OffStateCarriesFlow);
        }
        if p < self.config.dead_primary && s > self.config.live_secondary {
            out.push(Invariant::FrequencyWithoutVoltage);
        }
        let primary_seen = state.primary_observed || p >= self.config.dead_primary;
        if carries_flow && !primary_seen {
            out.push(Invariant::FlowBeforeVoltageObserved);
        }
        if let Some((last_s, last_at)) = state.last {
            let dt = (command.received_at() - last_at).num_milliseconds() as f64 / 1000.0;
            if dt > 0.0 && (s - last_s).abs() / dt > self.config.max_slew_hz_per_sec {
                out.push(Invariant::FrequencySlewExceeded);
            }
        }

        out
    }
}

impl Detector for PhysicsDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Physics
    }

    fn score(&self, command: &Command, state: &SourceState) -> DetectorScore {
        let violated = self.violated(command, &state.physics);
        if violated.is_empty() {
            return DetectorScore::clear(DetectorKind::Physics, "Physically consistent");
        }

        let score = violated.iter().map(Invariant::score).fold(0.0, f64::max);
        let names: Vec<&str> = violated.iter().map(Invariant::as_str).collect();
        let reason = format!("Physics violation: {}", names.join(", "));

        DetectorScore::new(DetectorKind::Physics, score, 0.0, reason.clone())
            .with_violation(Violation::high("physics", reason, score))
    }

    fn observe(&self, command: &Command, accepted: bool, state: &mut SourceState) {
        if !accepted {
            return;
        }
        if command.primary_value() >= self.config.dead_primary {
            state.physics.primary_observed = true;
        }
        state.physics.last = Some((command.secondary_value(), command.received_at()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_ms(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_040_000_000 + ms).unwrap()
    }

    fn cmd(state: ActuatorState, p: f64, s: f64, ms: i64) -> Command {
        Command::new("op-1", state, p, s, at_ms(ms))
    }

    #[test]
    fn test_consistent_command() {
        let d = PhysicsDetector::new(PhysicsConfig::default());
        let state = SourceState::new(10);
        let s = d.score(&cmd(ActuatorState::On, 1.0, 50.0, 0).with_flow(80.0), &state);
        assert_eq!(s.score, 0.0);
        assert!(s.violation.is_none());
    }

    #[test]
    fn test_off_state_with_flow() {
        let d = PhysicsDetector::new(PhysicsConfig::default());
        let state = SourceState::new(10);
        let s = d.score(&cmd(ActuatorState::Off, 1.0, 50.0, 0).with_flow(5.0), &state);
        assert_eq!(s.score, 1.0);
        assert!(s.triggered);
        assert!(s.reason.contains("off_state_carries_flow"));
        let v = s.violation.unwrap();
        assert_eq!(v.contribution, 1.0);
    }

    #[test]
    fn test_flow_before_voltage_lists_all() {
        let d = PhysicsDetector::new(PhysicsConfig::default());
        let state = SourceState::new(10);
        let s = d.score(&cmd(ActuatorState::Off, 0.0, 0.0, 0).with_flow(5.0), &state);
        assert_eq!(s.score, 1.0);
        assert!(s.reason.contains("off_state_carries_flow"));
        assert!(s.reason.contains("flow_before_voltage_observed"));

        let s = d.score(&cmd(ActuatorState::On, 0.0, 0.0, 0).with_flow(5.0), &state);
        assert_eq!(s.score, 0.90);
    }

    #[test]
    fn test_frequency_without_voltage() {
        let d = PhysicsDetector::new(PhysicsConfig::default());
        let state = SourceState::new(10);
        let s = d.score(&cmd(ActuatorState::On, 0.0, 50.0, 0), &state);
        assert_eq!(s.score, 1.0);
        assert!(s.reason.contains("frequency_without_voltage"));
    }

    #[test]
    fn test_slew_against_last_accepted() {
        let d = PhysicsDetector::new(PhysicsConfig::default());
        let mut state = SourceState::new(10);
        d.observe(&cmd(ActuatorState::On, 1.0, 50.0, 0), true, &mut state);

        // 0.5 Hz in 500 ms = 1 Hz/s
        assert_eq!(d.score(&cmd(ActuatorState::On, 1.0, 50.5, 500), &state).score, 0.0);
        // 0.9 Hz in 300 ms = 3 Hz/s
        let s = d.score(&cmd(ActuatorState::On, 1.0, 50.9, 300), &state);
        assert_eq!(s.score, 0.85);
        // same instant is not a slew
        assert_eq!(d.score(&cmd(ActuatorState::On, 1.0, 50.9, 0), &state).score, 0.0);
    }

    #[test]
    fn test_state_updates_only_when_accepted() {
        let d = PhysicsDetector::new(PhysicsConfig::default());
        let mut state = SourceState::new(10);
        d.observe(&cmd(ActuatorState::On, 1.0, 50.0, 0), false, &mut state);
        assert!(!state.physics.primary_observed);
        assert!(state.physics.last.is_none());

        d.observe(&cmd(ActuatorState::On, 1.0, 50.0, 0), true, &mut state);
        assert!(state.physics.primary_observed);
        let later = d.score(&cmd(ActuatorState::On, 0.0, 0.0, 60_000).with_flow(5.0), &state);
        assert!(!later.reason.contains("flow_before_voltage_observed"));
    }
}
