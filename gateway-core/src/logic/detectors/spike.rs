//! Spike Detector
//!
//! Step change against the last accepted value of each field, scaled by
//! the per-field maximum delta.

use super::types::{DetectorKind, DetectorScore};
use super::Detector;
use crate::logic::command::Command;
use crate::logic::config::SpikeConfig;
use crate::logic::state::SourceState;

/// Last accepted reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub primary_value: f64,
    pub secondary_value: f64,
    pub flow: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct SpikeState {
    pub last: Option<Reading>,
}

pub struct SpikeDetector {
    config: SpikeConfig,
}

impl SpikeDetector {
    pub fn new(config: SpikeConfig) -> Self {
        Self { config }
    }
}

impl Detector for SpikeDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Spike
    }

    fn score(&self, command: &Command, state: &SourceState) -> DetectorScore {
        let Some(last) = state.spike.last else {
            return DetectorScore::clear(DetectorKind::Spike, "No prior accepted value");
        };

        let mut deltas = vec![
            (
                "Voltage",
                "pu",
                (command.primary_value() - last.primary_value).abs(),
                self.config.max_primary_delta,
            ),
            (
                "Frequency",
                "Hz",
                (command.secondary_value() - last.secondary_value).abs(),
                self.config.max_secondary_delta,
            ),
        ];
        // Flow only compares when both readings report it
        if let (Some(now), Some(prev)) = (command.derived_flow(), last.flow) {
            deltas.push(("Power flow", "MW", (now - prev).abs(), self.config.max_flow_delta));
        }

        let mut worst = deltas[0];
        for d in &deltas[1..] {
            if d.2 / d.3 > worst.2 / worst.3 {
                worst = *d;
            }
        }
        let (label, unit, delta, limit) = worst;
        let ratio = delta / limit;

        if ratio == 0.0 {
            return DetectorScore::clear(DetectorKind::Spike, "No change from last accepted value");
        }

        DetectorScore::new(
            DetectorKind::Spike,
            ratio,
            self.config.trigger,
            format!("{} step of {:.3} {} (limit {} {})", label, delta, unit, limit, unit),
        )
    }

    fn observe(&self, command: &Command, accepted: bool, state: &mut SourceState) {
        if accepted {
            state.spike.last = Some(Reading {
                primary_value: command.primary_value(),
                secondary_value: command.secondary_value(),
                flow: command.derived_flow(),
            });
        }
    }
}
