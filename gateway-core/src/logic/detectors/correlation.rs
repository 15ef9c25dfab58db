//! Correlation (FDIA) Detector
//!
//! False data injection shows up as a primary/secondary pair that no
//! longer moves together. Scores the Pearson coefficient of the accepted
//! history plus the current command. Falls back to a boundary heuristic
//! while the sample is too small or flat.

use super::types::{DetectorKind, DetectorScore};
use super::Detector;
use crate::logic::command::Command;
use crate::logic::config::{CorrelationConfig, Range};
use crate::logic::history::HistoryWindow;
use crate::logic::state::SourceState;

#[derive(Debug, Clone)]
pub struct CorrelationState {
    /// Accepted (primary, secondary) pairs
    pub samples: HistoryWindow<(f64, f64)>,
}

impl CorrelationState {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: HistoryWindow::new(capacity),
        }
    }
}

pub struct CorrelationDetector {
    config: CorrelationConfig,
    primary_range: Range,
    secondary_range: Range,
}

impl CorrelationDetector {
    pub fn new(config: CorrelationConfig, primary_range: Range, secondary_range: Range) -> Self {
        Self {
            config,
            primary_range,
            secondary_range,
        }
    }

    fn near_edge(value: f64, range: &Range, margin: f64) -> bool {
        (value - range.min).abs() <= margin || (value - range.max).abs() <= margin
    }

    /// Both fields pinned to an operating limit at once
    fn boundary_heuristic(&self, command: &Command) -> DetectorScore {
        let p = command.primary_value();
        let s = command.secondary_value();
        if Self::near_edge(p, &self.primary_range, self.config.primary_margin)
            && Self::near_edge(s, &self.secondary_range, self.config.secondary_margin)
        {
            DetectorScore::new(
                DetectorKind::Fdia,
                self.config.boundary_score,
                self.config.trigger,
                format!(
                    "Possible FDIA: voltage {} pu and frequency {} Hz both at operating limits",
                    p, s
                ),
            )
        } else {
            DetectorScore::clear(DetectorKind::Fdia, "Insufficient history for correlation check")
        }
    }

    /// Linear between `floor` (1.0) and `healthy_low` (0.0)
    fn ramp(&self, r: f64) -> f64 {
        if r >= self.config.healthy_low {
            0.0
        } else if r <= self.config.floor {
            1.0
        } else {
            (self.config.healthy_low - r) / (self.config.healthy_low - self.config.floor)
        }
    }
}

/// Pearson r, `None` when either series has zero variance
pub fn pearson(samples: &[(f64, f64)]) -> Option<f64> {
    let n = samples.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mean_x = samples.iter().map(|s| s.0).sum::<f64>() / nf;
    let mean_y = samples.iter().map(|s| s.1).sum::<f64>() / nf;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in samples {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom <= f64::EPSILON || !denom.is_finite() {
        return None;
    }
    Some((cov / denom).clamp(-1.0, 1.0))
}

impl Detector for CorrelationDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Fdia
    }

    fn score(&self, command: &Command, state: &SourceState) -> DetectorScore {
        let mut sample: Vec<(f64, f64)> = state.correlation.samples.iter().copied().collect();
        sample.push((command.primary_value(), command.secondary_value()));

        if sample.len() < self.config.min_samples {
            return self.boundary_heuristic(command);
        }
        let Some(r) = pearson(&sample) else {
            return self.boundary_heuristic(command);
        };

        let score = self.ramp(r);
        if score == 0.0 {
            return DetectorScore::clear(
                DetectorKind::Fdia,
                format!("Voltage/frequency correlation healthy (r={:.2})", r),
            );
        }
        DetectorScore::new(
            DetectorKind::Fdia,
            score,
            self.config.trigger,
            format!(
                "Possible FDIA: voltage/frequency correlation r={:.2} over {} samples",
                r,
                sample.len()
            ),
        )
    }

    fn observe(&self, command: &Command, accepted: bool, state: &mut SourceState) {
        if accepted {
            state
                .correlation
                .samples
                .push((command.primary_value(), command.secondary_value()));
        }
    }
}
