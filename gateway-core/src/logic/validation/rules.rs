//! Rule Validator
//!
//! Safe operating range checks on a schema-valid command. A range
//! violation is HIGH severity: it enters fusion with a fixed contribution
//! but never short-circuits the pipeline.

use super::types::Violation;
use crate::logic::command::Command;
use crate::logic::config::{Range, RangesConfig};

/// Check every configured range, in field order
pub fn check_ranges(command: &Command, ranges: &RangesConfig) -> Vec<Violation> {
    let mut violations = Vec::new();
    let risk = ranges.violation_risk;

    if let Some(v) = out_of_range("primary_value", "Voltage", "pu", command.primary_value(), &ranges.primary, risk) {
        violations.push(v);
    }
    if let Some(v) = out_of_range("secondary_value", "Frequency", "Hz", command.secondary_value(), &ranges.secondary, risk) {
        violations.push(v);
    }
    if let Some(flow) = command.derived_flow() {
        if let Some(v) = out_of_range("derived_flow", "Power flow", "MW", flow, &ranges.flow, risk) {
            violations.push(v);
        }
    }

    violations
}

fn out_of_range(
    field: &str,
    label: &str,
    unit: &str,
    value: f64,
    range: &Range,
    risk: f64,
) -> Option<Violation> {
    if range.contains(value) {
        return None;
    }
    Some(Violation::high(
        field,
        format!(
            "{} {} {} outside safe range [{}, {}] {}",
            label, value, unit, range.min, range.max, unit
        ),
        risk,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::command::ActuatorState;
    use crate::logic::validation::Severity;
    use chrono::{TimeZone, Utc};

    fn cmd(p: f64, s: f64) -> Command {
        Command::new("op-1", ActuatorState::On, p, s, Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    #[test]
    fn test_in_range_and_boundaries() {
        let ranges = RangesConfig::default();
        assert!(check_ranges(&cmd(1.02, 50.1), &ranges).is_empty());
        assert!(check_ranges(&cmd(0.90, 49.0), &ranges).is_empty());
        assert!(check_ranges(&cmd(1.10, 51.0), &ranges).is_empty());
    }

    #[test]
    fn test_voltage_out_of_range() {
        let violations = check_ranges(&cmd(1.25, 50.0), &RangesConfig::default());
        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.field, "primary_value");
        assert_eq!(v.severity, Severity::High);
        assert_eq!(v.contribution, 0.80);
        assert!(v.reason.contains("1.25"));
    }

    #[test]
    fn test_flow_checked_only_when_reported() {
        let ranges = RangesConfig::default();
        assert!(check_ranges(&cmd(1.0, 50.0), &ranges).is_empty());
        let violations = check_ranges(&cmd(1.0, 48.0).with_flow(250.0), &ranges);
        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["secondary_value", "derived_flow"]);
    }
}
