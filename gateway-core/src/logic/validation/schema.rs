//! Schema Validator
//!
//! Turns a loosely typed `RawCommand` into a `Command`, or a list of FATAL
//! violations. Only producer of `Command` from request data.

use serde_json::{Map, Value};

use super::types::Violation;
use crate::logic::command::{ActuatorState, Command, RawCommand};

// ============================================================================
// FIELD KEYS
// ============================================================================

/// Canonical key and its field-equipment alias
struct FieldKey {
    name: &'static str,
    alias: &'static str,
}

const ACTUATOR_STATE: FieldKey = FieldKey { name: "actuator_state", alias: "breaker" };
const PRIMARY_VALUE: FieldKey = FieldKey { name: "primary_value", alias: "voltage" };
const SECONDARY_VALUE: FieldKey = FieldKey { name: "secondary_value", alias: "frequency" };
const DERIVED_FLOW: FieldKey = FieldKey { name: "derived_flow", alias: "power_flow" };

/// Canonical key wins when both are present
fn lookup<'a>(payload: &'a Map<String, Value>, key: &FieldKey) -> Option<&'a Value> {
    payload.get(key.name).or_else(|| payload.get(key.alias))
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Validate presence, types and enum membership.
///
/// Every FATAL problem is reported, not just the first.
pub fn validate_schema(raw: &RawCommand) -> Result<Command, Vec<Violation>> {
    let mut violations = Vec::new();

    if raw.source_id.trim().is_empty() {
        violations.push(Violation::fatal("source_id", "Missing required field: source_id"));
    }

    let state = match lookup(&raw.payload, &ACTUATOR_STATE) {
        None | Some(Value::Null) => {
            violations.push(missing(&ACTUATOR_STATE));
            None
        }
        Some(Value::String(s)) => match ActuatorState::parse(s) {
            Some(state) => Some(state),
            None => {
                violations.push(Violation::fatal(
                    ACTUATOR_STATE.name,
                    format!("Invalid actuator state '{}'. Must be one of: ON, OFF", s),
                ));
                None
            }
        },
        Some(other) => {
            violations.push(Violation::fatal(
                ACTUATOR_STATE.name,
                format!("Invalid actuator_state type: expected string, got {}", type_name(other)),
            ));
            None
        }
    };

    let primary = required_number(&raw.payload, &PRIMARY_VALUE, &mut violations);
    let secondary = required_number(&raw.payload, &SECONDARY_VALUE, &mut violations);

    let flow = match lookup(&raw.payload, &DERIVED_FLOW) {
        None | Some(Value::Null) => None,
        Some(value) => match number(value) {
            Ok(v) => Some(v),
            Err(reason) => {
                violations.push(Violation::fatal(DERIVED_FLOW.name, reason_for(&DERIVED_FLOW, reason)));
                None
            }
        },
    };

    match (state, primary, secondary) {
        (Some(state), Some(p), Some(s)) if violations.is_empty() => {
            let mut command = Command::new(raw.source_id.trim(), state, p, s, raw.received_at);
            if let Some(flow) = flow {
                command = command.with_flow(flow);
            }
            Ok(command)
        }
        _ => Err(violations),
    }
}

/// Re-check an already typed command.
///
/// `Command::new` accepts any `f64`, so finite values and a non-empty source
/// still need enforcing on the typed entry point.
pub fn check_command(command: &Command) -> Vec<Violation> {
    let mut violations = Vec::new();
    if command.source_id().trim().is_empty() {
        violations.push(Violation::fatal("source_id", "Missing required field: source_id"));
    }
    let fields = [
        (PRIMARY_VALUE.name, Some(command.primary_value())),
        (SECONDARY_VALUE.name, Some(command.secondary_value())),
        (DERIVED_FLOW.name, command.derived_flow()),
    ];
    for (name, value) in fields {
        if let Some(v) = value {
            if !v.is_finite() {
                violations.push(Violation::fatal(name, format!("{} must be a finite number, got {}", name, v)));
            }
        }
    }
    violations
}

// ============================================================================
// HELPERS
// ============================================================================

enum NumberError {
    WrongType(&'static str),
    NonFinite,
}

/// JSON number, or a string holding one
fn number(value: &Value) -> Result<f64, NumberError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        other => return Err(NumberError::WrongType(type_name(other))),
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(NumberError::NonFinite),
        None => Err(NumberError::WrongType("string")),
    }
}

fn required_number(
    payload: &Map<String, Value>,
    key: &FieldKey,
    violations: &mut Vec<Violation>,
) -> Option<f64> {
    match lookup(payload, key) {
        None | Some(Value::Null) => {
            violations.push(missing(key));
            None
        }
        Some(value) => match number(value) {
            Ok(v) => Some(v),
            Err(reason) => {
                violations.push(Violation::fatal(key.name, reason_for(key, reason)));
                None
            }
        },
    }
}

fn missing(key: &FieldKey) -> Violation {
    Violation::fatal(key.name, format!("Missing required field: {}", key.name))
}

fn reason_for(key: &FieldKey, err: NumberError) -> String {
    match err {
        NumberError::WrongType(got) => format!("{} must be numeric, got {}", key.name, got),
        NumberError::NonFinite => format!("{} must be a finite number", key.name),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn raw() -> RawCommand {
        RawCommand::new("op-1", Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    #[test]
    fn test_valid_canonical_keys() {
        let r = raw()
            .with_field("actuator_state", "ON")
            .with_field("primary_value", 1.02)
            .with_field("secondary_value", 50.1);
        let cmd = validate_schema(&r).unwrap();
        assert_eq!(cmd.actuator_state(), ActuatorState::On);
        assert_eq!(cmd.primary_value(), 1.02);
        assert_eq!(cmd.derived_flow(), None);
    }

    #[test]
    fn test_aliases_and_numeric_strings() {
        let r = raw()
            .with_field("breaker", "OFF")
            .with_field("voltage", "0.95")
            .with_field("frequency", 49.8)
            .with_field("power_flow", 12.5);
        let cmd = validate_schema(&r).unwrap();
        assert_eq!(cmd.actuator_state(), ActuatorState::Off);
        assert_eq!(cmd.primary_value(), 0.95);
        assert_eq!(cmd.derived_flow(), Some(12.5));
    }

    #[test]
    fn test_actuator_state_is_case_sensitive() {
        let r = raw()
            .with_field("actuator_state", "on")
            .with_field("primary_value", 1.0)
            .with_field("secondary_value", 50.0);
        let errs = validate_schema(&r).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field, "actuator_state");
        assert!(errs[0].reason.contains("'on'"));
    }

    #[test]
    fn test_missing_fields_all_reported() {
        let errs = validate_schema(&raw()).unwrap_err();
        let fields: Vec<_> = errs.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["actuator_state", "primary_value", "secondary_value"]);
        assert!(errs.iter().all(Violation::is_fatal));
    }

    #[test]
    fn test_wrong_types_and_bad_enum() {
        let r = raw()
            .with_field("actuator_state", "TRIPPED")
            .with_field("primary_value", true)
            .with_field("secondary_value", "fifty");
        let errs = validate_schema(&r).unwrap_err();
        assert_eq!(errs.len(), 3);
        assert!(errs[0].reason.contains("TRIPPED"));
        assert!(errs[1].reason.contains("bool"));

        let r = raw()
            .with_field("actuator_state", 1)
            .with_field("primary_value", 1.0)
            .with_field("secondary_value", 50.0);
        let errs = validate_schema(&r).unwrap_err();
        assert!(errs[0].reason.contains("expected string"));
    }

    #[test]
    fn test_non_finite_string_is_fatal() {
        let r = raw()
            .with_field("actuator_state", "ON")
            .with_field("primary_value", "NaN")
            .with_field("secondary_value", 50.0);
        let errs = validate_schema(&r).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(errs[0].reason.contains("finite"));
    }

    #[test]
    fn test_empty_source_is_fatal() {
        let mut r = raw()
            .with_field("actuator_state", "ON")
            .with_field("primary_value", 1.0)
            .with_field("secondary_value", 50.0);
        r.source_id = "  ".to_string();
        let errs = validate_schema(&r).unwrap_err();
        assert_eq!(errs[0].field, "source_id");
    }

    #[test]
    fn test_check_typed_command() {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let ok = Command::new("op-1", ActuatorState::On, 1.0, 50.0, at);
        assert!(check_command(&ok).is_empty());

        let bad = Command::new("", ActuatorState::On, f64::INFINITY, 50.0, at).with_flow(f64::NAN);
        let fields: Vec<_> = check_command(&bad).into_iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["source_id", "primary_value", "derived_flow"]);
    }
}
