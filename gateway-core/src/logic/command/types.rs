//! Command Types
//!
//! Core types for operator commands.
//! Không chứa validation logic - chỉ data structures và audit digest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

// ============================================================================
// ACTUATOR STATE
// ============================================================================

/// Binary actuator (breaker) state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActuatorState {
    On,
    Off,
}

impl ActuatorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActuatorState::On => "ON",
            ActuatorState::Off => "OFF",
        }
    }

    /// Parse wire value. Exact match: only "ON" and "OFF".
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ON" => Some(ActuatorState::On),
            "OFF" => Some(ActuatorState::Off),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActuatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// COMMAND (validated, immutable)
// ============================================================================

/// A schema-valid operator command.
///
/// Fields are private; the only ways to obtain one are [`Command::new`] and the
/// schema validator, so a `Command` never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    actuator_state: ActuatorState,
    primary_value: f64,
    secondary_value: f64,
    derived_flow: Option<f64>,
    source_id: String,
    received_at: DateTime<Utc>,
}

impl Command {
    pub fn new(
        source_id: impl Into<String>,
        actuator_state: ActuatorState,
        primary_value: f64,
        secondary_value: f64,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            actuator_state,
            primary_value,
            secondary_value,
            derived_flow: None,
            source_id: source_id.into(),
            received_at,
        }
    }

    /// Attach a derived power-flow reading
    pub fn with_flow(mut self, flow: f64) -> Self {
        self.derived_flow = Some(flow);
        self
    }

    pub fn actuator_state(&self) -> ActuatorState {
        self.actuator_state
    }

    pub fn primary_value(&self) -> f64 {
        self.primary_value
    }

    pub fn secondary_value(&self) -> f64 {
        self.secondary_value
    }

    pub fn derived_flow(&self) -> Option<f64> {
        self.derived_flow
    }

    /// Derived flow with "not reported" read as zero
    pub fn flow_or_zero(&self) -> f64 {
        self.derived_flow.unwrap_or(0.0)
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// SHA-256 over the canonical field encoding, hex encoded.
    ///
    /// Floats are hashed by bit pattern so the digest is stable across
    /// formatting differences.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.actuator_state.as_str().as_bytes());
        hasher.update(self.primary_value.to_bits().to_le_bytes());
        hasher.update(self.secondary_value.to_bits().to_le_bytes());
        match self.derived_flow {
            Some(flow) => {
                hasher.update([1u8]);
                hasher.update(flow.to_bits().to_le_bytes());
            }
            None => hasher.update([0u8]),
        }
        hasher.update(self.received_at.timestamp_millis().to_le_bytes());
        hex::encode(hasher.finalize())
    }
}

// ============================================================================
// RAW COMMAND (from request layer)
// ============================================================================

/// Loosely typed record handed in by the request layer.
///
/// Transport parsing already happened; field presence and types have not been
/// checked yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCommand {
    pub source_id: String,
    pub received_at: DateTime<Utc>,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl RawCommand {
    pub fn new(source_id: impl Into<String>, received_at: DateTime<Utc>) -> Self {
        Self {
            source_id: source_id.into(),
            received_at,
            payload: Map::new(),
        }
    }

    /// Set a payload field
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    /// Build from a typed command (every field present)
    pub fn from_command(command: &Command) -> Self {
        let mut raw = Self::new(command.source_id(), command.received_at())
            .with_field("actuator_state", command.actuator_state().as_str())
            .with_field("primary_value", command.primary_value())
            .with_field("secondary_value", command.secondary_value());
        if let Some(flow) = command.derived_flow() {
            raw = raw.with_field("derived_flow", flow);
        }
        raw
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_actuator_parse() {
        assert_eq!(ActuatorState::parse("ON"), Some(ActuatorState::On));
        assert_eq!(ActuatorState::parse("OFF"), Some(ActuatorState::Off));
        assert_eq!(ActuatorState::parse("on"), None);
        assert_eq!(ActuatorState::parse(" OFF "), None);
        assert_eq!(ActuatorState::parse("TRIPPED"), None);
    }

    #[test]
    fn test_digest_is_stable() {
        let a = Command::new("op-1", ActuatorState::On, 1.0, 50.0, at(0));
        let b = Command::new("op-1", ActuatorState::On, 1.0, 50.0, at(0));
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn test_digest_covers_flow_and_time() {
        let base = Command::new("op-1", ActuatorState::On, 1.0, 50.0, at(0));
        assert_ne!(base.digest(), base.clone().with_flow(0.0).digest());
        let later = Command::new("op-1", ActuatorState::On, 1.0, 50.0, at(1));
        assert_ne!(base.digest(), later.digest());
    }

    #[test]
    fn test_raw_from_command() {
        let cmd = Command::new("op-1", ActuatorState::Off, 0.95, 49.9, at(0)).with_flow(0.0);
        let raw = RawCommand::from_command(&cmd);
        assert_eq!(raw.payload.get("actuator_state"), Some(&Value::from("OFF")));
        assert!(raw.payload.contains_key("derived_flow"));
    }
}
