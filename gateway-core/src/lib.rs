//! GridGuard Core - risk decision core of a grid command gateway.
//!
//! Takes an operator command plus its source identity, runs it through
//! schema/range validation and a set of stateful detectors, and returns a
//! SAFE / WARNING / CRITICAL decision with an explanation.
//!
//! ```ignore
//! use gridguard_core::{DecisionEngine, GatewayConfig, RawCommand};
//!
//! let engine = DecisionEngine::new(GatewayConfig::default())?;
//! let decision = engine.evaluate(&raw);
//! ```

pub mod constants;
pub mod logic;

pub use logic::command::{ActuatorState, Command, RawCommand};
pub use logic::config::{GatewayConfig, Signature};
pub use logic::decision::{Category, Decision, DecisionEngine, Stage, Verdict};
pub use logic::detectors::{DetectorKind, DetectorScore};
pub use logic::error::ConfigError;
pub use logic::fusion::PrimarySource;
pub use logic::state::SourceProfile;
pub use logic::telemetry::{DecisionSink, FanoutSink, JsonlSink, LogSink, MemorySink, NoopSink};
pub use logic::validation::{Severity, ValidationOutcome, Violation};
