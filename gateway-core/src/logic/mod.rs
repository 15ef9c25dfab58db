//! Logic Module - Validation, Detection & Decision Engines
//!
//! Chứa các engines xử lý: Validation, Detectors, Fusion, Decision.
//!
//! ## Pipeline
//! - `command/` - RawCommand (request layer) and validated Command
//! - `validation/` - schema (FATAL) + range rules (HIGH)
//! - `detectors/` - replay, spike, FDIA correlation, physics, behavior, memory
//! - `fusion/` - weighted sum + violation dominance, primary reason
//! - `decision/` - category, confidence, DecisionEngine façade
//! - `explain/` - explanation templates
//!
//! ## Shared
//! - `config` - GatewayConfig with serde defaults
//! - `history` / `state` - bounded windows and per-source state
//! - `telemetry/` - decision sinks
//! - `error` - ConfigError

pub mod command;
pub mod config;
pub mod decision;
pub mod detectors;
pub mod error;
pub mod explain;
pub mod fusion;
pub mod history;
pub mod state;
pub mod telemetry;
pub mod validation;
