//! Decision Module
//!
//! Turns fused risk into SAFE / WARNING / CRITICAL and drives the
//! per-command pipeline.
//!
//! ## Structure
//! - `types`: Category, Verdict, Stage, Decision
//! - `engine`: DecisionEngine (gateway façade)
//!
//! ## Usage
//! ```ignore
//! let engine = DecisionEngine::new(GatewayConfig::default())?;
//! let decision = engine.evaluate(&raw);
//! if !decision.is_forwardable() {
//!     reject(decision.explanation);
//! }
//! ```

pub mod engine;
pub mod types;

pub use engine::{confidence, DecisionEngine};
pub use types::{Category, Decision, Stage, Verdict};
