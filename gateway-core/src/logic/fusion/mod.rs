//! Fusion Module
//!
//! Combines rule violations and detector scores into one risk value and
//! picks the primary reason.
//!
//! ## Structure
//! - `types`: FusionResult, PrimarySource
//! - `weights`: renormalized per-detector weights
//! - `engine`: the fusion rule

pub mod engine;
pub mod types;
pub mod weights;

pub use engine::{FusionEngine, NOMINAL_REASON};
pub use types::{FusionResult, PrimarySource};
pub use weights::NormalizedWeights;
