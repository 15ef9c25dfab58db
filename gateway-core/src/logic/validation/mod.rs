//! Validation Module
//!
//! Schema checks (FATAL, short-circuit) and range rules (HIGH, fused).
//!
//! ## Structure
//! - `types`: Severity, Violation, ValidationOutcome
//! - `schema`: RawCommand -> Command
//! - `rules`: safe operating ranges

pub mod rules;
pub mod schema;
pub mod types;

pub use rules::check_ranges;
pub use schema::{check_command, validate_schema};
pub use types::{Severity, ValidationOutcome, Violation};
