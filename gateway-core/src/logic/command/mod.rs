//! Command Module
//!
//! Operator command types: the loose `RawCommand` from the request layer
//! and the schema-valid, immutable `Command` the pipeline works on.

pub mod types;

pub use types::{ActuatorState, Command, RawCommand};
