//! Explain Module
//!
//! SAFE / WARNING / CRITICAL explanation templates.

pub mod engine;

pub use engine::{explain, explain_fatal};
