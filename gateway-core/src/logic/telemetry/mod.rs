//! Telemetry Module
//!
//! Decision observability: every finished decision goes to a sink.
//!
//! ## Structure
//! - `sink.rs` - DecisionSink trait + Noop/Log/Memory/JSONL/Fanout sinks
//!
//! ## Usage
//! ```ignore
//! let engine = DecisionEngine::with_sink(config, Arc::new(LogSink))?;
//! ```

pub mod sink;

pub use sink::{DecisionSink, FanoutSink, JsonlSink, LogSink, MemorySink, NoopSink};
