//! Decision Sinks
//!
//! Where finished decisions go after the engine returns them. Sinks are
//! injected at construction; the core never opens files itself.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::logic::decision::{Category, Decision};

// ============================================================================
// SINK TRAIT
// ============================================================================

/// Observer for finished decisions. Called outside the per-source lock.
pub trait DecisionSink: Send + Sync {
    fn record(&self, decision: &Decision);
}

/// Default: drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DecisionSink for NoopSink {
    fn record(&self, _decision: &Decision) {}
}

// ============================================================================
// LOG SINK
// ============================================================================

/// Writes one line per decision through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DecisionSink for LogSink {
    fn record(&self, d: &Decision) {
        match d.category {
            Category::Safe => log::info!(
                "[Gateway] {} source={} risk={:.2} confidence={:.2}",
                d.category,
                d.source_id,
                d.display_risk(),
                d.confidence
            ),
            Category::Warning | Category::Critical => log::warn!(
                "[Gateway] {} source={} risk={:.2} primary={} reason={}",
                d.category,
                d.source_id,
                d.display_risk(),
                d.primary_source,
                d.primary_reason
            ),
        }
    }
}

// ============================================================================
// MEMORY SINK
// ============================================================================

/// Keeps decisions in memory (tests, replay tooling)
#[derive(Debug, Default)]
pub struct MemorySink {
    decisions: Mutex<Vec<Decision>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.decisions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.lock().is_empty()
    }

    pub fn take(&self) -> Vec<Decision> {
        std::mem::take(&mut *self.decisions.lock())
    }
}

impl DecisionSink for MemorySink {
    fn record(&self, decision: &Decision) {
        self.decisions.lock().push(decision.clone());
    }
}

// ============================================================================
// JSONL SINK
// ============================================================================

/// Append-only JSONL audit trail over any writer
pub struct JsonlSink<W: Write + Send> {
    writer: Mutex<W>,
    written: AtomicU64,
}

impl<W: Write + Send> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            written: AtomicU64::new(0),
        }
    }

    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn flush(&self) -> std::io::Result<()> {
        self.writer.lock().flush()
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> DecisionSink for JsonlSink<W> {
    fn record(&self, decision: &Decision) {
        let line = match serde_json::to_string(decision) {
            Ok(line) => line,
            Err(e) => {
                log::error!("[Audit] Failed to serialize decision: {}", e);
                return;
            }
        };
        let mut writer = self.writer.lock();
        if let Err(e) = writeln!(writer, "{}", line) {
            log::error!("[Audit] Failed to write decision: {}", e);
            return;
        }
        self.written.fetch_add(1, Ordering::Relaxed);
    }
}

// ============================================================================
// FANOUT SINK
// ============================================================================

/// Forwards every decision to each inner sink, in order
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn DecisionSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn DecisionSink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl DecisionSink for FanoutSink {
    fn record(&self, decision: &Decision) {
        for sink in &self.sinks {
            sink.record(decision);
        }
    }
}
