//! GridGuard - line-oriented request layer over the decision core.
//!
//! Reads newline-delimited JSON commands from a file or stdin and prints
//! one JSON decision per line.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};
use thiserror::Error;

use gridguard_core::constants::{APP_NAME, APP_VERSION};
use gridguard_core::{
    ConfigError, DecisionEngine, DecisionSink, FanoutSink, GatewayConfig, JsonlSink, LogSink, NoopSink,
    RawCommand,
};

// ============================================================================
// CLI
// ============================================================================

#[derive(Parser)]
#[command(name = "gridguard", about = "Grid command risk gateway", version)]
struct Cli {
    /// JSON configuration file (missing fields use defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Built-in preset applied before the config file
    #[arg(long, value_enum, default_value_t = Preset::Default, global = true)]
    preset: Preset,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Default,
    Strict,
    RulesOnly,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate newline-delimited JSON commands
    Evaluate {
        /// Input file ("-" or omitted for stdin)
        input: Option<PathBuf>,
        /// Append every decision to this JSONL audit file
        #[arg(long)]
        audit: Option<PathBuf>,
        /// Log one line per decision
        #[arg(long)]
        log_decisions: bool,
        /// Pretty-print decisions
        #[arg(long)]
        pretty: bool,
    },
    /// Print the effective configuration
    Config,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
enum CliError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("line {line}: {reason}")]
    Request { line: usize, reason: String },
}

// ============================================================================
// MAIN
// ============================================================================

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(cli.preset, cli.config.as_deref())?;

    match cli.command {
        Commands::Config => {
            let json = serde_json::to_string_pretty(&config).context("serialize config")?;
            println!("{}", json);
        }
        Commands::Evaluate {
            input,
            audit,
            log_decisions,
            pretty,
        } => {
            log::info!("Starting {} v{}", APP_NAME, APP_VERSION);
            let audit_sink = match audit {
                Some(path) => Some(Arc::new(open_audit(&path)?)),
                None => None,
            };
            let audit_dyn = audit_sink.clone().map(|a| a as Arc<dyn DecisionSink>);
            let sink = build_sink(audit_dyn, log_decisions);
            let engine = DecisionEngine::with_sink(config, sink).map_err(CliError::from)?;

            let reader: Box<dyn BufRead> = match input.as_deref() {
                None => Box::new(BufReader::new(io::stdin())),
                Some(p) if p == Path::new("-") => Box::new(BufReader::new(io::stdin())),
                Some(p) => Box::new(BufReader::new(
                    File::open(p).with_context(|| format!("open input {}", p.display()))?,
                )),
            };
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let stats = run(&engine, reader, &mut out, pretty)?;
            out.flush()?;

            if let Some(a) = audit_sink {
                a.flush()?;
            }
            log::info!(
                "Processed {} commands ({} blocked, {} unreadable lines)",
                stats.decided,
                stats.blocked,
                stats.skipped
            );
        }
    }
    Ok(())
}

// ============================================================================
// HELPERS
// ============================================================================

#[derive(Debug, Default, PartialEq)]
struct RunStats {
    decided: usize,
    blocked: usize,
    skipped: usize,
}

fn load_config(preset: Preset, path: Option<&Path>) -> Result<GatewayConfig, CliError> {
    let mut config = match preset {
        Preset::Default => GatewayConfig::default(),
        Preset::Strict => GatewayConfig::strict(),
        Preset::RulesOnly => GatewayConfig::rules_only(),
    };

    if let Some(path) = path {
        let text = std::fs::read_to_string(path)?;
        // File fields override the preset; absent fields keep preset values.
        let mut base = serde_json::to_value(&config).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        let overlay: Value = serde_json::from_str(&text).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        merge(&mut base, overlay);
        config = serde_json::from_value(base).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
    }

    config.validate()?;
    Ok(config)
}

/// Deep-merge JSON objects, `overlay` wins
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(b), Value::Object(o)) => {
            for (k, v) in o {
                merge(b.entry(k).or_insert(Value::Null), v);
            }
        }
        (slot, v) => *slot = v,
    }
}

/// Combine the audit trail and decision logging into one sink
fn build_sink(audit: Option<Arc<dyn DecisionSink>>, log_decisions: bool) -> Arc<dyn DecisionSink> {
    let mut sinks: Vec<Arc<dyn DecisionSink>> = Vec::new();
    sinks.extend(audit);
    if log_decisions {
        sinks.push(Arc::new(LogSink));
    }
    match sinks.len() {
        0 => Arc::new(NoopSink),
        1 => sinks.remove(0),
        _ => Arc::new(FanoutSink::new(sinks)),
    }
}

fn open_audit(path: &Path) -> Result<JsonlSink<BufWriter<File>>, CliError> {
    let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    log::info!("Audit trail: {}", path.display());
    Ok(JsonlSink::new(BufWriter::new(file)))
}

/// Build a `RawCommand` from one request line.
///
/// Accepts `{source_id, received_at, payload: {...}}` or the flat form with
/// payload fields at top level. A missing `received_at` is stamped with
/// `now`. Field contents are left to the schema validator.
fn parse_request(line: &str, line_no: usize, now: DateTime<Utc>) -> Result<RawCommand, CliError> {
    let value: Value = serde_json::from_str(line).map_err(|e| CliError::Request {
        line: line_no,
        reason: e.to_string(),
    })?;
    let Value::Object(mut obj) = value else {
        return Err(CliError::Request {
            line: line_no,
            reason: "expected a JSON object".to_string(),
        });
    };

    let source_id = match obj.remove("source_id") {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };
    let received_at = match obj.remove("received_at") {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| CliError::Request {
                line: line_no,
                reason: format!("received_at: {}", e),
            })?,
        Some(_) => {
            return Err(CliError::Request {
                line: line_no,
                reason: "received_at must be an RFC 3339 string".to_string(),
            })
        }
        None => now,
    };
    let payload: Map<String, Value> = match obj.remove("payload") {
        Some(Value::Object(p)) => p,
        _ => obj,
    };

    Ok(RawCommand {
        source_id,
        received_at,
        payload,
    })
}

fn run<R: BufRead, W: Write>(
    engine: &DecisionEngine,
    reader: R,
    out: &mut W,
    pretty: bool,
) -> Result<RunStats, CliError> {
    let mut stats = RunStats::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let raw = match parse_request(&line, idx + 1, Utc::now()) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("{}", e);
                stats.skipped += 1;
                continue;
            }
        };

        let decision = engine.evaluate(&raw);
        stats.decided += 1;
        if !decision.is_forwardable() {
            stats.blocked += 1;
        }

        let json = if pretty {
            serde_json::to_string_pretty(&decision)
        } else {
            serde_json::to_string(&decision)
        }
        .map_err(|e| CliError::Request {
            line: idx + 1,
            reason: e.to_string(),
        })?;
        writeln!(out, "{}", json)?;
    }

    Ok(stats)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Cursor;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_nested_and_flat() {
        let nested = r#"{"source_id":"op-1","received_at":"2024-01-15T10:00:00Z","payload":{"breaker":"ON","voltage":1.0,"frequency":50.0}}"#;
        let raw = parse_request(nested, 1, now()).unwrap();
        assert_eq!(raw.source_id, "op-1");
        assert_eq!(raw.payload.len(), 3);

        let flat = r#"{"source_id":"op-2","actuator_state":"OFF","primary_value":1.0,"secondary_value":50.0}"#;
        let raw = parse_request(flat, 2, now()).unwrap();
        assert_eq!(raw.received_at, now());
        assert!(raw.payload.contains_key("actuator_state"));
        assert!(!raw.payload.contains_key("source_id"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_request("not json", 3, now()), Err(CliError::Request { line: 3, .. })));
        assert!(parse_request("[1,2]", 1, now()).is_err());
        assert!(parse_request(r#"{"received_at": 5}"#, 1, now()).is_err());
    }

    #[test]
    fn test_run_emits_one_line_per_decision() {
        let engine = DecisionEngine::new(GatewayConfig::default()).unwrap();
        let input = concat!(
            r#"{"source_id":"op-1","received_at":"2024-01-15T10:00:00Z","payload":{"breaker":"ON","voltage":1.02,"frequency":50.1}}"#,
            "\n\n",
            "garbage\n",
            r#"{"source_id":"op-1","received_at":"2024-01-15T10:00:01Z","payload":{"breaker":"ON","voltage":1.25,"frequency":50.0}}"#,
            "\n",
        );
        let mut out = Vec::new();
        let stats = run(&engine, Cursor::new(input), &mut out, false).unwrap();
        assert_eq!(
            stats,
            RunStats {
                decided: 2,
                blocked: 1,
                skipped: 1
            }
        );

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["category"], "SAFE");
        assert_eq!(lines[1]["category"], "CRITICAL");
    }

    #[test]
    fn test_load_config_file_over_preset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.json");
        std::fs::write(&path, r#"{"thresholds":{"warn":0.25},"detectors":{"memory":{"enabled":false}}}"#).unwrap();

        let config = load_config(Preset::Strict, Some(&path)).unwrap();
        assert_eq!(config.thresholds.warn, 0.25);
        // strict block threshold survives the overlay
        assert_eq!(config.thresholds.block, 0.50);
        assert!(!config.detectors.memory.enabled);
        assert_eq!(config.detectors.replay.trigger_count, 2);
    }

    #[test]
    fn test_load_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let bad_json = dir.path().join("bad.json");
        std::fs::write(&bad_json, "{ nope").unwrap();
        assert!(matches!(
            load_config(Preset::Default, Some(&bad_json)),
            Err(CliError::ConfigParse { .. })
        ));

        let bad_value = dir.path().join("order.json");
        std::fs::write(&bad_value, r#"{"thresholds":{"warn":0.9,"block":0.5}}"#).unwrap();
        assert!(matches!(
            load_config(Preset::Default, Some(&bad_value)),
            Err(CliError::Config(ConfigError::ThresholdOrder { .. }))
        ));

        let missing = dir.path().join("missing.json");
        assert!(matches!(load_config(Preset::Default, Some(&missing)), Err(CliError::Io(_))));
    }

    #[test]
    fn test_audit_and_logging_both_receive_decisions() {
        let audit = Arc::new(JsonlSink::new(Vec::new()));
        let sink = build_sink(Some(audit.clone() as Arc<dyn DecisionSink>), true);
        let engine = DecisionEngine::with_sink(GatewayConfig::default(), sink).unwrap();

        let raw = parse_request(r#"{"source_id":"op-1","breaker":"ON","voltage":1.0,"frequency":50.0}"#, 1, now()).unwrap();
        engine.evaluate(&raw);
        engine.evaluate(&raw);
        assert_eq!(audit.written(), 2);

        let audit_only = DecisionEngine::with_sink(
            GatewayConfig::default(),
            build_sink(Some(audit.clone() as Arc<dyn DecisionSink>), false),
        )
        .unwrap();
        audit_only.evaluate(&raw);
        assert_eq!(audit.written(), 3);
    }
}
