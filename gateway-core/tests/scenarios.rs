//! End-to-end gateway scenarios

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use gridguard_core::{
    ActuatorState, Category, Command, DecisionEngine, DetectorKind, GatewayConfig, MemorySink,
    PrimarySource, RawCommand, Severity, Stage, Verdict,
};

/// 2024-01-15 10:00:00 UTC plus `ms`, inside normal operating hours
fn at_ms(ms: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap() + Duration::milliseconds(ms)
}

fn engine() -> DecisionEngine {
    DecisionEngine::new(GatewayConfig::default()).unwrap()
}

fn cmd(source: &str, state: ActuatorState, p: f64, s: f64, ms: i64) -> Command {
    Command::new(source, state, p, s, at_ms(ms))
}

#[test]
fn scenario_a_nominal_command_is_safe() {
    let e = engine();
    let raw = RawCommand::new("operator-a", at_ms(0))
        .with_field("breaker", "ON")
        .with_field("voltage", 1.02)
        .with_field("frequency", 50.1);

    let d = e.evaluate(&raw);
    assert_eq!(d.category, Category::Safe);
    assert_eq!(d.verdict(), Verdict::Allow);
    assert!(d.risk_score < 0.30);
    assert!(d.violations.is_empty());
    assert_eq!(d.primary_source, PrimarySource::Nominal);
    assert_eq!(d.explanation, "All systems normal. No security threats detected.");
}

#[test]
fn fresh_source_at_range_edges_off_hours_is_safe() {
    let e = engine();
    let late = Utc.with_ymd_and_hms(2024, 1, 15, 23, 0, 0).unwrap();
    let d = e.evaluate_command(&Command::new("night-shift", ActuatorState::On, 1.1, 51.0, late));

    assert_eq!(d.category, Category::Safe, "risk {}", d.risk_score);
    let fdia = d.per_detector.iter().find(|s| s.kind == DetectorKind::Fdia).unwrap();
    let behavior = d.per_detector.iter().find(|s| s.kind == DetectorKind::Behavior).unwrap();
    assert!(fdia.score > 0.0);
    assert!(behavior.score > 0.0);
}

#[test]
fn scenario_b_voltage_out_of_range_is_critical() {
    let e = engine();
    let d = e.evaluate_command(&cmd("operator-b", ActuatorState::On, 1.25, 50.0, 0));

    assert_eq!(d.category, Category::Critical);
    assert!(!d.is_forwardable());
    assert!(d.risk_score >= 0.80);
    assert_eq!(d.primary_source, PrimarySource::Rule);
    let range = &d.violations[0];
    assert_eq!(range.field, "primary_value");
    assert_eq!(range.severity, Severity::High);
    assert!(range.contribution >= 0.80);
    assert!(d.explanation.starts_with("CRITICAL: Voltage 1.25"));
}

#[test]
fn scenario_c_replayed_command_escalates() {
    let e = engine();
    let decisions: Vec<_> = (0..5)
        .map(|i| e.evaluate_command(&cmd("operator-c", ActuatorState::On, 1.00, 50.0, i * 500)))
        .collect();

    for d in &decisions[..2] {
        assert!(matches!(d.category, Category::Safe | Category::Warning), "{:?}", d.category);
    }
    for d in &decisions[2..] {
        assert!(matches!(d.category, Category::Warning | Category::Critical), "{:?}", d.category);
    }

    let third = &decisions[2];
    assert_eq!(third.category, Category::Critical);
    assert_eq!(third.primary_source, PrimarySource::Detector(DetectorKind::Replay));
    assert!(third.primary_reason.contains("3 identical commands"));
    let replay = third
        .per_detector
        .iter()
        .find(|s| s.kind == DetectorKind::Replay)
        .unwrap();
    assert_eq!(replay.score, 1.0);
    assert!(replay.triggered);
}

#[test]
fn scenario_d_off_breaker_carrying_flow_is_critical_via_physics() {
    let e = engine();
    let first = e.evaluate_command(&cmd("operator-d", ActuatorState::Off, 0.0, 0.0, 0));
    assert_eq!(first.category, Category::Critical);

    let second = e.evaluate_command(&cmd("operator-d", ActuatorState::Off, 0.0, 0.0, 1_000).with_flow(5.0));
    assert_eq!(second.category, Category::Critical);
    assert_eq!(second.primary_source, PrimarySource::Detector(DetectorKind::Physics));
    assert!(second.primary_reason.contains("off_state_carries_flow"));
    assert_eq!(second.risk_score, 1.0);
    assert!(second.violations.iter().any(|v| v.field == "physics"));
}

#[test]
fn fatal_command_short_circuits() {
    let sink = Arc::new(MemorySink::new());
    let e = DecisionEngine::with_sink(GatewayConfig::default(), sink.clone()).unwrap();

    let raw = RawCommand::new("operator-f", at_ms(0))
        .with_field("actuator_state", "MAYBE")
        .with_field("primary_value", 1.0);
    let d = e.evaluate(&raw);

    assert_eq!(d.category, Category::Critical);
    assert_eq!(d.risk_score, 1.0);
    assert_eq!(d.confidence, 1.0);
    assert!(d.per_detector.is_empty());
    assert_eq!(d.stages, vec![Stage::Received, Stage::Decided]);
    assert!(d.violations.iter().all(|v| v.severity == Severity::Fatal));
    assert_eq!(d.violations.len(), 2);
    assert_eq!(e.source_count(), 0);
    assert_eq!(sink.len(), 1);

    // a later valid command from the same source starts from a clean slate
    let next = e.evaluate_command(&cmd("operator-f", ActuatorState::On, 1.0, 50.0, 100));
    assert_eq!(next.category, Category::Safe);
}

#[test]
fn fusion_dominance_of_rule_contribution() {
    let mut config = GatewayConfig::default();
    config.ranges.violation_risk = 0.90;
    let e = DecisionEngine::new(config).unwrap();

    let d = e.evaluate_command(&cmd("operator-g", ActuatorState::On, 1.0, 52.0, 0));
    assert!(d.risk_score >= 0.90);
    assert_eq!(d.category, Category::Critical);
}

#[test]
fn warning_band_for_moderate_risk() {
    let mut config = GatewayConfig::default();
    config.ranges.violation_risk = 0.45;
    let e = DecisionEngine::new(config).unwrap();

    let d = e.evaluate_command(&cmd("operator-w", ActuatorState::On, 1.0, 51.5, 0));
    assert_eq!(d.category, Category::Warning);
    assert_eq!(d.verdict(), Verdict::AllowFlagged);
    assert!(d.is_forwardable());
    assert!(d.explanation.starts_with("WARNING:"));
    assert_eq!(d.display_risk(), 0.45);
}

#[test]
fn identical_sequences_give_identical_decisions() {
    let sequence = vec![
        cmd("op", ActuatorState::On, 1.0, 50.0, 0),
        cmd("op", ActuatorState::On, 1.02, 50.1, 800),
        cmd("op", ActuatorState::Off, 1.0, 50.0, 1_200),
        cmd("op", ActuatorState::Off, 1.2, 50.0, 9_000),
        cmd("op", ActuatorState::On, 1.0, 50.0, 9_400).with_flow(40.0),
        cmd("op", ActuatorState::On, 1.0, 50.0, 9_600).with_flow(40.0),
        cmd("op", ActuatorState::On, 1.0, 50.0, 9_800).with_flow(40.0),
    ];

    let first: Vec<_> = {
        let e = engine();
        sequence.iter().map(|c| e.evaluate_command(c)).collect()
    };
    let second: Vec<_> = {
        let e = engine();
        sequence.iter().map(|c| e.evaluate_command(c)).collect()
    };
    assert_eq!(first, second);
}

#[test]
fn sources_are_isolated_and_parallel() {
    let shared = Arc::new(engine());
    let sources: Vec<String> = (0..8).map(|i| format!("operator-{}", i)).collect();
    let sequence = |source: &str| -> Vec<Command> {
        (0..6)
            .map(|i| cmd(source, ActuatorState::On, 1.0, 50.0, i * 400))
            .collect()
    };

    let parallel: Vec<Vec<Category>> = std::thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .map(|source| {
                let engine = Arc::clone(&shared);
                let commands = sequence(source);
                scope.spawn(move || {
                    commands
                        .iter()
                        .map(|c| engine.evaluate_command(c).category)
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let reference: Vec<Category> = {
        let e = engine();
        sequence("reference")
            .iter()
            .map(|c| e.evaluate_command(c).category)
            .collect()
    };
    for categories in &parallel {
        assert_eq!(categories, &reference);
    }
    assert_eq!(shared.source_count(), sources.len());
}

#[test]
fn rules_only_engine_has_no_detectors() {
    let e = DecisionEngine::new(GatewayConfig::rules_only()).unwrap();
    let d = e.evaluate_command(&cmd("op", ActuatorState::On, 1.0, 50.0, 0));
    assert!(d.per_detector.is_empty());
    assert_eq!(d.category, Category::Safe);

    let d = e.evaluate_command(&cmd("op", ActuatorState::On, 0.5, 50.0, 100));
    assert_eq!(d.category, Category::Critical);
}
