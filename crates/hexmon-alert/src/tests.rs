use crate::evaluator::{evaluate, STEAL_ALERT_PCT};
use crate::state::{AlertStateMachine, Decision};
use chrono::{Duration, Utc};
use hexmon_common::types::{
    AlertState, DbStats, DiskStats, LoadAverage, MemoryStats, Metric, Snapshot, ThresholdConfig,
    Violation,
};

fn nominal_snapshot() -> Snapshot {
    Snapshot {
        timestamp: Utc::now(),
        cpu_pct: 10.0,
        cpu_steal_pct: 0.0,
        cpu_cores: 4,
        memory: MemoryStats {
            total_bytes: 8 << 30,
            used_bytes: 3 << 30,
            free_bytes: 5 << 30,
            used_pct: 37.5,
        },
        load: LoadAverage {
            one: 0.5,
            five: 0.4,
            fifteen: 0.3,
        },
        db: DbStats::default(),
        disk: DiskStats::default(),
    }
}

fn config() -> ThresholdConfig {
    ThresholdConfig::with_defaults(4)
}

fn cpu_violation() -> Violation {
    Violation {
        metric: Metric::Cpu,
        observed: 95.0,
        threshold: 80.0,
        message: "CPU usage is 95.0% (threshold: 80%)".to_string(),
    }
}

#[test]
fn nominal_snapshot_has_no_violations() {
    assert!(evaluate(&nominal_snapshot(), &config()).is_empty());
}

#[test]
fn cpu_over_threshold_violates() {
    let mut snapshot = nominal_snapshot();
    snapshot.cpu_pct = 85.0;

    let violations = evaluate(&snapshot, &config());
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].metric, Metric::Cpu);
    assert_eq!(violations[0].message, "CPU usage is 85.0% (threshold: 80%)");
}

#[test]
fn reading_exactly_at_threshold_does_not_violate() {
    let mut snapshot = nominal_snapshot();
    snapshot.cpu_pct = 80.0;
    snapshot.memory.used_pct = 85.0;
    snapshot.load.one = 8.0;
    snapshot.db.cpu_time = 50.0;
    snapshot.db.slow_queries = 10;
    snapshot.cpu_steal_pct = STEAL_ALERT_PCT;

    assert!(evaluate(&snapshot, &config()).is_empty());
}

#[test]
fn violations_come_back_in_fixed_order() {
    let mut snapshot = nominal_snapshot();
    snapshot.cpu_pct = 95.0;
    snapshot.memory.used_pct = 99.0;
    snapshot.load.one = 12.0;
    snapshot.db.cpu_time = 120.0;
    snapshot.db.slow_queries = 40;
    snapshot.cpu_steal_pct = 9.0;

    let metrics: Vec<Metric> = evaluate(&snapshot, &config())
        .iter()
        .map(|v| v.metric)
        .collect();
    assert_eq!(
        metrics,
        vec![
            Metric::Cpu,
            Metric::Memory,
            Metric::Load,
            Metric::DbCpu,
            Metric::SlowQueries,
            Metric::CpuSteal,
        ]
    );
}

#[test]
fn steal_floor_is_fixed_at_five_percent() {
    let mut snapshot = nominal_snapshot();
    snapshot.cpu_steal_pct = 5.1;

    let violations = evaluate(&snapshot, &config());
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].metric, Metric::CpuSteal);
    assert_eq!(violations[0].threshold, 5.0);
    assert!(violations[0].message.contains("hypervisor"));
}

#[test]
fn only_one_minute_load_is_thresholded() {
    let mut snapshot = nominal_snapshot();
    snapshot.load.five = 20.0;
    snapshot.load.fifteen = 20.0;

    assert!(evaluate(&snapshot, &config()).is_empty());
}

#[test]
fn evaluation_is_deterministic() {
    let mut snapshot = nominal_snapshot();
    snapshot.cpu_pct = 95.0;
    snapshot.db.slow_queries = 40;
    let config = config();

    assert_eq!(evaluate(&snapshot, &config), evaluate(&snapshot, &config));
}

#[test]
fn first_breach_alerts_and_activates() {
    let machine = AlertStateMachine::new(300);
    let mut state = AlertState::default();
    let now = Utc::now();

    let decision = machine.process(&mut state, &[cpu_violation()], now);
    match decision {
        Decision::Alert { messages } => {
            assert_eq!(messages, vec!["CPU usage is 95.0% (threshold: 80%)"]);
        }
        other => panic!("expected alert, got {other:?}"),
    }
    assert!(state.active);
    assert_eq!(state.last_notified_at, Some(now));
}

#[test]
fn breach_within_cooldown_is_suppressed() {
    let machine = AlertStateMachine::new(300);
    let t0 = Utc::now();
    let mut state = AlertState::default();
    machine.process(&mut state, &[cpu_violation()], t0);

    // Still violating 30 seconds later.
    let decision = machine.process(&mut state, &[cpu_violation()], t0 + Duration::seconds(30));
    assert_eq!(decision, Decision::Suppressed);
    assert!(state.active);
    assert_eq!(state.last_notified_at, Some(t0));
}

#[test]
fn clearing_recovers_immediately_and_keeps_timer() {
    let machine = AlertStateMachine::new(300);
    let t0 = Utc::now();
    let mut state = AlertState::default();
    machine.process(&mut state, &[cpu_violation()], t0);

    // Recovery is not cooldown-gated.
    let decision = machine.process(&mut state, &[], t0 + Duration::seconds(10));
    assert_eq!(decision, Decision::Recovery);
    assert!(!state.active);
    assert_eq!(state.last_notified_at, Some(t0));
}

#[test]
fn sustained_breach_renotifies_once_cooldown_passes() {
    let machine = AlertStateMachine::new(300);
    let t0 = Utc::now();
    let mut state = AlertState::default();
    machine.process(&mut state, &[cpu_violation()], t0);

    let reminder_at = t0 + Duration::seconds(300);
    let decision = machine.process(&mut state, &[cpu_violation()], reminder_at);
    assert!(matches!(decision, Decision::Alert { .. }));
    assert_eq!(state.last_notified_at, Some(reminder_at));
}

#[test]
fn new_breach_after_recovery_respects_cooldown() {
    let machine = AlertStateMachine::new(300);
    let t0 = Utc::now();
    let mut state = AlertState::default();
    machine.process(&mut state, &[cpu_violation()], t0);
    machine.process(&mut state, &[], t0 + Duration::seconds(60));

    // Breach again 100 seconds after the first notification: held back,
    // and the machine stays inactive.
    let decision = machine.process(&mut state, &[cpu_violation()], t0 + Duration::seconds(100));
    assert_eq!(decision, Decision::Suppressed);
    assert!(!state.active);
}

#[test]
fn oversized_cooldown_saturates_and_holds_reminders() {
    // Larger than chrono can represent as a Duration.
    let machine = AlertStateMachine::new(10_000_000_000_000_000);
    let t0 = Utc::now();
    let mut state = AlertState::default();

    let decision = machine.process(&mut state, &[cpu_violation()], t0);
    assert!(matches!(decision, Decision::Alert { .. }));

    // A saturated cooldown never lets a reminder through.
    let decision = machine.process(&mut state, &[cpu_violation()], t0 + Duration::days(10_000));
    assert_eq!(decision, Decision::Suppressed);

    // Does not even fit in i64.
    let machine = AlertStateMachine::new(u64::MAX);
    let mut state = AlertState::default();
    let decision = machine.process(&mut state, &[cpu_violation()], t0);
    assert!(matches!(decision, Decision::Alert { .. }));
}

#[test]
fn quiet_cycles_stay_quiet() {
    let machine = AlertStateMachine::new(300);
    let mut state = AlertState::default();

    let decision = machine.process(&mut state, &[], Utc::now());
    assert_eq!(decision, Decision::Quiet);
    assert!(!state.active);
    assert_eq!(state.last_notified_at, None);
}

#[test]
fn scenario_alert_then_suppress_then_recover() {
    let config = config();
    let machine = AlertStateMachine::new(config.alert_cooldown_secs);
    let mut state = AlertState::default();
    let t0 = Utc::now();

    // Cycle 1: CPU 85% breaches the default 80% threshold.
    let mut snapshot = nominal_snapshot();
    snapshot.cpu_pct = 85.0;
    let violations = evaluate(&snapshot, &config);
    assert_eq!(violations.len(), 1);
    let decision = machine.process(&mut state, &violations, t0);
    assert!(matches!(decision, Decision::Alert { .. }));

    // Cycle 2 at t+30s: still breaching, cooldown holds.
    let violations = evaluate(&snapshot, &config);
    let decision = machine.process(&mut state, &violations, t0 + Duration::seconds(30));
    assert_eq!(decision, Decision::Suppressed);

    // Cycle 3 at t+310s: back to nominal, recovery goes out.
    snapshot.cpu_pct = 10.0;
    let violations = evaluate(&snapshot, &config);
    assert!(violations.is_empty());
    let decision = machine.process(&mut state, &violations, t0 + Duration::seconds(310));
    assert_eq!(decision, Decision::Recovery);
    assert!(!state.active);
}
