mod common;

use axum::http::StatusCode;
use common::{
    breaching_meminfo, build_test_context, nominal_meminfo, relaxed_thresholds, request_no_body,
    set_meminfo,
};
use hexmon_notify::NotificationKind;
use hexmon_storage::HistoryStore;
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn breach_alerts_once_then_recovery_notifies() {
    let mut ctx = build_test_context(&breaching_meminfo(), relaxed_thresholds())
        .expect("test context should build");

    ctx.monitor.run_cycle().await;

    let first = timeout(Duration::from_secs(1), ctx.sent.recv())
        .await
        .expect("alert should arrive")
        .expect("channel should stay open");
    assert_eq!(first.kind, NotificationKind::Alert);
    assert_eq!(first.violations.len(), 1);
    assert!(first.violations[0].starts_with("Memory usage"));
    assert_eq!(first.host, "test-host");
    assert_eq!(first.dashboard_url, "http://dashboard.example/");

    // Second breach lands inside the cooldown window: suppressed.
    ctx.monitor.run_cycle().await;

    set_meminfo(&ctx, &nominal_meminfo());
    ctx.monitor.run_cycle().await;

    let second = timeout(Duration::from_secs(1), ctx.sent.recv())
        .await
        .expect("recovery should arrive")
        .expect("channel should stay open");
    assert_eq!(second.kind, NotificationKind::Recovery);
    assert!(second.violations.is_empty());

    // Every breached cycle is in history with the flag set, including the
    // suppressed one.
    let (status, body) = request_no_body(&ctx.app, "GET", "/v1/history").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"][0]["alerting"], false);
    assert_eq!(body["records"][1]["alerting"], true);
    assert_eq!(body["records"][2]["alerting"], true);
}

#[tokio::test]
async fn disabled_notifications_still_track_state() {
    let mut thresholds = relaxed_thresholds();
    thresholds.notifications_enabled = false;
    let mut ctx = build_test_context(&breaching_meminfo(), thresholds)
        .expect("test context should build");

    ctx.monitor.run_cycle().await;

    let (status, body) = request_no_body(&ctx.app, "GET", "/v1/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alert"]["active"], true);

    let (_, body) = request_no_body(&ctx.app, "GET", "/v1/history").await;
    assert_eq!(body["records"][0]["alerting"], true);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(ctx.sent.try_recv().is_err());
}

#[tokio::test]
async fn alert_state_is_persisted_only_on_transitions() {
    let ctx = build_test_context(&nominal_meminfo(), relaxed_thresholds())
        .expect("test context should build");

    // A quiet cycle writes history but never touches the stored alert state.
    ctx.monitor.run_cycle().await;
    let store = HistoryStore::open(ctx.temp_dir.path().join("hexmon.db"))
        .expect("store should reopen");
    assert!(store
        .load_alert_state()
        .expect("alert state should load")
        .is_none());

    set_meminfo(&ctx, &breaching_meminfo());
    ctx.monitor.run_cycle().await;
    let persisted = store
        .load_alert_state()
        .expect("alert state should load")
        .expect("alert transition should persist");
    assert!(persisted.active);
    assert!(persisted.last_notified_at.is_some());

    set_meminfo(&ctx, &nominal_meminfo());
    ctx.monitor.run_cycle().await;
    let persisted = store
        .load_alert_state()
        .expect("alert state should load")
        .expect("recovery transition should persist");
    assert!(!persisted.active);
    assert!(persisted.last_notified_at.is_some());
}

#[tokio::test]
async fn degraded_memory_source_reads_zero_and_stays_quiet() {
    let ctx = build_test_context(&nominal_meminfo(), relaxed_thresholds())
        .expect("test context should build");
    std::fs::remove_file(ctx.temp_dir.path().join("proc").join("meminfo"))
        .expect("fixture should remove");

    ctx.monitor.run_cycle().await;

    let (status, body) = request_no_body(&ctx.app, "GET", "/v1/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["snapshot"]["memory"]["used_pct"], 0.0);
    assert_eq!(body["snapshot"]["memory"]["total_bytes"], 0);
    assert_eq!(body["alert"]["active"], false);
}
