#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use hexmon_collector::cpu::CpuSource;
use hexmon_collector::disk::DiskSource;
use hexmon_collector::load::LoadSource;
use hexmon_collector::memory::MemorySource;
use hexmon_collector::SampleEngine;
use hexmon_common::types::{AlertState, ThresholdConfig};
use hexmon_notify::{Notification, Notifier, NotifyChannel, NotifyError};
use hexmon_server::app;
use hexmon_server::monitor::Monitor;
use hexmon_server::state::AppState;
use hexmon_storage::HistoryStore;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::util::ServiceExt;

/// Aggregate counters that do not advance between the two reads, so CPU
/// usage samples as zero and steal stays at zero.
pub const STAT_QUIET: &str = "cpu  400 0 200 1000 50 0 0 0 0 0\ncpu0 200 0 100 500 25 0 0 0 0 0\n";

pub const CPUINFO_TWO_CORES: &str = "processor\t: 0\nprocessor\t: 1\n";

pub fn meminfo(total_kb: u64, free_kb: u64) -> String {
    format!(
        "MemTotal: {total_kb} kB\nMemFree: {free_kb} kB\nBuffers: 0 kB\nCached: 0 kB\n"
    )
}

/// 25% used.
pub fn nominal_meminfo() -> String {
    meminfo(8_000_000, 6_000_000)
}

/// 95% used, above the default 85% memory threshold.
pub fn breaching_meminfo() -> String {
    meminfo(8_000_000, 400_000)
}

/// Defaults for a two-core host, except that the load bar is unreachable:
/// the real host's load average flows through in tests.
pub fn relaxed_thresholds() -> ThresholdConfig {
    let mut thresholds = ThresholdConfig::with_defaults(2);
    thresholds.load_abs = 10_000.0;
    thresholds
}

/// Test channel that forwards every notification to an inspection queue.
pub struct RecordingChannel {
    tx: mpsc::UnboundedSender<Notification>,
}

#[async_trait]
impl NotifyChannel for RecordingChannel {
    async fn send(&self, notification: &Notification) -> hexmon_notify::Result<()> {
        self.tx
            .send(notification.clone())
            .map_err(|e| NotifyError::Other(e.to_string()))
    }

    fn channel_name(&self) -> &str {
        "recording"
    }
}

pub struct TestContext {
    pub temp_dir: TempDir,
    pub monitor: Arc<Monitor>,
    pub app: Router,
    pub sent: mpsc::UnboundedReceiver<Notification>,
}

pub fn build_test_context(
    meminfo_contents: &str,
    thresholds: ThresholdConfig,
) -> Result<TestContext> {
    let temp_dir = tempfile::tempdir()?;
    let proc_dir = temp_dir.path().join("proc");
    std::fs::create_dir_all(&proc_dir)?;
    std::fs::write(proc_dir.join("stat"), STAT_QUIET)?;
    std::fs::write(proc_dir.join("meminfo"), meminfo_contents)?;
    std::fs::write(proc_dir.join("cpuinfo"), CPUINFO_TWO_CORES)?;

    let engine = SampleEngine::new(
        CpuSource::with_proc_root(&proc_dir, Duration::from_millis(1)),
        MemorySource::with_proc_root(&proc_dir),
        LoadSource::new(),
        DiskSource::new(temp_dir.path()),
        None,
    );

    let store = HistoryStore::open(temp_dir.path().join("hexmon.db"))?;
    store.save_thresholds(&thresholds)?;

    let (tx, sent) = mpsc::unbounded_channel();
    let notifier = Notifier::new(vec![Box::new(RecordingChannel { tx })]);

    let monitor = Arc::new(Monitor::new(
        engine,
        store,
        notifier,
        thresholds,
        AlertState::default(),
        2,
        "test-host".to_string(),
        "http://dashboard.example/".to_string(),
    ));
    let app = app::build_http_app(AppState {
        monitor: monitor.clone(),
    });

    Ok(TestContext {
        temp_dir,
        monitor,
        app,
        sent,
    })
}

/// Replace the meminfo fixture; the next cycle picks it up.
pub fn set_meminfo(ctx: &TestContext, contents: &str) {
    std::fs::write(ctx.temp_dir.path().join("proc").join("meminfo"), contents)
        .expect("meminfo fixture should write");
}

pub async fn request_no_body(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    send(app, req).await
}

pub async fn request_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Value,
) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build");
    send(app, req).await
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };
    (status, json)
}
