use anyhow::Result;
use hexmon_collector::cpu::CpuSource;
use hexmon_collector::db::DbSource;
use hexmon_collector::disk::DiskSource;
use hexmon_collector::load::LoadSource;
use hexmon_collector::memory::MemorySource;
use hexmon_collector::SampleEngine;
use hexmon_common::types::ThresholdConfig;
use hexmon_notify::channels::{EmailChannel, WebhookChannel};
use hexmon_notify::{Notifier, NotifyChannel};
use hexmon_storage::HistoryStore;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};
use tracing_subscriber::EnvFilter;

use hexmon_server::app;
use hexmon_server::config::MonitorConfig;
use hexmon_server::monitor::Monitor;
use hexmon_server::state::AppState;

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  hexmon-server [config.toml]    Start the monitoring daemon");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hexmon=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        other => {
            let config_path = other.unwrap_or("config/monitor.toml");
            run_server(config_path).await
        }
    }
}

async fn run_server(config_path: &str) -> Result<()> {
    let config = MonitorConfig::load(config_path)?;

    tracing::info!(
        listen = %config.listen_addr,
        data_dir = %config.data_dir,
        host = %config.host_label,
        interval_secs = config.interval_secs,
        retention_days = config.retention_days,
        "hexmon-server starting"
    );

    // Metric sources
    let cpu = CpuSource::new(Duration::from_millis(config.cpu_delta_ms));
    let cores = cpu.core_count().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Could not read core count, assuming 1");
        1
    });
    let db = match &config.database {
        Some(database) => Some(DbSource::connect_lazy(&database.url)?),
        None => {
            tracing::info!("No database configured, database metrics will read zero");
            None
        }
    };
    let engine = SampleEngine::new(
        cpu,
        MemorySource::new(),
        LoadSource::new(),
        DiskSource::new(&config.data_dir),
        db,
    );

    let store = HistoryStore::open(Path::new(&config.data_dir).join("hexmon.db"))?;

    // Runtime thresholds live in the store; seed defaults on first run
    let thresholds = match store.load_thresholds()? {
        Some(saved) => saved,
        None => {
            let seeded = ThresholdConfig::with_defaults(cores);
            store.save_thresholds(&seeded)?;
            tracing::info!(cores, load_abs = seeded.load_abs, "Seeded default thresholds");
            seeded
        }
    };
    let alert_state = store.load_alert_state()?.unwrap_or_default();

    // Notification channels
    let mut channels: Vec<Box<dyn NotifyChannel>> = Vec::new();
    if let Some(email) = &config.email {
        channels.push(Box::new(EmailChannel::new(
            &email.smtp_host,
            email.smtp_port,
            email.username.as_deref(),
            email.password.as_deref(),
            &email.from,
            email.recipients.clone(),
        )?));
    }
    for webhook in &config.webhooks {
        channels.push(Box::new(WebhookChannel::new(&webhook.url)));
    }
    if channels.is_empty() {
        tracing::warn!("No notification channels configured, alerts will only be logged");
    }
    let notifier = Notifier::new(channels);

    let monitor = Arc::new(Monitor::new(
        engine,
        store,
        notifier,
        thresholds,
        alert_state,
        cores,
        config.host_label.clone(),
        config.dashboard_url.clone(),
    ));

    // Sampling loop; a cycle that overruns the interval skips the missed
    // ticks instead of bunching them up.
    let sampler = monitor.clone();
    let interval_secs = config.interval_secs;
    let sampling_handle = tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(interval_secs));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tick.tick().await;
            sampler.run_cycle().await;
        }
    });

    // Retention prune task
    let pruner = monitor.clone();
    let retention_days = config.retention_days;
    let prune_handle = tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(86_400)); // Once a day
        loop {
            tick.tick().await;
            pruner.prune(retention_days);
        }
    });

    // HTTP server
    let http_addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    let http_app = app::build_http_app(AppState {
        monitor: monitor.clone(),
    });

    tracing::info!(http = %http_addr, "Server started");

    tokio::select! {
        result = axum::serve(listener, http_app).with_graceful_shutdown(async { signal::ctrl_c().await.ok(); }) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server error");
            }
        }
        _ = signal::ctrl_c() => {
            tracing::info!("Shutting down gracefully");
        }
    }

    sampling_handle.abort();
    prune_handle.abort();
    tracing::info!("Server stopped");

    Ok(())
}
