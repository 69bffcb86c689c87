use chrono::{DateTime, Duration, Utc};
use hexmon_alert::{evaluate, AlertStateMachine, Decision};
use hexmon_collector::SampleEngine;
use hexmon_common::types::{AlertState, LogRecord, Snapshot, ThresholdConfig};
use hexmon_notify::{Notification, Notifier};
use hexmon_storage::HistoryStore;
use std::sync::{Mutex, MutexGuard};

/// Rows returned by a single history query, regardless of window size.
const HISTORY_LIMIT: u32 = 1000;

/// Why a threshold update did not take effect.
#[derive(Debug, thiserror::Error)]
pub enum ThresholdUpdateError {
    /// The patched config failed validation; nothing was written.
    #[error("{0}")]
    Invalid(String),
    #[error("failed to persist thresholds: {0}")]
    Store(#[from] hexmon_storage::StoreError),
}

/// Owns one host's monitoring pipeline: sampling, evaluation, alert state,
/// history and notification dispatch.
///
/// Cycles are driven externally (one `run_cycle` per tick, never overlapping);
/// the HTTP handlers only read. Shared fields sit behind mutexes held for
/// short lock-then-copy sections, so a cycle never blocks a status request
/// for longer than a field copy.
pub struct Monitor {
    engine: SampleEngine,
    store: HistoryStore,
    notifier: Notifier,
    thresholds: Mutex<ThresholdConfig>,
    alert_state: Mutex<AlertState>,
    latest: Mutex<Option<Snapshot>>,
    cores: u32,
    host: String,
    dashboard_url: String,
}

impl Monitor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: SampleEngine,
        store: HistoryStore,
        notifier: Notifier,
        thresholds: ThresholdConfig,
        alert_state: AlertState,
        cores: u32,
        host: String,
        dashboard_url: String,
    ) -> Self {
        Self {
            engine,
            store,
            notifier,
            thresholds: Mutex::new(thresholds),
            alert_state: Mutex::new(alert_state),
            latest: Mutex::new(None),
            cores,
            host,
            dashboard_url,
        }
    }

    /// Runs one measurement cycle: capture, evaluate, transition the alert
    /// state, persist, dispatch. Persistence failures are logged and the
    /// cycle continues; a lost sample never stops monitoring.
    pub async fn run_cycle(&self) {
        let snapshot = self.engine.capture().await;
        let config = self.thresholds();

        let violations = evaluate(&snapshot, &config);
        let alerting = !violations.is_empty();

        let machine = AlertStateMachine::new(config.alert_cooldown_secs);
        let (decision, state_after) = {
            let mut state = self.lock_alert_state();
            let decision = machine.process(&mut state, &violations, snapshot.timestamp);
            (decision, *state)
        };

        tracing::info!(
            cpu_pct = snapshot.cpu_pct,
            memory_pct = snapshot.memory.used_pct,
            load_one = snapshot.load.one,
            violations = violations.len(),
            "Cycle complete"
        );

        let record = LogRecord {
            snapshot: snapshot.clone(),
            alerting,
        };
        if let Err(e) = self.store.append(&record) {
            tracing::error!(error = %e, "Failed to append history record");
        }
        // Quiet and suppressed cycles leave the alert state unchanged.
        if matches!(decision, Decision::Alert { .. } | Decision::Recovery) {
            if let Err(e) = self.store.save_alert_state(&state_after) {
                tracing::error!(error = %e, "Failed to persist alert state");
            }
        }

        let timestamp = snapshot.timestamp;
        *self.lock_latest() = Some(snapshot);

        match decision {
            Decision::Alert { messages } if config.notifications_enabled => {
                tracing::info!(violations = messages.len(), "Thresholds exceeded, dispatching alert");
                self.notifier.dispatch(Notification::alert(
                    messages,
                    self.host.clone(),
                    timestamp,
                    self.dashboard_url.clone(),
                ));
            }
            Decision::Recovery if config.notifications_enabled => {
                tracing::info!("Resources recovered, dispatching recovery notice");
                self.notifier.dispatch(Notification::recovery(
                    self.host.clone(),
                    timestamp,
                    self.dashboard_url.clone(),
                ));
            }
            Decision::Alert { .. } | Decision::Recovery => {
                tracing::debug!("Notifications disabled, skipping dispatch");
            }
            Decision::Suppressed | Decision::Quiet => {}
        }
    }

    /// Deletes history older than the retention window. The store logs what
    /// it removed; only failures are reported here.
    pub fn prune(&self, retention_days: u32) {
        let cutoff = Utc::now() - Duration::days(i64::from(retention_days));
        if let Err(e) = self.store.prune(cutoff) {
            tracing::error!(error = %e, "History prune failed");
        }
    }

    pub fn latest_snapshot(&self) -> Option<Snapshot> {
        self.lock_latest().clone()
    }

    pub fn alert_state(&self) -> AlertState {
        *self.lock_alert_state()
    }

    pub fn history(&self, hours: u32) -> hexmon_storage::Result<Vec<LogRecord>> {
        let since = Utc::now()
            .checked_sub_signed(Duration::hours(i64::from(hours)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.store.recent(since, HISTORY_LIMIT)
    }

    pub fn thresholds(&self) -> ThresholdConfig {
        self.lock_thresholds().clone()
    }

    /// Load threshold derived from the core count, for display next to the
    /// configured value.
    pub fn recommended_load(&self) -> f64 {
        ThresholdConfig::recommended_load(self.cores)
    }

    /// Edits the threshold config as one read-modify-write: the lock is held
    /// across `apply`, validation and the store write, so concurrent updates
    /// serialize and each one patches the latest committed values. The
    /// in-memory copy only changes once the store accepted the write.
    pub fn update_thresholds(
        &self,
        apply: impl FnOnce(&mut ThresholdConfig),
    ) -> Result<ThresholdConfig, ThresholdUpdateError> {
        let mut current = self.lock_thresholds();
        let mut updated = current.clone();
        apply(&mut updated);
        updated.validate().map_err(ThresholdUpdateError::Invalid)?;
        self.store.save_thresholds(&updated)?;
        *current = updated.clone();
        Ok(updated)
    }

    /// Lock the threshold config, recovering from a poisoned Mutex if necessary.
    fn lock_thresholds(&self) -> MutexGuard<'_, ThresholdConfig> {
        self.thresholds
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Lock the alert state, recovering from a poisoned Mutex if necessary.
    fn lock_alert_state(&self) -> MutexGuard<'_, AlertState> {
        self.alert_state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Lock the latest snapshot, recovering from a poisoned Mutex if necessary.
    fn lock_latest(&self) -> MutexGuard<'_, Option<Snapshot>> {
        self.latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
