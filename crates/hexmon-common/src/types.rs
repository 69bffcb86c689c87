use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One measurement cycle's complete set of host metrics.
///
/// Built once per cycle by the sample engine and never mutated afterwards.
/// Fields whose source failed during the cycle hold zero values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    /// Aggregate CPU utilization over the sampling delta, 0-100.
    pub cpu_pct: f64,
    /// Share of time stolen by the hypervisor, 0-100.
    pub cpu_steal_pct: f64,
    pub cpu_cores: u32,
    pub memory: MemoryStats,
    pub load: LoadAverage,
    pub db: DbStats,
    pub disk: DiskStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub used_pct: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DbStats {
    /// Sum of in-flight statement times from the process list, in seconds.
    /// A pressure proxy, not a true CPU figure.
    pub cpu_time: f64,
    /// Cumulative slow query counter since database start.
    pub slow_queries: u64,
    pub connections: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskStats {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub used_pct: f64,
}

/// Monitored metric, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Cpu,
    Memory,
    Load,
    DbCpu,
    SlowQueries,
    CpuSteal,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Cpu => write!(f, "cpu"),
            Metric::Memory => write!(f, "memory"),
            Metric::Load => write!(f, "load"),
            Metric::DbCpu => write!(f, "db_cpu"),
            Metric::SlowQueries => write!(f, "slow_queries"),
            Metric::CpuSteal => write!(f, "cpu_steal"),
        }
    }
}

/// A single metric exceeding its configured threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub metric: Metric,
    pub observed: f64,
    pub threshold: f64,
    pub message: String,
}

/// Alert thresholds and notification policy.
///
/// Persisted in the settings store; seeded on first run from
/// [`ThresholdConfig::with_defaults`] and changed only through the
/// configuration interface.
///
/// # Examples
///
/// ```
/// use hexmon_common::types::ThresholdConfig;
///
/// let config = ThresholdConfig::with_defaults(4);
/// assert_eq!(config.cpu_pct, 80.0);
/// assert_eq!(config.load_abs, 8.0);
/// assert!(config.validate().is_ok());
///
/// let mut bad = config.clone();
/// bad.alert_cooldown_secs = 10;
/// assert!(bad.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// CPU utilization alert threshold, percent.
    pub cpu_pct: f64,
    /// Memory usage alert threshold, percent.
    pub memory_pct: f64,
    /// 1-minute load average alert threshold, absolute.
    pub load_abs: f64,
    /// Database process-list time alert threshold, seconds.
    pub db_cpu: f64,
    /// Slow queries counter alert threshold.
    pub slow_queries: u64,
    /// Minimum seconds between two alert notifications.
    pub alert_cooldown_secs: u64,
    pub notifications_enabled: bool,
}

impl ThresholdConfig {
    /// Default thresholds for a host with the given core count.
    pub fn with_defaults(cores: u32) -> Self {
        Self {
            cpu_pct: 80.0,
            memory_pct: 85.0,
            load_abs: Self::recommended_load(cores),
            db_cpu: 50.0,
            slow_queries: 10,
            alert_cooldown_secs: 300,
            notifications_enabled: true,
        }
    }

    /// Recommended 1-minute load threshold: twice the core count.
    pub fn recommended_load(cores: u32) -> f64 {
        f64::from(cores.max(1) * 2)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.cpu_pct > 0.0 && self.cpu_pct <= 100.0) {
            return Err(format!("cpu_pct must be in (0, 100]: {}", self.cpu_pct));
        }
        if !(self.memory_pct > 0.0 && self.memory_pct <= 100.0) {
            return Err(format!(
                "memory_pct must be in (0, 100]: {}",
                self.memory_pct
            ));
        }
        if !(self.load_abs > 0.0) {
            return Err(format!("load_abs must be positive: {}", self.load_abs));
        }
        if !(self.db_cpu > 0.0) {
            return Err(format!("db_cpu must be positive: {}", self.db_cpu));
        }
        if self.slow_queries < 1 {
            return Err("slow_queries must be at least 1".to_string());
        }
        if self.alert_cooldown_secs < 60 {
            return Err(format!(
                "alert_cooldown_secs must be at least 60: {}",
                self.alert_cooldown_secs
            ));
        }
        if self.alert_cooldown_secs > 86_400 {
            return Err(format!(
                "alert_cooldown_secs must be at most 86400: {}",
                self.alert_cooldown_secs
            ));
        }
        Ok(())
    }
}

/// Alert lifecycle state, persisted between cycles and across restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertState {
    pub active: bool,
    /// When the last alert notification went out. Recovery notifications
    /// do not touch this; only alerts are cooldown-gated.
    pub last_notified_at: Option<DateTime<Utc>>,
}

/// Durable form of one cycle: the snapshot plus whether any threshold was
/// breached that cycle. `alerting` means a violation was detected, not that
/// a notification was delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub snapshot: Snapshot,
    pub alerting: bool,
}
