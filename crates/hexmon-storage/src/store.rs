use crate::error::Result;
use chrono::{DateTime, Utc};
use hexmon_common::types::{
    AlertState, DbStats, DiskStats, LoadAverage, LogRecord, MemoryStats, Snapshot, ThresholdConfig,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS samples (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp INTEGER NOT NULL,
    cpu_pct REAL NOT NULL,
    cpu_steal_pct REAL NOT NULL,
    cpu_cores INTEGER NOT NULL,
    memory_total INTEGER NOT NULL,
    memory_used INTEGER NOT NULL,
    memory_free INTEGER NOT NULL,
    memory_pct REAL NOT NULL,
    load_one REAL NOT NULL,
    load_five REAL NOT NULL,
    load_fifteen REAL NOT NULL,
    db_cpu_time REAL NOT NULL,
    db_slow_queries INTEGER NOT NULL,
    db_connections INTEGER NOT NULL,
    disk_total INTEGER NOT NULL,
    disk_used INTEGER NOT NULL,
    disk_free INTEGER NOT NULL,
    disk_pct REAL NOT NULL,
    alerting INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_samples_time ON samples(timestamp);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

const SAMPLE_COLUMNS: &str = "timestamp, cpu_pct, cpu_steal_pct, cpu_cores, \
    memory_total, memory_used, memory_free, memory_pct, \
    load_one, load_five, load_fifteen, \
    db_cpu_time, db_slow_queries, db_connections, \
    disk_total, disk_used, disk_free, disk_pct, alerting";

const THRESHOLDS_KEY: &str = "thresholds";
const ALERT_STATE_KEY: &str = "alert_state";

/// Single-file store for the sample history and persisted settings.
///
/// Records are immutable once appended; retention deletes by age only.
pub struct HistoryStore {
    conn: Mutex<Connection>,
}

impl HistoryStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        tracing::info!(path = %path.display(), "Opened history store");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the connection, recovering from a poisoned Mutex if necessary.
    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn append(&self, record: &LogRecord) -> Result<()> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare_cached(&format!(
            "INSERT INTO samples ({SAMPLE_COLUMNS}) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
        ))?;
        let s = &record.snapshot;
        stmt.execute(params![
            s.timestamp.timestamp(),
            s.cpu_pct,
            s.cpu_steal_pct,
            s.cpu_cores,
            s.memory.total_bytes as i64,
            s.memory.used_bytes as i64,
            s.memory.free_bytes as i64,
            s.memory.used_pct,
            s.load.one,
            s.load.five,
            s.load.fifteen,
            s.db.cpu_time,
            s.db.slow_queries as i64,
            s.db.connections as i64,
            s.disk.total_bytes as i64,
            s.disk.used_bytes as i64,
            s.disk.free_bytes as i64,
            s.disk.used_pct,
            record.alerting,
        ])?;
        Ok(())
    }

    /// Records at or after `since`, newest first, capped at `limit` rows.
    /// Timestamps have second resolution; `id` breaks same-second ties.
    pub fn recent(&self, since: DateTime<Utc>, limit: u32) -> Result<Vec<LogRecord>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {SAMPLE_COLUMNS} FROM samples \
             WHERE timestamp >= ?1 ORDER BY timestamp DESC, id DESC LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![since.timestamp(), limit], row_to_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// The most recently appended record, if any.
    pub fn latest(&self) -> Result<Option<LogRecord>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {SAMPLE_COLUMNS} FROM samples ORDER BY timestamp DESC, id DESC LIMIT 1"
        ))?;
        Ok(stmt.query_row([], row_to_record).optional()?)
    }

    /// Deletes records strictly older than the cutoff. Returns the count.
    pub fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let conn = self.lock_conn();
        let deleted = conn.execute(
            "DELETE FROM samples WHERE timestamp < ?1",
            params![cutoff.timestamp()],
        )?;
        if deleted > 0 {
            tracing::info!(deleted, "Pruned expired samples");
        }
        Ok(deleted)
    }

    pub fn load_thresholds(&self) -> Result<Option<ThresholdConfig>> {
        self.load_setting(THRESHOLDS_KEY)
    }

    pub fn save_thresholds(&self, config: &ThresholdConfig) -> Result<()> {
        self.save_setting(THRESHOLDS_KEY, config)
    }

    pub fn load_alert_state(&self) -> Result<Option<AlertState>> {
        self.load_setting(ALERT_STATE_KEY)
    }

    pub fn save_alert_state(&self, state: &AlertState) -> Result<()> {
        self.save_setting(ALERT_STATE_KEY, state)
    }

    fn load_setting<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare_cached("SELECT value FROM settings WHERE key = ?1")?;
        let value: Option<String> = stmt
            .query_row(params![key], |row| row.get(0))
            .optional()?;
        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save_setting<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        let conn = self.lock_conn();
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, json],
        )?;
        Ok(())
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<LogRecord> {
    let ts: i64 = row.get(0)?;
    Ok(LogRecord {
        snapshot: Snapshot {
            timestamp: DateTime::from_timestamp(ts, 0).unwrap_or_default(),
            cpu_pct: row.get(1)?,
            cpu_steal_pct: row.get(2)?,
            cpu_cores: row.get(3)?,
            memory: MemoryStats {
                total_bytes: row.get::<_, i64>(4)? as u64,
                used_bytes: row.get::<_, i64>(5)? as u64,
                free_bytes: row.get::<_, i64>(6)? as u64,
                used_pct: row.get(7)?,
            },
            load: LoadAverage {
                one: row.get(8)?,
                five: row.get(9)?,
                fifteen: row.get(10)?,
            },
            db: DbStats {
                cpu_time: row.get(11)?,
                slow_queries: row.get::<_, i64>(12)? as u64,
                connections: row.get::<_, i64>(13)? as u64,
            },
            disk: DiskStats {
                total_bytes: row.get::<_, i64>(14)? as u64,
                used_bytes: row.get::<_, i64>(15)? as u64,
                free_bytes: row.get::<_, i64>(16)? as u64,
                used_pct: row.get(17)?,
            },
        },
        alerting: row.get(18)?,
    })
}
