//! Metric sources and the engine that assembles them into snapshots.
//!
//! Each source reads one category of host state: CPU counters, memory,
//! load averages, disk usage, database pressure. Sources fail independently;
//! the engine substitutes zero values for a failed source and finishes the
//! cycle, so one bad reading never aborts monitoring.

pub mod cpu;
pub mod db;
pub mod disk;
pub mod error;
pub mod load;
pub mod memory;


pub use error::{Result, SourceError};

use chrono::Utc;
use hexmon_common::types::{DbStats, MemoryStats, Snapshot};

use cpu::CpuSource;
use db::DbSource;
use disk::DiskSource;
use load::LoadSource;
use memory::MemorySource;

/// Assembles one [`Snapshot`] per measurement cycle.
pub struct SampleEngine {
    cpu: CpuSource,
    memory: MemorySource,
    load: LoadSource,
    disk: DiskSource,
    db: Option<DbSource>,
}

impl SampleEngine {
    pub fn new(
        cpu: CpuSource,
        memory: MemorySource,
        load: LoadSource,
        disk: DiskSource,
        db: Option<DbSource>,
    ) -> Self {
        Self {
            cpu,
            memory,
            load,
            disk,
            db,
        }
    }

    /// Runs one measurement cycle. The only suspension points are the CPU
    /// source's two-read delta and the database round-trip.
    pub async fn capture(&self) -> Snapshot {
        let (cpu_pct, cpu_steal_pct) = match self.cpu.sample().await {
            Ok(reading) => (reading.usage_pct, reading.steal_pct),
            Err(e) => {
                tracing::warn!(source = "cpu", error = %e, "Metric source degraded");
                (0.0, 0.0)
            }
        };

        let cpu_cores = match self.cpu.core_count() {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(source = "cpu_cores", error = %e, "Metric source degraded");
                0
            }
        };

        let memory = match self.memory.sample() {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(source = "memory", error = %e, "Metric source degraded");
                MemoryStats::default()
            }
        };

        let load = self.load.sample();
        let disk = self.disk.sample();

        let db = match &self.db {
            Some(source) => match source.sample().await {
                Ok(stats) => stats,
                Err(e) => {
                    tracing::warn!(source = "db", error = %e, "Metric source degraded");
                    DbStats::default()
                }
            },
            None => DbStats::default(),
        };

        Snapshot {
            timestamp: Utc::now(),
            cpu_pct,
            cpu_steal_pct,
            cpu_cores,
            memory,
            load,
            db,
            disk,
        }
    }
}
