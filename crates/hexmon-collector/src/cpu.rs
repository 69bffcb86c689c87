use crate::error::{Result, SourceError};
use std::path::PathBuf;
use std::time::Duration;

/// Cumulative CPU time counters from the aggregate `cpu` line of the kernel
/// stat file. Values only ever grow; utilization is the delta between two
/// reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    /// Absent on kernels that do not report steal; treated as zero.
    pub steal: Option<u64>,
}

impl CpuTimes {
    fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }

    fn total(&self) -> u64 {
        self.user + self.nice + self.system + self.idle + self.iowait + self.irq + self.softirq
    }
}

/// Result of one two-read CPU sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuReading {
    pub usage_pct: f64,
    pub steal_pct: f64,
}

/// Reads aggregate CPU utilization from the kernel stat file using two reads
/// separated by a short delta, plus the logical core count.
///
/// The procfs root is a constructor parameter so tests can point the source
/// at a fixture directory.
pub struct CpuSource {
    proc_root: PathBuf,
    delta: Duration,
}

impl CpuSource {
    pub fn new(delta: Duration) -> Self {
        Self::with_proc_root("/proc", delta)
    }

    pub fn with_proc_root(proc_root: impl Into<PathBuf>, delta: Duration) -> Self {
        Self {
            proc_root: proc_root.into(),
            delta,
        }
    }

    /// Utilization and steal over one sampling delta.
    ///
    /// Suspends for the configured delta between the two counter reads; this
    /// is the only await point in a measurement cycle. Steal is computed from
    /// the second read's cumulative counters.
    pub async fn sample(&self) -> Result<CpuReading> {
        let first = self.read_times()?;
        tokio::time::sleep(self.delta).await;
        let second = self.read_times()?;

        Ok(CpuReading {
            usage_pct: utilization_between(first, second),
            steal_pct: steal_pct(second),
        })
    }

    /// Number of logical processors, at least 1.
    pub fn core_count(&self) -> Result<u32> {
        let path = self.proc_root.join("cpuinfo");
        let contents = std::fs::read_to_string(&path).map_err(|source| SourceError::Read {
            path: path.clone(),
            source,
        })?;
        let count = contents
            .lines()
            .filter(|line| line.starts_with("processor"))
            .count() as u32;
        Ok(count.max(1))
    }

    fn read_times(&self) -> Result<CpuTimes> {
        let path = self.proc_root.join("stat");
        let contents = std::fs::read_to_string(&path).map_err(|source| SourceError::Read {
            path: path.clone(),
            source,
        })?;
        parse_cpu_line(&contents).ok_or_else(|| SourceError::Parse {
            path,
            detail: "no aggregate cpu line".to_string(),
        })
    }
}

/// Parses the aggregate `cpu ` line (per-core `cpuN` lines are skipped).
/// Requires the first seven fields; the eighth (steal) is optional.
pub(crate) fn parse_cpu_line(stat: &str) -> Option<CpuTimes> {
    let line = stat.lines().find(|line| line.starts_with("cpu "))?;
    let values: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map_while(|field| field.parse().ok())
        .collect();
    if values.len() < 7 {
        return None;
    }
    Some(CpuTimes {
        user: values[0],
        nice: values[1],
        system: values[2],
        idle: values[3],
        iowait: values[4],
        irq: values[5],
        softirq: values[6],
        steal: values.get(7).copied(),
    })
}

/// Utilization between two counter reads: the share of the elapsed total
/// that was not idle or iowait. Zero when the counters did not advance.
pub(crate) fn utilization_between(first: CpuTimes, second: CpuTimes) -> f64 {
    let diff_idle = second.idle_total().saturating_sub(first.idle_total());
    let diff_total = second.total().saturating_sub(first.total());
    if diff_total == 0 {
        return 0.0;
    }
    100.0 - (diff_idle as f64 / diff_total as f64) * 100.0
}

/// Steal share of all time accounted since boot, from a single read.
pub(crate) fn steal_pct(times: CpuTimes) -> f64 {
    let Some(steal) = times.steal else {
        return 0.0;
    };
    let total = times.total() + steal;
    if total == 0 {
        return 0.0;
    }
    (steal as f64 / total as f64) * 100.0
}
