use crate::error::{Result, SourceError};
use hexmon_common::types::MemoryStats;
use std::path::PathBuf;

/// Reads memory usage from the kernel meminfo file. Buffers and page cache
/// count as free, matching what an operator considers reclaimable.
pub struct MemorySource {
    proc_root: PathBuf,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::with_proc_root("/proc")
    }

    pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }

    pub fn sample(&self) -> Result<MemoryStats> {
        let path = self.proc_root.join("meminfo");
        let contents = std::fs::read_to_string(&path).map_err(|source| SourceError::Read {
            path: path.clone(),
            source,
        })?;
        parse_meminfo(&contents).ok_or_else(|| SourceError::Parse {
            path,
            detail: "missing MemTotal".to_string(),
        })
    }
}

/// Values in the meminfo file are kilobytes. A total of zero yields a zero
/// percentage rather than a division by zero.
pub(crate) fn parse_meminfo(contents: &str) -> Option<MemoryStats> {
    let mut total_kb: Option<u64> = None;
    let mut free_kb: u64 = 0;
    let mut buffers_kb: u64 = 0;
    let mut cached_kb: u64 = 0;

    for line in contents.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let Some(value_kb) = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok())
        else {
            continue;
        };
        match key {
            "MemTotal" => total_kb = Some(value_kb),
            "MemFree" => free_kb = value_kb,
            "Buffers" => buffers_kb = value_kb,
            "Cached" => cached_kb = value_kb,
            _ => {}
        }
    }

    let total = total_kb? * 1024;
    let free = (free_kb + buffers_kb + cached_kb) * 1024;
    let used = total.saturating_sub(free);
    let used_pct = if total == 0 {
        0.0
    } else {
        (used as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
    };

    Some(MemoryStats {
        total_bytes: total,
        used_bytes: used,
        free_bytes: free,
        used_pct,
    })
}
