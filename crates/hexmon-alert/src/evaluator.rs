use hexmon_common::types::{Metric, Snapshot, ThresholdConfig, Violation};

/// Fixed alert floor for hypervisor steal, percent. Steal is an anomaly
/// indicator, not a tunable limit.
pub const STEAL_ALERT_PCT: f64 = 5.0;

/// Compares one snapshot against the configured limits.
///
/// Stateless and deterministic. Violations come back in a fixed order (CPU,
/// memory, load, database CPU, slow queries, steal) so notification text is
/// reproducible. Every comparison is strict greater-than; a reading exactly
/// at its threshold does not violate.
pub fn evaluate(snapshot: &Snapshot, config: &ThresholdConfig) -> Vec<Violation> {
    let mut violations = Vec::new();

    if snapshot.cpu_pct > config.cpu_pct {
        violations.push(Violation {
            metric: Metric::Cpu,
            observed: snapshot.cpu_pct,
            threshold: config.cpu_pct,
            message: format!(
                "CPU usage is {:.1}% (threshold: {}%)",
                snapshot.cpu_pct, config.cpu_pct
            ),
        });
    }

    if snapshot.memory.used_pct > config.memory_pct {
        violations.push(Violation {
            metric: Metric::Memory,
            observed: snapshot.memory.used_pct,
            threshold: config.memory_pct,
            message: format!(
                "Memory usage is {:.1}% (threshold: {}%)",
                snapshot.memory.used_pct, config.memory_pct
            ),
        });
    }

    // Only the 1-minute window is thresholded; 5 and 15 are display-only.
    if snapshot.load.one > config.load_abs {
        violations.push(Violation {
            metric: Metric::Load,
            observed: snapshot.load.one,
            threshold: config.load_abs,
            message: format!(
                "Load average is {:.2} (threshold: {})",
                snapshot.load.one, config.load_abs
            ),
        });
    }

    if snapshot.db.cpu_time > config.db_cpu {
        violations.push(Violation {
            metric: Metric::DbCpu,
            observed: snapshot.db.cpu_time,
            threshold: config.db_cpu,
            message: format!(
                "MySQL CPU time is {:.0}s (threshold: {}s)",
                snapshot.db.cpu_time, config.db_cpu
            ),
        });
    }

    if snapshot.db.slow_queries > config.slow_queries {
        violations.push(Violation {
            metric: Metric::SlowQueries,
            observed: snapshot.db.slow_queries as f64,
            threshold: config.slow_queries as f64,
            message: format!(
                "Slow queries: {} (threshold: {})",
                snapshot.db.slow_queries, config.slow_queries
            ),
        });
    }

    if snapshot.cpu_steal_pct > STEAL_ALERT_PCT {
        violations.push(Violation {
            metric: Metric::CpuSteal,
            observed: snapshot.cpu_steal_pct,
            threshold: STEAL_ALERT_PCT,
            message: format!(
                "CPU steal is {:.1}% (possible hypervisor contention)",
                snapshot.cpu_steal_pct
            ),
        });
    }

    violations
}
