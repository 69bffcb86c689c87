use crate::error::Result;
use hexmon_common::types::DbStats;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySqlPool, Row};
use std::time::Duration;

/// Reads database engine pressure through administrative queries: the sum of
/// in-flight statement times from the process list plus two global counters.
pub struct DbSource {
    pool: MySqlPool,
}

impl DbSource {
    /// Builds the source without connecting; the first sample establishes
    /// the connection, so a database that is down at startup only degrades
    /// samples instead of failing boot.
    pub fn connect_lazy(url: &str) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(url)?;
        Ok(Self { pool })
    }

    pub async fn sample(&self) -> Result<DbStats> {
        let cpu_time: i64 = sqlx::query_scalar(
            "SELECT CAST(COALESCE(SUM(TIME), 0) AS SIGNED) \
             FROM information_schema.PROCESSLIST WHERE TIME > 0",
        )
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            "SHOW GLOBAL STATUS WHERE Variable_name IN ('Slow_queries', 'Threads_connected')",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut slow_queries = 0u64;
        let mut connections = 0u64;
        for row in rows {
            let name: String = row.try_get("Variable_name")?;
            let value: String = row.try_get("Value")?;
            let value = value.parse::<u64>().unwrap_or(0);
            match name.as_str() {
                "Slow_queries" => slow_queries = value,
                "Threads_connected" => connections = value,
                _ => {}
            }
        }

        Ok(DbStats {
            cpu_time: cpu_time.max(0) as f64,
            slow_queries,
            connections,
        })
    }
}
