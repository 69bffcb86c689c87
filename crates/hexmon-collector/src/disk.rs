use hexmon_common::types::DiskStats;
use std::path::PathBuf;
use sysinfo::Disks;

/// Usage of the filesystem holding the data root. Recorded for display,
/// never thresholded.
pub struct DiskSource {
    data_root: PathBuf,
}

impl DiskSource {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    pub fn sample(&self) -> DiskStats {
        let target = self
            .data_root
            .canonicalize()
            .unwrap_or_else(|_| self.data_root.clone());
        let disks = Disks::new_with_refreshed_list();

        // Longest mount-point prefix wins, so /data/db matches /data over /.
        let mut best: Option<(usize, DiskStats)> = None;
        for disk in disks.iter() {
            let mount = disk.mount_point();
            if !target.starts_with(mount) {
                continue;
            }
            let depth = mount.components().count();
            if best.as_ref().is_some_and(|(d, _)| *d >= depth) {
                continue;
            }

            let total = disk.total_space();
            let available = disk.available_space();
            let used = total.saturating_sub(available);
            let used_pct = if total > 0 {
                (used as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            best = Some((
                depth,
                DiskStats {
                    total_bytes: total,
                    used_bytes: used,
                    free_bytes: available,
                    used_pct,
                },
            ));
        }

        best.map(|(_, stats)| stats).unwrap_or_default()
    }
}
