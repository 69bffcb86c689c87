use hexmon_common::types::LoadAverage;
use sysinfo::System;

pub struct LoadSource;

impl LoadSource {
    pub fn new() -> Self {
        Self
    }

    /// Load averages over the three fixed kernel windows. Platforms without
    /// a load facility report zeros.
    pub fn sample(&self) -> LoadAverage {
        let avg = System::load_average();
        LoadAverage {
            one: avg.one,
            five: avg.five,
            fifteen: avg.fifteen,
        }
    }
}
