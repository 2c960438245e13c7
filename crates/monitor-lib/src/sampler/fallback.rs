//! `sysinfo` based sampling for hosts without procfs

use super::CpuSampler;
use crate::error::SampleError;
use crate::models::CpuSample;
use async_trait::async_trait;
use std::time::Duration;
use sysinfo::System;
use tokio::sync::Mutex;

pub struct SysinfoSampler {
    system: Mutex<System>,
}

impl SysinfoSampler {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CpuSampler for SysinfoSampler {
    async fn sample(&self, window: Duration) -> Result<CpuSample, SampleError> {
        let mut system = self.system.lock().await;

        // sysinfo needs two refreshes at least MINIMUM_CPU_UPDATE_INTERVAL apart
        system.refresh_cpu();
        tokio::time::sleep(window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL)).await;
        system.refresh_cpu();

        let usage = system.global_cpu_info().cpu_usage() as f64;
        CpuSample::now(usage).ok_or(SampleError::InvalidReading)
    }

    fn name(&self) -> &'static str {
        "sysinfo"
    }
}
