//! Host CPU utilization sampling
//!
//! Samplers block for the whole averaging window and return the mean
//! utilization across all cores over that window. `/proc/stat` is read
//! directly when available; other hosts fall back to `sysinfo`.

mod fallback;
mod proc_stat;


pub use fallback::SysinfoSampler;
pub use proc_stat::{CpuTimes, ProcStatSampler};

use crate::error::SampleError;
use crate::models::CpuSample;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub use async_trait::async_trait;

/// Source of averaged CPU utilization readings
#[async_trait]
pub trait CpuSampler: Send + Sync {
    /// Block for `window` and return the utilization averaged over it
    async fn sample(&self, window: Duration) -> Result<CpuSample, SampleError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<T: CpuSampler + ?Sized> CpuSampler for Arc<T> {
    async fn sample(&self, window: Duration) -> Result<CpuSample, SampleError> {
        (**self).sample(window).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Create the appropriate sampler for this host
pub async fn create_sampler(proc_root: &Path) -> Arc<dyn CpuSampler> {
    let sampler = ProcStatSampler::new(proc_root);

    if sampler.is_available().await {
        tracing::info!(path = %sampler.stat_path().display(), "Using procfs CPU sampler");
        Arc::new(sampler)
    } else {
        tracing::warn!(
            path = %sampler.stat_path().display(),
            "procfs stat file unavailable, falling back to sysinfo sampler"
        );
        Arc::new(SysinfoSampler::new())
    }
}
