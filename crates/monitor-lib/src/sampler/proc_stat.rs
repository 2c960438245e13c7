//! `/proc/stat` CPU sampling
//!
//! Reads the aggregate `cpu` line twice, one window apart:
//! - busy time is everything except idle and iowait
//! - guest columns are excluded since the kernel already counts them in user/nice

use super::CpuSampler;
use crate::error::{SampleError, StatParseError};
use crate::models::CpuSample;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Cumulative jiffy counters from the aggregate `cpu` line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuTimes {
    pub total: u64,
    pub idle: u64,
}

impl CpuTimes {
    /// Parse the aggregate `cpu` line out of `/proc/stat` contents
    pub fn parse(content: &str) -> Result<Self, StatParseError> {
        let line = content
            .lines()
            .find(|l| l.starts_with("cpu "))
            .ok_or(StatParseError::MissingCpuLine)?;

        let fields: Vec<u64> = line
            .split_whitespace()
            .skip(1)
            .map(|v| {
                v.parse::<u64>()
                    .map_err(|_| StatParseError::BadCounter(v.to_string()))
            })
            .collect::<Result<_, _>>()?;

        if fields.len() < 4 {
            return Err(StatParseError::TooFewCounters(fields.len()));
        }

        // user nice system idle iowait irq softirq steal [guest guest_nice]
        let total = fields
            .iter()
            .take(8)
            .try_fold(0u64, |acc, v| acc.checked_add(*v))
            .ok_or(StatParseError::Overflow)?;
        let idle = fields[3]
            .checked_add(fields.get(4).copied().unwrap_or(0))
            .ok_or(StatParseError::Overflow)?;

        Ok(Self { total, idle })
    }

    /// Busy percentage between two snapshots
    pub fn utilization_since(&self, earlier: &CpuTimes) -> f64 {
        let total = self.total.saturating_sub(earlier.total);
        if total == 0 {
            return 0.0;
        }
        let idle = self.idle.saturating_sub(earlier.idle).min(total);
        (total - idle) as f64 / total as f64 * 100.0
    }
}

/// Sampler backed by the procfs `stat` file
pub struct ProcStatSampler {
    stat_path: PathBuf,
}

impl ProcStatSampler {
    pub fn new(proc_root: impl AsRef<Path>) -> Self {
        Self {
            stat_path: proc_root.as_ref().join("stat"),
        }
    }

    pub fn stat_path(&self) -> &Path {
        &self.stat_path
    }

    pub async fn is_available(&self) -> bool {
        self.read_times().await.is_ok()
    }

    async fn read_times(&self) -> Result<CpuTimes, SampleError> {
        let content = fs::read_to_string(&self.stat_path)
            .await
            .map_err(|source| SampleError::Read {
                path: self.stat_path.clone(),
                source,
            })?;

        CpuTimes::parse(&content).map_err(|reason| SampleError::Malformed {
            path: self.stat_path.clone(),
            reason,
        })
    }
}

#[async_trait]
impl CpuSampler for ProcStatSampler {
    async fn sample(&self, window: Duration) -> Result<CpuSample, SampleError> {
        let before = self.read_times().await?;
        tokio::time::sleep(window).await;
        let after = self.read_times().await?;

        CpuSample::now(after.utilization_since(&before)).ok_or(SampleError::InvalidReading)
    }

    fn name(&self) -> &'static str {
        "procfs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "cpu  100 0 100 700 100 0 0 0 0 0\n\
                        cpu0 50 0 50 350 50 0 0 0 0 0\n\
                        intr 12345\n";

    #[test]
    fn test_parse_aggregate_line() {
        let times = CpuTimes::parse(STAT).unwrap();
        assert_eq!(times.total, 1000);
        assert_eq!(times.idle, 800);
    }

    #[test]
    fn test_parse_excludes_guest_columns() {
        let times = CpuTimes::parse("cpu  10 0 10 80 0 0 0 0 500 500\n").unwrap();
        assert_eq!(times.total, 100);
    }

    #[test]
    fn test_parse_old_kernel_format() {
        let times = CpuTimes::parse("cpu 10 20 30 40\n").unwrap();
        assert_eq!(times.total, 100);
        assert_eq!(times.idle, 40);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            CpuTimes::parse("intr 1 2 3\n"),
            Err(StatParseError::MissingCpuLine)
        );
        assert_eq!(
            CpuTimes::parse("cpu 1 2\n"),
            Err(StatParseError::TooFewCounters(2))
        );
        assert_eq!(
            CpuTimes::parse("cpu a b c d\n"),
            Err(StatParseError::BadCounter("a".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_overflowing_counters() {
        assert_eq!(
            CpuTimes::parse("cpu  18446744073709551615 1 0 0\n"),
            Err(StatParseError::Overflow)
        );
        assert_eq!(
            CpuTimes::parse("cpu  0 0 0 18446744073709551615 1\n"),
            Err(StatParseError::Overflow)
        );
    }

    #[test]
    fn test_utilization_since() {
        let before = CpuTimes { total: 1000, idle: 800 };
        let after = CpuTimes { total: 2000, idle: 900 };
        assert!((after.utilization_since(&before) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_utilization_without_progress_is_zero() {
        let t = CpuTimes { total: 1000, idle: 800 };
        assert_eq!(t.utilization_since(&t), 0.0);
    }
}
