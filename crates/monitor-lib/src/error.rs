//! Error types for sampling and publishing

use crate::models::HealthState;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain a CPU utilization reading
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed cpu statistics in {path}: {reason}")]
    Malformed {
        path: PathBuf,
        #[source]
        reason: StatParseError,
    },

    #[error("sampler returned an invalid reading")]
    InvalidReading,
}

/// Why a `/proc/stat` snapshot could not be parsed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatParseError {
    #[error("no aggregate cpu line")]
    MissingCpuLine,

    #[error("bad counter {0:?}")]
    BadCounter(String),

    #[error("expected at least 4 counters, found {0}")]
    TooFewCounters(usize),

    #[error("counters overflow when summed")]
    Overflow,
}

/// Failure to replace the target artifact
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("no template is defined for state {0}")]
    NoTemplate(HealthState),

    #[error("template {0} does not exist")]
    TemplateMissing(PathBuf),

    #[error("failed to copy {template} to {target}: {source}")]
    Io {
        template: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a single sample → classify → publish cycle
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("sampling failed: {0}")]
    Sample(#[from] SampleError),

    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}

impl CycleError {
    /// Stage label used in metrics and logs
    pub fn stage(&self) -> &'static str {
        match self {
            CycleError::Sample(_) => "sample",
            CycleError::Publish(_) => "publish",
        }
    }
}
