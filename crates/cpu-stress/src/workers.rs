//! CPU burn workers
//!
//! One OS thread per core, each spinning on arithmetic until its own
//! deadline. Workers share nothing, so there is no synchronization to eat
//! into the delivered load; the parent only joins them.

use std::hint::black_box;
use std::num::NonZeroUsize;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Arithmetic steps between deadline checks
const STEPS_PER_CHECK: u32 = 10_000;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to spawn worker {index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} worker(s) panicked")]
    WorkerPanicked(usize),
}

/// What every worker is asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSpec {
    pub duration: Duration,
}

impl WorkerSpec {
    pub fn from_secs(secs: u64) -> Self {
        Self {
            duration: Duration::from_secs(secs),
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Copy)]
pub struct LoadReport {
    pub workers: usize,
    pub elapsed: Duration,
}

/// Number of logical cores, at least one
pub fn available_cores() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Deadline `duration` after `start`, or `None` when it is past what an
/// `Instant` can represent
fn deadline_after(start: Instant, duration: Duration) -> Option<Instant> {
    start.checked_add(duration)
}

/// Spin until `deadline`, or until killed when there is none; the result
/// only exists to keep the loop alive
fn burn(deadline: Option<Instant>) -> u64 {
    let mut acc: u64 = 0x9E37_79B9_7F4A_7C15;
    while deadline.map_or(true, |d| Instant::now() < d) {
        for _ in 0..STEPS_PER_CHECK {
            acc = black_box(
                acc.wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407),
            );
        }
    }
    acc
}

/// Launch `count` workers and block until every one has finished
pub fn run_workers(spec: WorkerSpec, count: usize) -> Result<LoadReport, LoadError> {
    let started = Instant::now();
    let mut handles = Vec::with_capacity(count);
    let mut spawn_error = None;

    for index in 0..count {
        let duration = spec.duration;
        let spawned = thread::Builder::new()
            .name(format!("burn-{index}"))
            .spawn(move || {
                let deadline = deadline_after(Instant::now(), duration);
                black_box(burn(deadline));
            });

        match spawned {
            Ok(handle) => handles.push(handle),
            Err(source) => {
                spawn_error = Some(LoadError::Spawn { index, source });
                break;
            }
        }
    }

    debug!(workers = handles.len(), "Workers launched");

    let launched = handles.len();
    let panicked = handles
        .into_iter()
        .map(|h| h.join())
        .filter(Result::is_err)
        .count();

    if let Some(err) = spawn_error {
        return Err(err);
    }
    if panicked > 0 {
        return Err(LoadError::WorkerPanicked(panicked));
    }

    Ok(LoadReport {
        workers: launched,
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_cores_is_positive() {
        assert!(available_cores() >= 1);
    }

    #[test]
    fn test_zero_duration_returns_immediately() {
        let report = run_workers(WorkerSpec::from_secs(0), 3).unwrap();
        assert_eq!(report.workers, 3);
        assert!(report.elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_parent_waits_for_deadline() {
        let spec = WorkerSpec {
            duration: Duration::from_millis(300),
        };
        let report = run_workers(spec, 2).unwrap();

        assert_eq!(report.workers, 2);
        assert!(report.elapsed >= Duration::from_millis(300));
    }

    #[test]
    fn test_one_worker_per_core() {
        let cores = available_cores();
        let report = run_workers(WorkerSpec::from_secs(0), cores).unwrap();
        assert_eq!(report.workers, cores);
    }

    #[test]
    fn test_burn_stops_at_past_deadline() {
        let start = Instant::now();
        burn(Some(start));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_unrepresentable_deadline_means_none() {
        let now = Instant::now();
        assert_eq!(deadline_after(now, Duration::from_secs(u64::MAX)), None);
        assert_eq!(
            deadline_after(now, Duration::from_secs(2)),
            Some(now + Duration::from_secs(2))
        );
    }
}
