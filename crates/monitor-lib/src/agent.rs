//! Status agent loop
//!
//! Samples CPU utilization, classifies it against the threshold and
//! republishes the status page only when the classification differs from
//! what was last published. The sampling window is the loop's pacing; the
//! only other wait is the back-off after a failed cycle.

use crate::classifier::classify;
use crate::error::CycleError;
use crate::health::{components, HealthRegistry, StatusSnapshot};
use crate::models::{CpuSample, HealthState, Threshold, Transition};
use crate::observability::{AgentMetrics, StructuredLogger};
use crate::publisher::Publisher;
use crate::sampler::CpuSampler;
use crate::state::DebouncedStateMachine;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::info;

/// Loop timing and classification settings
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub threshold: Threshold,
    /// Averaging window of each sample (default: 1 second)
    pub sampling_window: Duration,
    /// Sleep after a failed cycle (default: 5 seconds)
    pub error_backoff: Duration,
    /// Cap for doubling back-off; equal to `error_backoff` keeps it fixed
    pub max_error_backoff: Duration,
    /// Consecutive failures before a component is reported unhealthy
    pub unhealthy_after: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            threshold: Threshold::default(),
            sampling_window: Duration::from_secs(1),
            error_backoff: Duration::from_secs(5),
            max_error_backoff: Duration::from_secs(5),
            unhealthy_after: 12,
        }
    }
}

impl AgentSettings {
    /// Back-off before retrying after `consecutive` failed cycles
    pub fn backoff_for(&self, consecutive: u32) -> Duration {
        let cap = self.max_error_backoff.max(self.error_backoff);
        let doublings = consecutive.saturating_sub(1).min(16);
        self.error_backoff
            .saturating_mul(1u32 << doublings)
            .min(cap)
    }
}

/// Result of one successful cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// Classification matched the published state, nothing written
    Unchanged { state: HealthState, percent: f64 },
    /// Status page replaced
    Published(Transition),
}

pub struct StatusAgent<S, P> {
    sampler: S,
    publisher: P,
    settings: AgentSettings,
    machine: DebouncedStateMachine,
    health: HealthRegistry,
    metrics: AgentMetrics,
    logger: StructuredLogger,
    last_sample: Option<CpuSample>,
    /// Failed cycles in a row, drives the back-off
    consecutive_errors: u32,
    sampler_failures: u32,
    publisher_failures: u32,
}

impl<S: CpuSampler, P: Publisher> StatusAgent<S, P> {
    pub fn new(sampler: S, publisher: P, settings: AgentSettings) -> Self {
        Self {
            sampler,
            publisher,
            settings,
            machine: DebouncedStateMachine::new(),
            health: HealthRegistry::new(),
            metrics: AgentMetrics::new(),
            logger: StructuredLogger::new("localhost"),
            last_sample: None,
            consecutive_errors: 0,
            sampler_failures: 0,
            publisher_failures: 0,
        }
    }

    /// Report component health into a shared registry
    pub fn with_health(mut self, health: HealthRegistry) -> Self {
        self.health = health;
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn published(&self) -> HealthState {
        self.machine.published()
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Sample, classify and publish on transition.
    ///
    /// The state machine only advances after a successful publish, so a
    /// failed transition is retried by the next cycle that classifies the same way.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        let sample = self.sampler.sample(self.settings.sampling_window).await?;
        self.metrics.observe_sample(sample.percent);
        self.last_sample = Some(sample);

        let state = classify(sample.percent, self.settings.threshold);
        let Some(transition) = self.machine.decide(state, sample.percent) else {
            return Ok(CycleOutcome::Unchanged {
                state,
                percent: sample.percent,
            });
        };

        let started = Instant::now();
        self.publisher.publish(transition.to).await?;
        self.machine.commit(&transition);

        self.metrics.observe_publish(transition.to, started.elapsed());
        self.logger.log_transition(&transition);

        Ok(CycleOutcome::Published(transition))
    }

    /// Run one cycle and record its effect on health.
    ///
    /// Returns the back-off to wait when the cycle failed.
    pub async fn step(&mut self) -> Option<Duration> {
        let result = self.run_cycle().await;

        let backoff = match result {
            Ok(outcome) => {
                self.consecutive_errors = 0;
                self.mark_sampler_healthy().await;

                // An unchanged cycle says nothing about the publisher
                if let CycleOutcome::Published(_) = outcome {
                    self.publisher_failures = 0;
                    self.health.set_healthy(components::PUBLISHER).await;
                    self.health.set_ready(true).await;
                }
                None
            }
            Err(err) => {
                self.consecutive_errors = self.consecutive_errors.saturating_add(1);
                let backoff = self.settings.backoff_for(self.consecutive_errors);

                self.metrics.inc_errors(err.stage());
                self.logger
                    .log_cycle_error(&err, self.consecutive_errors, backoff);

                let (component, failures) = match err {
                    CycleError::Sample(_) => {
                        self.sampler_failures = self.sampler_failures.saturating_add(1);
                        (components::SAMPLER, self.sampler_failures)
                    }
                    CycleError::Publish(_) => {
                        // The sample preceding a publish succeeded
                        self.mark_sampler_healthy().await;
                        self.publisher_failures = self.publisher_failures.saturating_add(1);
                        (components::PUBLISHER, self.publisher_failures)
                    }
                };
                if failures >= self.settings.unhealthy_after {
                    self.health.set_unhealthy(component, err.to_string()).await;
                } else {
                    self.health.set_degraded(component, err.to_string()).await;
                }
                Some(backoff)
            }
        };

        self.health
            .set_status(StatusSnapshot {
                published: self.machine.published(),
                last_sample: self.last_sample,
                transitions: self.machine.transitions(),
                threshold_percent: self.settings.threshold.percent(),
            })
            .await;

        backoff
    }

    async fn mark_sampler_healthy(&mut self) {
        self.sampler_failures = 0;
        self.health.set_healthy(components::SAMPLER).await;
    }

    /// Run until a shutdown signal arrives; transient errors never end the loop
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            threshold_percent = self.settings.threshold.percent(),
            sampler = %self.sampler.name(),
            window_ms = self.settings.sampling_window.as_millis() as u64,
            "Starting status agent loop"
        );

        self.health.register(components::SAMPLER).await;
        self.health.register(components::PUBLISHER).await;

        loop {
            tokio::select! {
                backoff = self.step() => {
                    if let Some(backoff) = backoff {
                        tokio::select! {
                            _ = tokio::time::sleep(backoff) => {}
                            _ = shutdown.recv() => break,
                        }
                    }
                }
                _ = shutdown.recv() => break,
            }
        }

        info!(
            published = %self.machine.published(),
            transitions = self.machine.transitions(),
            "Status agent loop stopped"
        );
    }
}
