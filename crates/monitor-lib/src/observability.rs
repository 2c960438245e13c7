//! Observability infrastructure for the status agent
//!
//! Provides:
//! - Prometheus metrics (latest CPU reading, published state, transitions, errors)
//! - Structured JSON logging with tracing

use crate::error::CycleError;
use crate::models::{HealthState, Transition};
use prometheus::{
    register_gauge, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, Gauge, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{error, info, warn};

/// Histogram buckets for status page writes (in seconds)
const PUBLISH_LATENCY_BUCKETS: &[f64] = &[0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0];

static GLOBAL_METRICS: OnceLock<AgentMetricsInner> = OnceLock::new();

struct AgentMetricsInner {
    cpu_percent: Gauge,
    health_state: IntGauge,
    samples: IntCounter,
    transitions: IntCounter,
    errors: IntCounterVec,
    publish_latency_seconds: Histogram,
}

impl AgentMetricsInner {
    fn new() -> Self {
        Self {
            cpu_percent: register_gauge!(
                "status_agent_cpu_percent",
                "CPU utilization averaged over the last sampling window"
            )
            .expect("Failed to register cpu_percent"),

            health_state: register_int_gauge!(
                "status_agent_health_state",
                "Published health state (0 unknown, 1 normal, 2 critical)"
            )
            .expect("Failed to register health_state"),

            samples: register_int_counter!(
                "status_agent_samples_total",
                "Total number of CPU samples taken"
            )
            .expect("Failed to register samples"),

            transitions: register_int_counter!(
                "status_agent_transitions_total",
                "Total number of published state transitions"
            )
            .expect("Failed to register transitions"),

            errors: register_int_counter_vec!(
                "status_agent_errors_total",
                "Total number of failed cycles by stage",
                &["stage"]
            )
            .expect("Failed to register errors"),

            publish_latency_seconds: register_histogram!(
                "status_agent_publish_latency_seconds",
                "Time spent replacing the status page",
                PUBLISH_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register publish_latency_seconds"),
        }
    }
}

/// Lightweight handle to the process-wide metrics; clones share state
#[derive(Clone)]
pub struct AgentMetrics {
    _private: (),
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AgentMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AgentMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_sample(&self, percent: f64) {
        self.inner().samples.inc();
        self.inner().cpu_percent.set(percent);
    }

    pub fn observe_publish(&self, state: HealthState, elapsed: Duration) {
        self.inner().transitions.inc();
        self.inner().health_state.set(state.as_gauge());
        self.inner()
            .publish_latency_seconds
            .observe(elapsed.as_secs_f64());
    }

    pub fn inc_errors(&self, stage: &str) {
        self.inner().errors.with_label_values(&[stage]).inc();
    }
}

/// Structured logger for agent events
///
/// Every record carries an `event` field and the host name so log
/// pipelines can filter transitions without parsing messages.
#[derive(Clone)]
pub struct StructuredLogger {
    host: String,
}

impl StructuredLogger {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    pub fn log_startup(&self, version: &str, threshold: f64, sampler: &str) {
        info!(
            event = "agent_started",
            host = %self.host,
            agent_version = %version,
            threshold_percent = threshold,
            sampler = %sampler,
            "Status agent initialized, watching CPU"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            host = %self.host,
            reason = %reason,
            "Status agent shutting down"
        );
    }

    /// Log a published state change
    pub fn log_transition(&self, transition: &Transition) {
        match transition.to {
            HealthState::Critical => warn!(
                event = "state_transition",
                host = %self.host,
                direction = %transition,
                from = %transition.from,
                to = %transition.to,
                cpu_percent = transition.percent,
                "CPU critical ({:.1}%), switching status page to alert",
                transition.percent
            ),
            _ => info!(
                event = "state_transition",
                host = %self.host,
                direction = %transition,
                from = %transition.from,
                to = %transition.to,
                cpu_percent = transition.percent,
                "CPU nominal ({:.1}%), switching status page to normal",
                transition.percent
            ),
        }
    }

    /// Log a failed cycle before backing off
    pub fn log_cycle_error(&self, err: &CycleError, consecutive: u32, backoff: Duration) {
        error!(
            event = "cycle_failed",
            host = %self.host,
            stage = %err.stage(),
            error = %err,
            consecutive_errors = consecutive,
            backoff_secs = backoff.as_secs_f64(),
            "Error in monitor loop"
        );
    }
}
