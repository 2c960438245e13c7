//! CPU status monitoring library
//!
//! This crate provides the core functionality for:
//! - Sampling host CPU utilization over a fixed window
//! - Classifying samples against a threshold
//! - Debouncing classifications into published state transitions
//! - Replacing the served status page on each transition
//! - Health checks and observability

pub mod agent;
pub mod classifier;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod publisher;
pub mod sampler;
pub mod state;

pub use agent::{AgentSettings, CycleOutcome, StatusAgent};
pub use error::{CycleError, PublishError, SampleError, StatParseError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
    StatusSnapshot,
};
pub use models::*;
pub use observability::{AgentMetrics, StructuredLogger};
pub use publisher::{FilePublisher, Publisher};
pub use sampler::{create_sampler, CpuSampler};
