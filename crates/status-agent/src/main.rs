//! Status Agent - CPU health indicator for the chaos demo
//!
//! Samples host CPU utilization every second and swaps the served status
//! page between its normal and critical variants whenever the utilization
//! crosses the configured threshold. Runs until the process is stopped.

use anyhow::Result;
use monitor_lib::{
    create_sampler,
    health::HealthRegistry,
    observability::{AgentMetrics, StructuredLogger},
    CpuSampler, FilePublisher, StatusAgent,
};
use status_agent::{api, config::AgentConfig};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = AgentConfig::load()?;
    let settings = config.settings()?;
    info!(
        target_path = %config.target.display(),
        threshold = config.threshold,
        "Agent configured"
    );

    let health_registry = HealthRegistry::new();
    let metrics = AgentMetrics::new();
    let logger = StructuredLogger::new(&config.host_name);

    let sampler = create_sampler(&config.proc_root).await;
    let publisher = FilePublisher::new(config.templates(), &config.target);
    publisher.check_templates().await;

    logger.log_startup(AGENT_VERSION, config.threshold, sampler.name());

    if config.api_port != 0 {
        let app_state = Arc::new(api::AppState::new(health_registry.clone(), metrics));
        let port = config.api_port;
        tokio::spawn(async move {
            if let Err(e) = api::serve(port, app_state).await {
                error!(error = %e, "Health API server stopped");
            }
        });
    }

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let agent = StatusAgent::new(sampler, publisher, settings)
        .with_health(health_registry)
        .with_logger(logger.clone());
    let agent_handle = tokio::spawn(agent.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    let _ = shutdown_tx.send(());
    agent_handle.await?;

    Ok(())
}
