//! Agent configuration
//!
//! Read from `STATUS_AGENT_*` environment variables, optionally layered on
//! top of a file named by `STATUS_AGENT_CONFIG`.

use anyhow::{bail, Context, Result};
use monitor_lib::{AgentSettings, TemplateSet, Threshold};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const ENV_PREFIX: &str = "STATUS_AGENT";
const CONFIG_FILE_VAR: &str = "STATUS_AGENT_CONFIG";

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Host name attached to structured log records
    #[serde(default = "default_host_name")]
    pub host_name: String,

    /// CPU percentage above which the page turns critical
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    #[serde(default = "default_normal_template")]
    pub normal_template: PathBuf,

    #[serde(default = "default_critical_template")]
    pub critical_template: PathBuf,

    /// Served status page that gets replaced on every transition
    #[serde(default = "default_target")]
    pub target: PathBuf,

    #[serde(default = "default_sampling_window")]
    pub sampling_window_secs: u64,

    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,

    #[serde(default = "default_error_backoff")]
    pub max_error_backoff_secs: u64,

    #[serde(default = "default_unhealthy_after")]
    pub unhealthy_after: u32,

    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,

    /// Health/metrics port, 0 disables the endpoint
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

fn default_host_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_threshold() -> f64 {
    80.0
}

fn default_normal_template() -> PathBuf {
    PathBuf::from("/opt/monitoring/index_normal.html")
}

fn default_critical_template() -> PathBuf {
    PathBuf::from("/opt/monitoring/index_critical.html")
}

fn default_target() -> PathBuf {
    PathBuf::from("/var/www/html/index.html")
}

fn default_sampling_window() -> u64 {
    1
}

fn default_error_backoff() -> u64 {
    5
}

fn default_unhealthy_after() -> u32 {
    12
}

fn default_proc_root() -> PathBuf {
    PathBuf::from("/proc")
}

fn default_api_port() -> u16 {
    9100
}

impl AgentConfig {
    /// Load configuration from the optional file and environment
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Ok(path) = std::env::var(CONFIG_FILE_VAR) {
            builder = builder.add_source(config::File::with_name(&path));
        }

        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to read agent configuration")?;

        let config: AgentConfig = config
            .try_deserialize()
            .context("Invalid agent configuration")?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if Threshold::new(self.threshold).is_none() {
            bail!("threshold must be within 0..=100, got {}", self.threshold);
        }
        if self.sampling_window_secs == 0 {
            bail!("sampling_window_secs must be at least 1");
        }
        if self.error_backoff_secs == 0 {
            bail!("error_backoff_secs must be at least 1");
        }
        Ok(())
    }

    pub fn templates(&self) -> TemplateSet {
        TemplateSet::new(&self.normal_template, &self.critical_template)
    }

    pub fn settings(&self) -> Result<AgentSettings> {
        let threshold = Threshold::new(self.threshold)
            .with_context(|| format!("threshold {} out of range", self.threshold))?;

        Ok(AgentSettings {
            threshold,
            sampling_window: Duration::from_secs(self.sampling_window_secs),
            error_backoff: Duration::from_secs(self.error_backoff_secs),
            max_error_backoff: Duration::from_secs(self.max_error_backoff_secs),
            unhealthy_after: self.unhealthy_after,
        })
    }
}
