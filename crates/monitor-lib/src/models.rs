//! Core data types for the status agent

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Published health of the host as seen by the status page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// No sample has been classified yet
    #[default]
    Unknown,
    /// CPU utilization at or below the threshold
    Normal,
    /// CPU utilization above the threshold
    Critical,
}

impl HealthState {
    /// Numeric encoding used by the health state gauge
    pub fn as_gauge(&self) -> i64 {
        match self {
            HealthState::Unknown => 0,
            HealthState::Normal => 1,
            HealthState::Critical => 2,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            HealthState::Unknown => "Unknown",
            HealthState::Normal => "Normal",
            HealthState::Critical => "Critical",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HealthState::Unknown => "unknown",
            HealthState::Normal => "normal",
            HealthState::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// A single CPU utilization reading averaged over the sampling window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuSample {
    /// Unix timestamp (seconds) at the end of the window
    pub timestamp: i64,
    /// Utilization percentage in [0, 100]
    pub percent: f64,
}

impl CpuSample {
    /// Build a sample stamped with the current time.
    ///
    /// Returns `None` for NaN readings; finite out-of-range values are clamped.
    pub fn now(percent: f64) -> Option<Self> {
        Self::at(chrono::Utc::now().timestamp(), percent)
    }

    pub fn at(timestamp: i64, percent: f64) -> Option<Self> {
        if percent.is_nan() {
            return None;
        }
        Some(Self {
            timestamp,
            percent: percent.clamp(0.0, 100.0),
        })
    }
}

/// CPU percentage above which the host is considered critical
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64")]
pub struct Threshold(f64);

impl TryFrom<f64> for Threshold {
    type Error = String;

    fn try_from(percent: f64) -> Result<Self, Self::Error> {
        Self::new(percent).ok_or_else(|| format!("threshold must be within 0..=100, got {percent}"))
    }
}

impl Threshold {
    pub fn new(percent: f64) -> Option<Self> {
        if percent.is_finite() && (0.0..=100.0).contains(&percent) {
            Some(Self(percent))
        } else {
            None
        }
    }

    pub fn percent(&self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(80.0)
    }
}

/// The two static page variants copied onto the target artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSet {
    pub normal: PathBuf,
    pub critical: PathBuf,
}

impl TemplateSet {
    pub fn new(normal: impl Into<PathBuf>, critical: impl Into<PathBuf>) -> Self {
        Self {
            normal: normal.into(),
            critical: critical.into(),
        }
    }

    /// Template backing a published state; `Unknown` is never published
    pub fn path_for(&self, state: HealthState) -> Option<&Path> {
        match state {
            HealthState::Normal => Some(&self.normal),
            HealthState::Critical => Some(&self.critical),
            HealthState::Unknown => None,
        }
    }
}

/// A change of published state and the reading that caused it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: HealthState,
    pub to: HealthState,
    pub percent: f64,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}→{}", self.from.label(), self.to.label())
    }
}
