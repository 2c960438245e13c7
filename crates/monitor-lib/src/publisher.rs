//! Status page publication
//!
//! Publishing replaces the whole target artifact with the template for the
//! new state. The copy is not atomic: a reader may observe a partially
//! written page while a transition is in progress.

use crate::error::PublishError;
use crate::models::{HealthState, TemplateSet};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, warn};

/// Makes a health state visible to external consumers
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `state`, returning the number of bytes written
    async fn publish(&self, state: HealthState) -> Result<u64, PublishError>;
}

#[async_trait]
impl<T: Publisher + ?Sized> Publisher for Arc<T> {
    async fn publish(&self, state: HealthState) -> Result<u64, PublishError> {
        (**self).publish(state).await
    }
}

/// Copies one of two static templates over a single target file
#[derive(Debug, Clone)]
pub struct FilePublisher {
    templates: TemplateSet,
    target: PathBuf,
}

impl FilePublisher {
    pub fn new(templates: TemplateSet, target: impl Into<PathBuf>) -> Self {
        Self {
            templates,
            target: target.into(),
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Warn about templates that are not present yet.
    ///
    /// Returns the missing paths; never fails since templates may be
    /// provisioned after the agent starts.
    pub async fn check_templates(&self) -> Vec<PathBuf> {
        let mut missing = Vec::new();
        for path in [&self.templates.normal, &self.templates.critical] {
            if fs::metadata(path).await.is_err() {
                warn!(template = %path.display(), "Status template not found");
                missing.push(path.clone());
            }
        }
        missing
    }
}

#[async_trait]
impl Publisher for FilePublisher {
    async fn publish(&self, state: HealthState) -> Result<u64, PublishError> {
        let template = self
            .templates
            .path_for(state)
            .ok_or(PublishError::NoTemplate(state))?;

        let bytes = fs::copy(template, &self.target)
            .await
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound if !template.exists() => {
                    PublishError::TemplateMissing(template.to_path_buf())
                }
                _ => PublishError::Io {
                    template: template.to_path_buf(),
                    target: self.target.clone(),
                    source,
                },
            })?;

        debug!(
            state = %state,
            template = %template.display(),
            target = %self.target.display(),
            bytes,
            "Status page replaced"
        );

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NORMAL_PAGE: &str = "<html><body class=\"ok\">All systems normal</body></html>";
    const CRITICAL_PAGE: &str = "<html><body class=\"alert\">CPU CRITICAL</body></html>";

    async fn setup() -> (TempDir, FilePublisher) {
        let dir = TempDir::new().unwrap();
        let normal = dir.path().join("index_normal.html");
        let critical = dir.path().join("index_critical.html");
        fs::write(&normal, NORMAL_PAGE).await.unwrap();
        fs::write(&critical, CRITICAL_PAGE).await.unwrap();

        let publisher = FilePublisher::new(
            TemplateSet::new(normal, critical),
            dir.path().join("index.html"),
        );
        (dir, publisher)
    }

    #[tokio::test]
    async fn test_publish_creates_target() {
        let (_dir, publisher) = setup().await;

        let bytes = publisher.publish(HealthState::Normal).await.unwrap();

        assert_eq!(bytes, NORMAL_PAGE.len() as u64);
        let content = fs::read_to_string(publisher.target()).await.unwrap();
        assert_eq!(content, NORMAL_PAGE);
    }

    #[tokio::test]
    async fn test_publish_fully_replaces_longer_content() {
        let (_dir, publisher) = setup().await;
        fs::write(publisher.target(), "x".repeat(4096)).await.unwrap();

        publisher.publish(HealthState::Critical).await.unwrap();

        let content = fs::read_to_string(publisher.target()).await.unwrap();
        assert_eq!(content, CRITICAL_PAGE);
    }

    #[tokio::test]
    async fn test_publish_unknown_is_rejected() {
        let (_dir, publisher) = setup().await;

        let err = publisher.publish(HealthState::Unknown).await.unwrap_err();
        assert!(matches!(err, PublishError::NoTemplate(HealthState::Unknown)));
        assert!(!publisher.target().exists());
    }

    #[tokio::test]
    async fn test_publish_missing_template() {
        let (_dir, publisher) = setup().await;
        fs::remove_file(&publisher.templates().critical).await.unwrap();

        let err = publisher.publish(HealthState::Critical).await.unwrap_err();
        assert!(matches!(err, PublishError::TemplateMissing(_)));
    }

    #[tokio::test]
    async fn test_publish_unwritable_target() {
        let (dir, _) = setup().await;
        let publisher = FilePublisher::new(
            TemplateSet::new(
                dir.path().join("index_normal.html"),
                dir.path().join("index_critical.html"),
            ),
            dir.path().join("no-such-dir").join("index.html"),
        );

        let err = publisher.publish(HealthState::Normal).await.unwrap_err();
        assert!(matches!(err, PublishError::Io { .. }));
    }

    #[tokio::test]
    async fn test_check_templates_reports_missing() {
        let (_dir, publisher) = setup().await;
        assert!(publisher.check_templates().await.is_empty());

        fs::remove_file(&publisher.templates().normal).await.unwrap();
        let missing = publisher.check_templates().await;
        assert_eq!(missing, vec![publisher.templates().normal.clone()]);
    }
}
