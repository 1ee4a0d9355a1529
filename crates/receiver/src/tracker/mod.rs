mod github;
mod memory;

pub use github::GitHubTracker;
pub use memory::MemoryTracker;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{TrackerBackend, TrackerConfig};

/// An open ticket as reported by the tracker. The number is the tracker's
/// identity for the issue; the title is the correlation key against alerts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub repo: String,
    pub html_url: String,
}

/// The capability set the receiver needs from a ticketing backend. Any
/// concrete tracker (remote API, in-memory fake) can stand in.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn list_open_issues(&self) -> crate::Result<Vec<Issue>>;

    async fn create_issue(
        &self,
        repo: &str,
        title: &str,
        body: &str,
        extra_labels: &[String],
    ) -> crate::Result<Issue>;

    async fn close_issue(&self, issue: &Issue) -> crate::Result<Issue>;
}

pub fn create_tracker(config: &TrackerConfig) -> crate::Result<Arc<dyn IssueTracker>> {
    match config.backend {
        TrackerBackend::GitHub => {
            let token = config.auth_token.as_deref().ok_or_else(|| {
                crate::Error::Config("GitHub auth token not configured".to_string())
            })?;
            Ok(Arc::new(GitHubTracker::new(
                token,
                &config.default_repo,
                config.api_url.as_deref(),
                config.timeout(),
            )?))
        }
        TrackerBackend::Memory => Ok(Arc::new(MemoryTracker::default())),
    }
}
