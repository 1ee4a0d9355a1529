use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use super::{Issue, IssueTracker};
use crate::{Error, Result};

/// Tracker backend holding issues in process memory. Used by tests and by
/// deployments that want to observe reconciliation without touching a real
/// tracker.
#[derive(Debug, Default)]
pub struct MemoryTracker {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_number: u64,
    issues: Vec<Issue>,
}

#[async_trait]
impl IssueTracker for MemoryTracker {
    async fn list_open_issues(&self) -> Result<Vec<Issue>> {
        Ok(self.state.read().await.issues.clone())
    }

    async fn create_issue(
        &self,
        repo: &str,
        title: &str,
        body: &str,
        _extra_labels: &[String],
    ) -> Result<Issue> {
        let mut state = self.state.write().await;
        state.next_number += 1;
        let issue = Issue {
            number: state.next_number,
            title: title.to_string(),
            body: body.to_string(),
            repo: repo.to_string(),
            html_url: String::new(),
        };
        state.issues.push(issue.clone());
        info!(repo = %repo, title = %title, number = issue.number, "created in-memory issue");
        Ok(issue)
    }

    async fn close_issue(&self, issue: &Issue) -> Result<Issue> {
        let mut state = self.state.write().await;
        let pos = state
            .issues
            .iter()
            .position(|open| open.number == issue.number)
            .ok_or_else(|| Error::Tracker(format!("issue #{} is not open", issue.number)))?;
        Ok(state.issues.remove(pos))
    }
}
