use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{Issue, IssueTracker};
use crate::{Error, Result};

const DEFAULT_API_URL: &str = "https://api.github.com";

/// Issue tracker backed by the GitHub REST API.
pub struct GitHubTracker {
    client: reqwest::Client,
    api_url: String,
    token: String,
    repo: String,
}

/// Issue shape returned by the GitHub API. The issues endpoint also returns
/// pull requests; the marker field tells them apart.
#[derive(Debug, Deserialize)]
struct GhIssue {
    number: u64,
    title: String,
    body: Option<String>,
    #[serde(default)]
    html_url: String,
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct CreateIssueRequest<'a> {
    title: &'a str,
    body: &'a str,
    labels: &'a [String],
}

#[derive(Debug, Serialize)]
struct UpdateIssueRequest<'a> {
    state: &'a str,
}

impl GitHubTracker {
    pub fn new(
        token: &str,
        repo: &str,
        api_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("github-receiver/0.1"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.unwrap_or(DEFAULT_API_URL).trim_end_matches('/').to_string(),
            token: token.to_string(),
            repo: repo.to_string(),
        })
    }

    fn issue_from(&self, gh: GhIssue, repo: &str) -> Issue {
        Issue {
            number: gh.number,
            title: gh.title,
            body: gh.body.unwrap_or_default(),
            repo: repo.to_string(),
            html_url: gh.html_url,
        }
    }
}

#[async_trait]
impl IssueTracker for GitHubTracker {
    async fn list_open_issues(&self) -> Result<Vec<Issue>> {
        // TODO: follow Link headers once a repo crosses 100 open alert issues.
        let url = format!(
            "{}/repos/{}/issues?state=open&per_page=100",
            self.api_url, self.repo
        );
        debug!(repo = %self.repo, "listing open issues");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tracker(format!(
                "listing open issues: {status} - {body}"
            )));
        }

        let issues: Vec<GhIssue> = response.json().await?;
        Ok(issues
            .into_iter()
            .filter(|issue| issue.pull_request.is_none())
            .map(|issue| self.issue_from(issue, &self.repo))
            .collect())
    }

    async fn create_issue(
        &self,
        repo: &str,
        title: &str,
        body: &str,
        extra_labels: &[String],
    ) -> Result<Issue> {
        let url = format!("{}/repos/{}/issues", self.api_url, repo);

        let request = CreateIssueRequest {
            title,
            body,
            labels: extra_labels,
        };

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tracker(format!(
                "creating issue {title:?} in {repo}: {status} - {body}"
            )));
        }

        let created: GhIssue = response.json().await?;
        Ok(self.issue_from(created, repo))
    }

    async fn close_issue(&self, issue: &Issue) -> Result<Issue> {
        let url = format!(
            "{}/repos/{}/issues/{}",
            self.api_url, issue.repo, issue.number
        );

        let response = self
            .client
            .patch(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&UpdateIssueRequest { state: "closed" })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tracker(format!(
                "closing issue #{} in {}: {status} - {body}",
                issue.number, issue.repo
            )));
        }

        let closed: GhIssue = response.json().await?;
        Ok(self.issue_from(closed, &issue.repo))
    }
}
