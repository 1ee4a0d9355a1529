use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::server::webhook::{Alert, AlertStatus, WebhookMessage};
use crate::tracker::Issue;

/// Label consulted on the alert (then on the message common labels) for a
/// per-alert repository override.
const REPO_LABEL: &str = "repo";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    pub default_repo: String,
    pub auto_close: bool,
    /// Alert label names surfaced in issue bodies and attached as tracker
    /// labels on created issues.
    pub extra_labels: Vec<String>,
}

/// A tracker mutation decided by [`reconcile`] but not yet applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Create {
        repo: String,
        title: String,
        body: String,
    },
    Close(Issue),
}

/// Compare the alerts in `msg` against the currently open issues and decide
/// which tracker mutations bring the two in line.
///
/// Alerts are processed in sequence order and independently of each other.
/// The function is pure: applying the returned actions is the caller's job,
/// which keeps the decision table testable without a tracker.
pub fn reconcile(
    msg: &WebhookMessage,
    open_issues: &[Issue],
    config: &ReceiverConfig,
) -> Vec<Action> {
    let mut actions = Vec::new();

    for alert in &msg.alerts {
        let Some(name) = alert.name(msg) else {
            warn!(labels = ?alert.labels, "alert carries no alertname label, skipping");
            continue;
        };

        // First match wins; duplicate open issues are not collapsed here.
        let existing = open_issues.iter().find(|issue| issue.title == name);

        match (alert.status, existing) {
            (AlertStatus::Firing, None) => {
                actions.push(Action::Create {
                    repo: target_repo(alert, msg, config).to_string(),
                    title: name.to_string(),
                    body: format_issue_body(alert, msg, config),
                });
            }
            // An open issue already tracks this alert.
            (AlertStatus::Firing, Some(_)) => {}
            (AlertStatus::Resolved, Some(issue)) if config.auto_close => {
                actions.push(Action::Close(issue.clone()));
            }
            // Resolved with auto-close off, or nothing to close.
            (AlertStatus::Resolved, _) => {}
        }
    }

    actions
}

fn target_repo<'a>(alert: &'a Alert, msg: &'a WebhookMessage, config: &'a ReceiverConfig) -> &'a str {
    alert
        .labels
        .get(REPO_LABEL)
        .or_else(|| msg.common_labels.get(REPO_LABEL))
        .map(String::as_str)
        .unwrap_or(&config.default_repo)
}

/// Issue body for a newly created issue. The format is stable for a given
/// input: a link back to the alertmanager, annotation values in ascending
/// key order, then one `key: value` line per configured extra label present
/// on the alert.
fn format_issue_body(alert: &Alert, msg: &WebhookMessage, config: &ReceiverConfig) -> String {
    let mut lines = Vec::new();

    if !msg.external_url.is_empty() {
        lines.push(format!("Alertmanager URL: {}", msg.external_url));
    }

    let mut keys: Vec<&String> = alert.annotations.keys().collect();
    keys.sort();
    for key in keys {
        lines.push(alert.annotations[key].clone());
    }

    for label in &config.extra_labels {
        if let Some(value) = alert.labels.get(label) {
            lines.push(format!("{label}: {value}"));
        }
    }

    lines.join("\n")
}
