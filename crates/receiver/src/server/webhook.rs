use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alertmanager webhook payload structures (webhook config version 4).
#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookMessage {
    pub version: String,
    #[serde(rename = "groupKey")]
    pub group_key: String,
    pub receiver: String,
    pub status: AlertStatus,
    pub alerts: Vec<Alert>,
    #[serde(rename = "groupLabels", default)]
    pub group_labels: HashMap<String, String>,
    #[serde(rename = "commonLabels", default)]
    pub common_labels: HashMap<String, String>,
    #[serde(rename = "commonAnnotations", default)]
    pub common_annotations: HashMap<String, String>,
    #[serde(rename = "externalURL", default)]
    pub external_url: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Alert {
    pub status: AlertStatus,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    #[serde(rename = "startsAt")]
    pub starts_at: DateTime<Utc>,
    #[serde(rename = "endsAt", default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(rename = "generatorURL", default)]
    pub generator_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Firing,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Firing => "firing",
            AlertStatus::Resolved => "resolved",
        }
    }
}

impl Alert {
    /// The alert name, used as the correlation key against issue titles.
    /// Alertmanager puts it in the alert labels; fall back to the group
    /// labels for payloads that only carry it there.
    pub fn name<'a>(&'a self, msg: &'a WebhookMessage) -> Option<&'a str> {
        self.labels
            .get("alertname")
            .or_else(|| msg.group_labels.get("alertname"))
            .or_else(|| msg.common_labels.get("alertname"))
            .map(String::as_str)
    }
}
