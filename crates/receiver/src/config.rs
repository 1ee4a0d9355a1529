use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::reconcile::ReceiverConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TrackerBackend {
    #[serde(rename = "github")]
    GitHub,
    #[serde(rename = "memory")]
    Memory,
}

impl Default for TrackerBackend {
    fn default() -> Self {
        TrackerBackend::GitHub
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub tracker: TrackerConfig,
    pub receiver: ReceiverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub backend: TrackerBackend,
    pub auth_token: Option<String>,
    pub api_url: Option<String>,
    pub default_repo: String,
    pub timeout_secs: u64,
}

impl TrackerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn load() -> crate::Result<Self> {
        // Load environment variables from .env file if it exists
        let _ = dotenvy::dotenv();

        let config = Config {
            server: ServerConfig {
                addr: std::env::var("SERVER_ADDR")
                    .unwrap_or_else(|_| "0.0.0.0:9393".to_string()),
            },
            tracker: TrackerConfig {
                backend: match std::env::var("TRACKER_BACKEND")
                    .unwrap_or_else(|_| "github".to_string())
                    .to_lowercase()
                    .as_str()
                {
                    "memory" => TrackerBackend::Memory,
                    _ => TrackerBackend::GitHub,
                },
                auth_token: std::env::var("GITHUB_AUTH_TOKEN").ok(),
                api_url: std::env::var("GITHUB_API_URL").ok(),
                default_repo: std::env::var("GITHUB_REPO")
                    .unwrap_or_else(|_| "".to_string()),
                timeout_secs: std::env::var("TRACKER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            },
            receiver: ReceiverConfig {
                default_repo: std::env::var("GITHUB_REPO")
                    .unwrap_or_else(|_| "".to_string()),
                auto_close: std::env::var("AUTO_CLOSE")
                    .map(|v| parse_bool(&v))
                    .unwrap_or(false),
                extra_labels: std::env::var("EXTRA_LABELS")
                    .map(|v| parse_extra_labels(&v))
                    .unwrap_or_default(),
            },
        };

        if config.tracker.backend == TrackerBackend::Memory {
            tracing::warn!("Using the in-memory tracker backend. Issues will not survive a restart.");
        }

        // Validate tracker configuration
        if config.tracker.backend == TrackerBackend::GitHub {
            if config.tracker.auth_token.is_none() {
                return Err(crate::Error::Config(
                    "GITHUB_AUTH_TOKEN must be set when using the github backend".to_string(),
                ));
            }
            if config.tracker.default_repo.is_empty() {
                return Err(crate::Error::Config(
                    "GITHUB_REPO must be set when using the github backend".to_string(),
                ));
            }
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                addr: "0.0.0.0:9393".to_string(),
            },
            tracker: TrackerConfig {
                backend: TrackerBackend::Memory,
                auth_token: None,
                api_url: None,
                default_repo: "default".to_string(),
                timeout_secs: 30,
            },
            receiver: ReceiverConfig {
                default_repo: "default".to_string(),
                auto_close: false,
                extra_labels: Vec::new(),
            },
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes")
}

fn parse_extra_labels(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
