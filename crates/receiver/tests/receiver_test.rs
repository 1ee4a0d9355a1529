use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::{TimeZone, Utc};
use tokio::sync::Mutex;
use tower::ServiceExt;

use github_receiver::{
    reconcile::ReceiverConfig,
    server::{
        webhook::{Alert, AlertStatus, WebhookMessage},
        Server,
    },
    tracker::{Issue, IssueTracker},
    Error, Result,
};

/// Tracker fake recording every mutation, with injectable list failures.
#[derive(Default)]
struct FakeTracker {
    list_issues: Vec<Issue>,
    list_error: bool,
    created: Mutex<Vec<Issue>>,
    closed: Mutex<Vec<Issue>>,
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn list_open_issues(&self) -> Result<Vec<Issue>> {
        if self.list_error {
            return Err(Error::Tracker("fake error listing current issues".into()));
        }
        Ok(self.list_issues.clone())
    }

    async fn create_issue(
        &self,
        repo: &str,
        title: &str,
        body: &str,
        _extra_labels: &[String],
    ) -> Result<Issue> {
        let issue = Issue {
            number: 1,
            title: title.to_string(),
            body: body.to_string(),
            repo: repo.to_string(),
            html_url: String::new(),
        };
        self.created.lock().await.push(issue.clone());
        Ok(issue)
    }

    async fn close_issue(&self, issue: &Issue) -> Result<Issue> {
        self.closed.lock().await.push(issue.clone());
        Ok(issue.clone())
    }
}

fn open_issue(title: &str) -> Issue {
    Issue {
        number: 1,
        title: title.to_string(),
        body: "body1".to_string(),
        repo: String::new(),
        html_url: String::new(),
    }
}

fn receiver_config() -> ReceiverConfig {
    ReceiverConfig {
        default_repo: "default".to_string(),
        auto_close: true,
        extra_labels: Vec::new(),
    }
}

fn webhook_message(alertname: &str, status: AlertStatus, repo: Option<&str>) -> WebhookMessage {
    let mut common_labels = HashMap::from([("alertname".to_string(), alertname.to_string())]);
    if let Some(repo) = repo {
        common_labels.insert("repo".to_string(), repo.to_string());
    }

    WebhookMessage {
        version: "4".to_string(),
        group_key: format!("{{}}:{{alertname=\"{alertname}\"}}"),
        receiver: "webhook".to_string(),
        status,
        alerts: vec![Alert {
            status,
            labels: HashMap::from([
                ("dev".to_string(), "sda3".to_string()),
                ("instance".to_string(), "example4".to_string()),
                ("alertname".to_string(), alertname.to_string()),
            ]),
            annotations: HashMap::from([(
                "description".to_string(),
                "This is how to handle the alert".to_string(),
            )]),
            starts_at: Utc.timestamp_opt(1498614000, 0).unwrap(),
            ends_at: match status {
                AlertStatus::Resolved => Some(Utc.timestamp_opt(1498618000, 0).unwrap()),
                AlertStatus::Firing => None,
            },
            generator_url: "http://generator.url/".to_string(),
        }],
        group_labels: HashMap::from([("alertname".to_string(), alertname.to_string())]),
        common_labels,
        common_annotations: HashMap::new(),
        external_url: "http://localhost:9093".to_string(),
    }
}

fn test_server(tracker: Arc<FakeTracker>) -> axum_test::TestServer {
    let app = Server::new(tracker, receiver_config()).build_router();
    axum_test::TestServer::new(app).unwrap()
}

#[tokio::test]
async fn successful_create() {
    let tracker = Arc::new(FakeTracker::default());
    let client = test_server(tracker.clone());

    let msg = webhook_message("DiskRunningFull", AlertStatus::Firing, None);
    let response = client.post("/v1/receiver").json(&msg).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "");

    let created = tracker.created.lock().await;
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].title, "DiskRunningFull");
    assert_eq!(created[0].repo, "default");
    assert!(tracker.closed.lock().await.is_empty());
}

#[tokio::test]
async fn successful_create_with_explicit_repo() {
    let tracker = Arc::new(FakeTracker::default());
    let client = test_server(tracker.clone());

    let msg = webhook_message("DiskRunningFull", AlertStatus::Firing, Some("custom-repo"));
    let response = client.post("/v1/receiver").json(&msg).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "");

    let created = tracker.created.lock().await;
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].repo, "custom-repo");
}

#[tokio::test]
async fn successful_close() {
    let tracker = Arc::new(FakeTracker {
        list_issues: vec![open_issue("DiskRunningFull")],
        ..FakeTracker::default()
    });
    let client = test_server(tracker.clone());

    let msg = webhook_message("DiskRunningFull", AlertStatus::Resolved, None);
    let response = client.post("/v1/receiver").json(&msg).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "");

    let closed = tracker.closed.lock().await;
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].title, "DiskRunningFull");
    assert!(tracker.created.lock().await.is_empty());
}

#[tokio::test]
async fn existing_issue_for_firing_alert_is_ignored() {
    let tracker = Arc::new(FakeTracker {
        list_issues: vec![open_issue("DiskRunningFull")],
        ..FakeTracker::default()
    });
    let client = test_server(tracker.clone());

    let msg = webhook_message("DiskRunningFull", AlertStatus::Firing, None);
    let response = client.post("/v1/receiver").json(&msg).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "");
    assert!(tracker.created.lock().await.is_empty());
    assert!(tracker.closed.lock().await.is_empty());
}

#[tokio::test]
async fn malformed_body_answers_400() {
    let tracker = Arc::new(FakeTracker::default());
    let client = test_server(tracker.clone());

    // Deliberately corrupt the json content by appending extra braces.
    let msg = webhook_message("DiskRunningFull", AlertStatus::Firing, None);
    let mut payload = serde_json::to_vec(&msg).unwrap();
    payload.extend_from_slice(b"}{");

    let response = client.post("/v1/receiver").bytes(payload.into()).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "");
    assert!(tracker.created.lock().await.is_empty());
}

#[tokio::test]
async fn body_read_failure_answers_500() {
    let tracker = Arc::new(FakeTracker::default());
    let app = Server::new(tracker, receiver_config()).build_router();

    // A body stream that errors before any bytes arrive.
    let broken = futures::stream::once(async {
        Err::<Vec<u8>, std::io::Error>(std::io::Error::new(std::io::ErrorKind::Other, "fake error"))
    });
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/receiver")
        .body(Body::from_stream(broken))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn tracker_list_failure_answers_500() {
    let tracker = Arc::new(FakeTracker {
        list_error: true,
        ..FakeTracker::default()
    });
    let client = test_server(tracker.clone());

    let msg = webhook_message("DiskRunningFull", AlertStatus::Firing, None);
    let response = client.post("/v1/receiver").json(&msg).await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), "");
    assert!(tracker.created.lock().await.is_empty());
    assert!(tracker.closed.lock().await.is_empty());
}

#[tokio::test]
async fn wrong_method_answers_405() {
    let tracker = Arc::new(FakeTracker::default());
    let client = test_server(tracker.clone());

    let response = client.get("/v1/receiver").await;

    assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.text(), "");
    assert!(tracker.created.lock().await.is_empty());
}

#[tokio::test]
async fn health_endpoint_is_up() {
    let client = test_server(Arc::new(FakeTracker::default()));
    let response = client.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "OK");
}

#[tokio::test]
async fn metrics_endpoint_exposes_receiver_counters() {
    let tracker = Arc::new(FakeTracker::default());
    let client = test_server(tracker);

    let msg = webhook_message("DiskRunningFull", AlertStatus::Firing, None);
    client.post("/v1/receiver").json(&msg).await;

    let response = client.get("/metrics").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response
        .text()
        .contains("github_receiver_received_webhooks_total"));
}
