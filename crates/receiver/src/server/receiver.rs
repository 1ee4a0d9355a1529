use axum::{
    body,
    extract::{Request, State},
    response::{IntoResponse, Response},
};
use http::{Method, StatusCode};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::webhook::WebhookMessage;
use crate::metrics;
use crate::reconcile::{reconcile, Action, ReceiverConfig};
use crate::tracker::IssueTracker;

/// Largest webhook body the receiver will buffer.
const MAX_BODY_BYTES: usize = 1 << 20;

pub struct ReceiverState {
    pub tracker: Arc<dyn IssueTracker>,
    pub config: ReceiverConfig,
}

/// `POST /v1/receiver`. Terminal on first failure, empty body on every
/// path: 405 for non-POST, 500 for a body read failure, 400 for a decode
/// failure, 500 for any tracker failure, 200 once all actions applied.
pub async fn receive_webhook(State(state): State<Arc<ReceiverState>>, req: Request) -> Response {
    if req.method() != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let bytes = match body::to_bytes(req.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("failed to read webhook body: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let msg: WebhookMessage = match serde_json::from_slice(&bytes) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("failed to decode webhook message: {}", e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    metrics::RECEIVED_WEBHOOKS
        .with_label_values(&[msg.status.as_str()])
        .inc();
    info!(
        group_key = %msg.group_key,
        status = msg.status.as_str(),
        alerts = msg.alerts.len(),
        "received webhook message"
    );

    let open_issues = match state.tracker.list_open_issues().await {
        Ok(issues) => issues,
        Err(e) => {
            error!("failed to list open issues: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let actions = reconcile(&msg, &open_issues, &state.config);
    match apply_actions(state.tracker.as_ref(), &actions, &state.config).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            error!("failed to apply reconciliation actions: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Apply actions in order. The first tracker failure stops the batch;
/// actions already applied are not rolled back.
async fn apply_actions(
    tracker: &dyn IssueTracker,
    actions: &[Action],
    config: &ReceiverConfig,
) -> crate::Result<()> {
    for action in actions {
        match action {
            Action::Create { repo, title, body } => {
                let issue = tracker
                    .create_issue(repo, title, body, &config.extra_labels)
                    .await?;
                info!(repo = %repo, title = %title, number = issue.number, "created issue");
                metrics::CREATED_ISSUES.inc();
            }
            Action::Close(issue) => {
                tracker.close_issue(issue).await?;
                info!(title = %issue.title, number = issue.number, "closed issue");
                metrics::CLOSED_ISSUES.inc();
            }
        }
    }
    Ok(())
}
