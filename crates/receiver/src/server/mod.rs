mod receiver;
mod routes;
pub mod webhook;

pub use receiver::ReceiverState;

use axum::{
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::reconcile::ReceiverConfig;
use crate::tracker::IssueTracker;
use crate::Result;

pub struct Server {
    state: Arc<ReceiverState>,
}

impl Server {
    pub fn new(tracker: Arc<dyn IssueTracker>, config: ReceiverConfig) -> Self {
        Self {
            state: Arc::new(ReceiverState { tracker, config }),
        }
    }

    pub fn build_router(self) -> Router {
        // The receiver route is registered for every method so that the
        // handler can answer non-POST requests with 405 itself.
        Router::new()
            .route("/health", get(routes::health))
            .route("/metrics", get(routes::metrics))
            .route("/v1/receiver", any(receiver::receive_webhook))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state)
    }

    pub async fn start(self, addr: &str) -> Result<()> {
        let app = self.build_router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("listening on {}", addr);
        axum::serve(listener, app).await?;
        Ok(())
    }
}
