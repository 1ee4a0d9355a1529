use std::sync::Arc;
use tracing::info;

use github_receiver::{
    config::Config,
    server::Server,
    tracker::{self, IssueTracker},
    Result,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::load()?;
    info!(
        backend = ?config.tracker.backend,
        repo = %config.receiver.default_repo,
        auto_close = config.receiver.auto_close,
        "loaded configuration"
    );

    // Initialize the issue tracker client
    let tracker: Arc<dyn IssueTracker> = tracker::create_tracker(&config.tracker)?;

    // Initialize server
    let server = Server::new(tracker, config.receiver.clone());

    // Start server
    info!("Starting server on {}", config.server.addr);
    server.start(&config.server.addr).await?;

    Ok(())
}
