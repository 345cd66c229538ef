use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

mod api;
mod board;
mod calendar;
mod catalog;
mod config;
mod error;
mod scores;

use api::AppState;
use board::{system_clock, Board, Orchestrator, Poller, Refresher};
use config::Config;
use scores::{EspnClient, ScoreSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let source: Arc<dyn ScoreSource> = Arc::new(EspnClient::new(
        Some(config.api_base_url.as_str()),
        config.request_timeout(),
    )?);
    let catalog = config.catalog()?;
    let calendar = config.calendar()?;
    info!(
        "Following {} league(s) via {} ({:?} failure policy)",
        catalog.requests().len(),
        source.name(),
        config.failure_policy
    );

    let orchestrator = Orchestrator::new(
        source,
        catalog,
        calendar,
        config.failure_policy,
        config.request_timeout(),
    );
    let board = Arc::new(Board::new(config.signature_leaders));
    let refresher = Arc::new(Refresher::new(
        orchestrator,
        board,
        config.window_days,
        config.selected_date,
        system_clock(),
    ));
    let poller = Poller::new(refresher);

    // Cold start, then hand over to the periodic today-only refresh
    {
        let poller = Arc::clone(&poller);
        let interval = config.poll_interval();
        tokio::spawn(async move {
            match poller.reload_window().await {
                Ok(report) => info!(
                    "Cold start complete ({} failure(s), published={})",
                    report.failures.len(),
                    report.published
                ),
                Err(e) => warn!("Cold start failed: {}", e),
            }
            poller.start(interval);
        });
    }

    let app = api::router(AppState {
        poller: Arc::clone(&poller),
    });
    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address {:?}", config.listen_addr))?;
    info!("Scoreboard API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run API server (blocks until Ctrl-C)
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown requested");
        })
        .await?;

    poller.stop();
    info!("Shut down");
    Ok(())
}
