use std::net::SocketAddr;

use chrono::Utc;
use job_relay::config::RelayConfig;
use job_relay::forward::Forwarder;
use job_relay::relay::JobRelay;
use job_relay::server::{AppState, build_router};
use job_relay::sweeper::spawn_sweeper;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "job_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    info!(
        ttl_ms = config.ttl.as_millis() as u64,
        duplicate_window_ms = config.duplicate_window.as_millis() as u64,
        sweep_interval_ms = config.sweep_interval.as_millis() as u64,
        ranking = %config.ranking,
        channels = config.channels.len(),
        forward_targets = config.forward_targets.len(),
        "Configuration loaded"
    );

    let relay = JobRelay::new(config.queue_settings(), Utc::now());
    let forwarder = match Forwarder::new(config.forward_targets.clone(), config.forward_timeout) {
        Ok(forwarder) => forwarder,
        Err(e) => {
            error!(error = %e, "Failed to set up payload forwarding");
            return Err(e.into());
        }
    };

    let shutdown = CancellationToken::new();
    let sweeper = spawn_sweeper(relay.clone(), config.sweep_interval, shutdown.clone());

    let app = build_router(AppState::new(relay, forwarder, config.channels));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        error!(error = %e, "Sweeper task failed");
    }

    served?;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received, shutting down");
}
