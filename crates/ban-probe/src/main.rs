//! Ban Probe - Entry point.

use ban_probe::{
    api::{create_router, AppState},
    config::Config,
    limiter::spawn_sweeper,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Ban Probe");

    let state = match AppState::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to initialize probe pipeline: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        rate_limit_per_min = config.rate_limit_per_min,
        max_retries = config.max_retries,
        proxies = state.selector.pool().len(),
        expose_raw = config.expose_raw,
        upstream = %config.upstream.url,
        "Probe pipeline ready"
    );

    let _sweeper = spawn_sweeper(state.limiter.clone(), config.rate_limit.sweep_interval);

    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::new(
        config.server.listen_addr.parse().unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    // Run server
    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
