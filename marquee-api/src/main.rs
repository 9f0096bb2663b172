use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use marquee_api::{app, AppState};
use marquee_catalog::seed::demo_catalog;
use marquee_core::User;
use marquee_seating::HoldSweeper;
use marquee_store::InMemoryUserDirectory;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = marquee_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Marquee API on port {}", config.server.port);

    // Demo data until the real catalog and account services are wired in.
    let demo = demo_catalog();
    tracing::info!(screening = %demo.screening_id, "seeded demo catalog");

    let users = Arc::new(InMemoryUserDirectory::new());
    users
        .insert(User {
            id: Uuid::new_v4(),
            username: "demo".to_string(),
            email: "demo@example.com".to_string(),
        })
        .await;

    let state = AppState::build(demo.catalog.clone(), users, &config.seating);

    let sweeper = HoldSweeper::new(
        state.registry.clone(),
        Duration::from_millis(config.seating.sweep_interval_ms),
    )
    .spawn();

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    sweeper.shutdown().await;
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl-c");
    tracing::info!("shutdown signal received");
}
