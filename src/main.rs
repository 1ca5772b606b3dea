use fitness_tracker::{AppState, Settings, auth, router};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let settings = Settings::from_env()?;
    let state = AppState::new(&settings)?;
    info!(api = %state.client.base_url(), offset = %settings.utc_offset, "using backend");

    if let Some(token) = settings.initial_token.clone() {
        state.session.begin_check(token).await;
        let check = state.clone();
        tokio::spawn(async move {
            auth::verify_stored_token(&check.client, &check.session).await;
        });
    }

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
    }
    info!("shutting down");
}
