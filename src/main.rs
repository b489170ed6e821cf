use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use portalrag_backend::core::{config::Settings, logging};
use portalrag_backend::server::router::router;
use portalrag_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    logging::init(&settings.log_dir);

    let state = AppState::initialize(settings).await?;

    let bind_addr = format!("127.0.0.1:{}", state.settings.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
