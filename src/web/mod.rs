mod error;
mod extractors;
mod handlers;
mod routes;
pub mod security;
mod state;

pub use handlers::public::embed_url;
pub use state::AppState;

use crate::services::auth;
use crate::{Config, Database};
use anyhow::Result;
use axum::middleware;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// Covers a form submission whose notification email exhausts every retry.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Builds the full application router around a prepared state.
pub fn router(state: Arc<AppState>) -> Router {
    let max_upload = state.config.uploads.max_bytes;

    Router::new()
        .merge(routes::public_routes())
        .merge(routes::api_routes())
        .merge(routes::admin_routes(max_upload))
        .fallback(handlers::public::fallback)
        .layer(middleware::from_fn(security::apply_security_headers))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config, db: Database, addr: &str) -> Result<()> {
    let state = Arc::new(AppState::new(config, db.clone())?);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match auth::cleanup_expired_sessions(&db) {
                Ok(0) => {}
                Ok(n) => tracing::info!("Removed {} expired sessions", n),
                Err(e) => tracing::warn!("Session cleanup failed: {}", e),
            }
        }
    });

    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
