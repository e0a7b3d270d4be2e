use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tracing::info;

pub mod dashboard;
pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/api/articles", get(handlers::list_articles))
        .route("/api/articles/:date", get(handlers::articles_by_date))
        .route("/api/article/:id", get(handlers::get_article))
        .route("/api/dates", get(handlers::list_dates))
        .route("/api/status", get(handlers::status))
        .fallback(handlers::not_found)
        .layer(cors)
        .with_state(Arc::new(state))
}

pub async fn serve(state: AppState, addr: SocketAddr) -> dsn_core::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Dashboard listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_app(state)).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState};
    pub use dsn_core::{Article, Error, Result};
}
