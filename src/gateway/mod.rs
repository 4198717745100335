//! Axum HTTP surface: `initiateTransfer`, `getTransfer`, and the health
//! check (spec.md §6, §14). Out-of-scope per spec.md §1: routing/auth at
//! the edge, JWT verification, admin aggregation endpoints — this crate's
//! gateway is the orchestration kernel's own minimal surface, not the
//! public-facing edge service.

pub mod handlers;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;

use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health::health))
        .route("/transfers", post(handlers::transfer::initiate_transfer))
        .route("/transfers/{id}", get(handlers::transfer::get_transfer))
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, port: u16) -> std::io::Result<()> {
    let app = router(state);
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "gateway listening");
    axum::serve(listener, app).await
}
