pub mod cargo_posts;
pub mod offers;
pub mod payload;
pub mod transportations;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(cargo_posts::router())
        .merge(offers::router())
        .merge(transportations::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws/transportations/:id", get(ws::ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    cargo_posts: usize,
    offers: usize,
    transportations: usize,
    channel_groups: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cargo_posts: state.cargo_posts.len(),
        offers: state.offers.len(),
        transportations: state.transportations.len(),
        channel_groups: state.channels.group_count(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
