use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::Utc;
use uuid::Uuid;

use crate::api::rest::payload::Payload;
use crate::auth::Actor;
use crate::engine::listings::{self, NewCargoPost};
use crate::engine::offers;
use crate::error::AppError;
use crate::models::cargo_post::CargoPost;
use crate::models::offer::Offer;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cargo-posts", get(list_active).post(create_post))
        .route("/cargo-posts/mine", get(list_mine))
        .route("/cargo-posts/:id", get(get_post).delete(delete_post))
        .route("/cargo-posts/:id/offers", get(list_offers))
}

async fn create_post(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Payload(payload): Payload<NewCargoPost>,
) -> Result<Json<CargoPost>, AppError> {
    let post = listings::create_post(&state, actor, payload, Utc::now())?;
    Ok(Json(post))
}

async fn list_active(State(state): State<Arc<AppState>>) -> Json<Vec<CargoPost>> {
    Json(listings::list_active(&state, Utc::now()))
}

async fn list_mine(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<CargoPost>>, AppError> {
    Ok(Json(listings::list_owned(&state, actor)?))
}

async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CargoPost>, AppError> {
    Ok(Json(listings::view_post(&state, id)?))
}

async fn delete_post(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    listings::delete_post(&state, actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_offers(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Offer>>, AppError> {
    Ok(Json(offers::offers_for_post(&state, actor, id)?))
}
