use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::payload::{OptionalPayload, Payload};
use crate::auth::Actor;
use crate::engine::offers::{self, AcceptOutcome, NewOffer, OfferAmendment};
use crate::error::AppError;
use crate::models::offer::{Offer, OfferStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/offers", get(list_offers).post(submit_offer))
        .route("/offers/:id", get(get_offer).patch(amend_offer))
        .route("/offers/:id/accept", post(accept_offer))
        .route("/offers/:id/reject", post(reject_offer))
        .route("/offers/:id/cancel", post(cancel_offer))
        .route("/offers/:id/withdraw", post(withdraw_offer))
}

#[derive(Deserialize)]
pub struct OfferQuery {
    pub status: Option<OfferStatus>,
}

#[derive(Deserialize, Default)]
pub struct ResponseNote {
    pub response_note: Option<String>,
}

async fn submit_offer(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Payload(payload): Payload<NewOffer>,
) -> Result<Json<Offer>, AppError> {
    Ok(Json(offers::submit(&state, actor, payload, Utc::now()).await?))
}

async fn list_offers(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(query): Query<OfferQuery>,
) -> Result<Json<Vec<Offer>>, AppError> {
    Ok(Json(offers::list_for_actor(&state, actor, query.status)?))
}

async fn get_offer(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Offer>, AppError> {
    Ok(Json(offers::get_offer(&state, actor, id)?))
}

async fn amend_offer(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Payload(payload): Payload<OfferAmendment>,
) -> Result<Json<Offer>, AppError> {
    Ok(Json(
        offers::update(&state, actor, id, payload, Utc::now()).await?,
    ))
}

async fn accept_offer(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    OptionalPayload(note): OptionalPayload<ResponseNote>,
) -> Result<Json<AcceptOutcome>, AppError> {
    Ok(Json(
        offers::accept(&state, actor, id, note.response_note, Utc::now()).await?,
    ))
}

async fn reject_offer(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    OptionalPayload(note): OptionalPayload<ResponseNote>,
) -> Result<Json<Offer>, AppError> {
    Ok(Json(
        offers::reject(&state, actor, id, note.response_note, Utc::now()).await?,
    ))
}

async fn cancel_offer(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Offer>, AppError> {
    Ok(Json(offers::cancel(&state, actor, id, Utc::now()).await?))
}

async fn withdraw_offer(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Offer>, AppError> {
    Ok(Json(offers::withdraw(&state, actor, id, Utc::now()).await?))
}
