use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::payload::{OptionalPayload, Payload};
use crate::auth::tickets::IssuedTicket;
use crate::auth::Actor;
use crate::channel::protocol::location_frame;
use crate::channel::ChannelEvent;
use crate::engine::lifecycle::MilestoneStep;
use crate::engine::transportation::{
    self, LocationSnapshot, MilestoneRequest, RatingOutcome, Scope, TransitionOutcome,
};
use crate::error::AppError;
use crate::models::transportation::{LocationHistory, Transportation, TransportationUpdate};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/transportations", get(list_transportations))
        .route("/transportations/:id", get(get_transportation))
        .route("/transportations/:id/request-pickup", post(request_pickup))
        .route("/transportations/:id/confirm-pickup", post(confirm_pickup))
        .route("/transportations/:id/request-delivery", post(request_delivery))
        .route("/transportations/:id/confirm-delivery", post(confirm_delivery))
        .route("/transportations/:id/cancel", post(cancel_transportation))
        .route("/transportations/:id/rate", post(rate_transportation))
        .route("/transportations/:id/notes", get(list_notes).post(add_note))
        .route("/transportations/:id/location", get(location_snapshot).post(update_location))
        .route("/transportations/:id/locations", get(location_history))
        .route("/transportations/:id/channel-ticket", post(channel_ticket))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub scope: Option<Scope>,
}

#[derive(Deserialize, Default)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct RateRequest {
    pub rating: i64,
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct NoteRequest {
    pub note: String,
}

#[derive(Deserialize)]
pub struct LocationRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

async fn list_transportations(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Transportation>> {
    Json(transportation::list_for_actor(&state, actor, query.scope))
}

async fn get_transportation(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Transportation>, AppError> {
    Ok(Json(transportation::get(&state, actor, id)?))
}

async fn milestone(
    state: &AppState,
    actor: Actor,
    id: Uuid,
    step: MilestoneStep,
    request: MilestoneRequest,
) -> Result<Json<TransitionOutcome>, AppError> {
    let outcome = transportation::advance(state, actor, id, step, request, Utc::now()).await?;
    Ok(Json(outcome))
}

async fn request_pickup(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    OptionalPayload(payload): OptionalPayload<MilestoneRequest>,
) -> Result<Json<TransitionOutcome>, AppError> {
    milestone(&state, actor, id, MilestoneStep::RequestPickup, payload).await
}

async fn confirm_pickup(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    OptionalPayload(payload): OptionalPayload<MilestoneRequest>,
) -> Result<Json<TransitionOutcome>, AppError> {
    milestone(&state, actor, id, MilestoneStep::ConfirmPickup, payload).await
}

async fn request_delivery(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    OptionalPayload(payload): OptionalPayload<MilestoneRequest>,
) -> Result<Json<TransitionOutcome>, AppError> {
    milestone(&state, actor, id, MilestoneStep::RequestDelivery, payload).await
}

async fn confirm_delivery(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    OptionalPayload(payload): OptionalPayload<MilestoneRequest>,
) -> Result<Json<TransitionOutcome>, AppError> {
    milestone(&state, actor, id, MilestoneStep::ConfirmDelivery, payload).await
}

async fn cancel_transportation(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    OptionalPayload(request): OptionalPayload<CancelRequest>,
) -> Result<Json<Transportation>, AppError> {
    Ok(Json(
        transportation::cancel(&state, actor, id, request.reason, Utc::now()).await?,
    ))
}

async fn rate_transportation(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Payload(payload): Payload<RateRequest>,
) -> Result<Json<RatingOutcome>, AppError> {
    // Out-of-range values are reported by the engine after its role and
    // status checks.
    let rating = u8::try_from(payload.rating).unwrap_or(0);
    Ok(Json(
        transportation::rate(&state, actor, id, rating, payload.comment, Utc::now()).await?,
    ))
}

async fn add_note(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Payload(payload): Payload<NoteRequest>,
) -> Result<Json<TransportationUpdate>, AppError> {
    Ok(Json(
        transportation::add_note(&state, actor, id, payload.note, Utc::now()).await?,
    ))
}

async fn list_notes(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TransportationUpdate>>, AppError> {
    Ok(Json(transportation::notes(&state, actor, id)?))
}

/// Records the position and fans it out to everyone on the channel.
async fn update_location(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Payload(payload): Payload<LocationRequest>,
) -> Result<Json<LocationHistory>, AppError> {
    let entry = transportation::update_location(
        &state,
        actor,
        id,
        payload.latitude,
        payload.longitude,
        payload.note,
        Utc::now(),
    )?;

    let frame = location_frame(
        entry.latitude,
        entry.longitude,
        entry.note.as_deref(),
        entry.recorded_at,
    );
    state
        .channels
        .publish(id, ChannelEvent::from_server(frame.to_string()));

    Ok(Json(entry))
}

async fn location_snapshot(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<LocationSnapshot>, AppError> {
    Ok(Json(transportation::snapshot(&state, actor, id)?))
}

async fn location_history(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<LocationHistory>>, AppError> {
    Ok(Json(transportation::locations(&state, actor, id, query.limit)?))
}

async fn channel_ticket(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<IssuedTicket>, AppError> {
    Ok(Json(transportation::issue_channel_ticket(
        &state,
        actor,
        id,
        Utc::now(),
    )?))
}
