use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::tickets::IssuedTicket;
use crate::auth::{Actor, Role};
use crate::engine::lifecycle::{check_transportation_transition, MilestoneStep};
use crate::engine::listings::find_post;
use crate::error::AppError;
use crate::geo::{checked_point, haversine_km};
use crate::models::cargo_post::CargoPostStatus;
use crate::models::place::GeoPoint;
use crate::models::transportation::{
    CancelledBy, LocationHistory, Transportation, TransportationRating, TransportationStatus,
    TransportationUpdate,
};
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MilestoneRequest {
    pub note: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub transportation: Transportation,
    pub update: TransportationUpdate,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingOutcome {
    pub rating: TransportationRating,
    pub both_rated: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// awaiting_pickup or in_transit
    Active,
    Completed,
    /// awaiting_pickup only
    Pending,
}

impl Scope {
    fn matches(self, status: TransportationStatus) -> bool {
        match self {
            Scope::Active => status.is_live(),
            Scope::Completed => status == TransportationStatus::Completed,
            Scope::Pending => status == TransportationStatus::AwaitingPickup,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationSnapshot {
    pub transportation_id: Uuid,
    pub status: TransportationStatus,
    pub pickup: Option<GeoPoint>,
    pub delivery: Option<GeoPoint>,
    pub current: Option<GeoPoint>,
    pub last_location_update: Option<DateTime<Utc>>,
    pub pickup_confirmed: bool,
    pub delivery_requested: bool,
    pub delivery_confirmed: bool,
    /// Great-circle distance from the current position to the delivery point.
    pub remaining_km: Option<f64>,
}

/// The part `actor` plays in `transportation`, if any.
pub fn resolve_party(actor: Actor, transportation: &Transportation) -> Option<Role> {
    match actor.role {
        Role::Transporter if actor.user_id == transportation.transporter_id => {
            Some(Role::Transporter)
        }
        Role::CargoOwner if actor.user_id == transportation.cargo_owner_id => {
            Some(Role::CargoOwner)
        }
        Role::Staff => Some(Role::Staff),
        _ => None,
    }
}

pub fn find_transportation(state: &AppState, id: Uuid) -> Result<Transportation, AppError> {
    state
        .transportations
        .get(&id)
        .map(|t| t.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("transportation {id} not found")))
}

pub async fn advance(
    state: &AppState,
    actor: Actor,
    id: Uuid,
    step: MilestoneStep,
    request: MilestoneRequest,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, AppError> {
    let result = advance_milestone(state, actor, id, step, request, now).await;
    state.metrics.record_transportation(step.name(), &result);
    result
}

async fn advance_milestone(
    state: &AppState,
    actor: Actor,
    id: Uuid,
    step: MilestoneStep,
    request: MilestoneRequest,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, AppError> {
    let _guard = state.transportation_locks.acquire(id).await;
    let transportation = find_transportation(state, id)?;

    let required = step.performed_by();
    if resolve_party(actor, &transportation) != Some(required) {
        warn!(
            transportation_id = %id,
            user_id = %actor.user_id,
            step = step.name(),
            "refused milestone by wrong party"
        );
        return Err(AppError::Forbidden(format!(
            "only the {required} of this transportation can {}",
            step.name().replace('_', " ")
        )));
    }
    step.check(&transportation)?;
    let position = request_position(&request)?;

    // Confirmations move the post along; take its lock after ours.
    let post_sync = match step {
        MilestoneStep::ConfirmPickup => Some(CargoPostStatus::InProgress),
        MilestoneStep::ConfirmDelivery => Some(CargoPostStatus::Completed),
        _ => None,
    };
    let _post_guard = match post_sync {
        Some(_) => Some(state.post_locks.acquire(transportation.cargo_post_id).await),
        None => None,
    };
    if post_sync.is_some() {
        find_post(state, transportation.cargo_post_id).map_err(|_| {
            AppError::Internal(format!("transportation {id} references a missing cargo post"))
        })?;
    }

    // Location updates skip our lock; write into the stored row, not the copy.
    let (from, transportation) = {
        let mut row = state
            .transportations
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("transportation {id} not found")))?;
        let from = row.status;
        step.apply(&mut row, now);
        if let Some(point) = position {
            row.set_position(point, now);
        }
        (from, row.value().clone())
    };

    let note = request
        .note
        .filter(|note| !note.trim().is_empty())
        .unwrap_or_else(|| step.default_note().to_string());
    let update = append_update(state, id, actor.user_id, note, position, now);

    if let Some(status) = post_sync {
        if let Some(mut post) = state.cargo_posts.get_mut(&transportation.cargo_post_id) {
            post.status = status;
            post.updated_at = now;
        }
    }

    info!(
        transportation_id = %id,
        step = step.name(),
        from = %from,
        to = %transportation.status,
        "transportation milestone recorded"
    );

    Ok(TransitionOutcome {
        transportation,
        update,
    })
}

fn request_position(request: &MilestoneRequest) -> Result<Option<GeoPoint>, AppError> {
    match (request.latitude, request.longitude) {
        (None, None) => Ok(None),
        (Some(lat), Some(lng)) => checked_point(lat, lng)
            .map(Some)
            .ok_or_else(|| AppError::Invalid("coordinates are out of range".to_string())),
        _ => Err(AppError::Invalid(
            "latitude and longitude must be given together".to_string(),
        )),
    }
}

pub async fn cancel(
    state: &AppState,
    actor: Actor,
    id: Uuid,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<Transportation, AppError> {
    let result = cancel_transportation(state, actor, id, reason, now).await;
    state.metrics.record_transportation("cancel", &result);
    result
}

async fn cancel_transportation(
    state: &AppState,
    actor: Actor,
    id: Uuid,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<Transportation, AppError> {
    let _guard = state.transportation_locks.acquire(id).await;
    let transportation = find_transportation(state, id)?;

    let cancelled_by = match resolve_party(actor, &transportation) {
        Some(Role::CargoOwner) => CancelledBy::CargoOwner,
        Some(Role::Transporter) => CancelledBy::Transporter,
        Some(Role::Staff) => CancelledBy::Staff,
        None => {
            warn!(transportation_id = %id, user_id = %actor.user_id, "refused cancel by outsider");
            return Err(AppError::Forbidden(
                "only a party of this transportation can cancel it".to_string(),
            ));
        }
    };
    check_transportation_transition(transportation.status, TransportationStatus::Cancelled)?;
    let reason = reason
        .map(|reason| reason.trim().to_string())
        .filter(|reason| !reason.is_empty())
        .ok_or_else(|| AppError::Invalid("a cancellation reason is required".to_string()))?;

    let post_id = transportation.cargo_post_id;
    let _post_guard = state.post_locks.acquire(post_id).await;
    find_post(state, post_id).map_err(|_| {
        AppError::Internal(format!("transportation {id} references a missing cargo post"))
    })?;

    let (from, transportation) = {
        let mut row = state
            .transportations
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("transportation {id} not found")))?;
        let from = row.status;
        row.status = TransportationStatus::Cancelled;
        row.cancelled_by = Some(cancelled_by);
        row.cancellation_reason = Some(reason.clone());
        row.cancelled_at = Some(now);
        (from, row.value().clone())
    };

    append_update(
        state,
        id,
        actor.user_id,
        format!("Transportation cancelled: {reason}"),
        None,
        now,
    );

    if let Some(mut post) = state.cargo_posts.get_mut(&post_id) {
        if matches!(
            post.status,
            CargoPostStatus::Assigned | CargoPostStatus::InProgress
        ) {
            post.status = CargoPostStatus::Active;
            post.selected_transporter = None;
            post.updated_at = now;
        }
    }

    info!(
        transportation_id = %id,
        post_id = %post_id,
        from = %from,
        cancelled_by = ?cancelled_by,
        "transportation cancelled"
    );

    Ok(transportation)
}

/// Records a live position. Runs without the transportation lock; the status
/// check and the position write happen under the row's map guard.
pub fn update_location(
    state: &AppState,
    actor: Actor,
    id: Uuid,
    latitude: f64,
    longitude: f64,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Result<LocationHistory, AppError> {
    let result = record_location(state, actor, id, latitude, longitude, note, now);
    state.metrics.record_transportation("update_location", &result);
    result
}

fn record_location(
    state: &AppState,
    actor: Actor,
    id: Uuid,
    latitude: f64,
    longitude: f64,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Result<LocationHistory, AppError> {
    let point = checked_point(latitude, longitude)
        .ok_or_else(|| AppError::Invalid("coordinates are out of range".to_string()))?;

    {
        let mut transportation = state
            .transportations
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("transportation {id} not found")))?;

        if resolve_party(actor, &transportation) != Some(Role::Transporter) {
            return Err(AppError::Forbidden(
                "only the assigned transporter can report its location".to_string(),
            ));
        }
        if transportation.status != TransportationStatus::InTransit {
            return Err(AppError::InvalidState(format!(
                "transportation is {}, location updates require in_transit",
                transportation.status
            )));
        }

        transportation.set_position(point, now);
    }

    let entry = LocationHistory {
        id: Uuid::new_v4(),
        transportation_id: id,
        user_id: actor.user_id,
        latitude,
        longitude,
        note,
        recorded_at: now,
    };
    state
        .location_history
        .entry(id)
        .or_default()
        .push(entry.clone());

    Ok(entry)
}

pub async fn rate(
    state: &AppState,
    actor: Actor,
    id: Uuid,
    rating: u8,
    comment: Option<String>,
    now: DateTime<Utc>,
) -> Result<RatingOutcome, AppError> {
    let result = rate_transportation(state, actor, id, rating, comment, now).await;
    state.metrics.record_transportation("rate", &result);
    result
}

async fn rate_transportation(
    state: &AppState,
    actor: Actor,
    id: Uuid,
    rating: u8,
    comment: Option<String>,
    now: DateTime<Utc>,
) -> Result<RatingOutcome, AppError> {
    let _guard = state.transportation_locks.acquire(id).await;
    let transportation = find_transportation(state, id)?;

    let from_cargo_owner = match resolve_party(actor, &transportation) {
        Some(Role::CargoOwner) => true,
        Some(Role::Transporter) => false,
        _ => {
            return Err(AppError::Forbidden(
                "only the cargo owner or the transporter can rate a transportation".to_string(),
            ))
        }
    };
    if transportation.status != TransportationStatus::Completed {
        return Err(AppError::InvalidState(format!(
            "transportation is {}, only completed transportations can be rated",
            transportation.status
        )));
    }
    if !(1..=5).contains(&rating) {
        return Err(AppError::Invalid("rating must be between 1 and 5".to_string()));
    }

    let mut ratings = state.ratings.entry(id).or_default();
    if ratings.iter().any(|r| r.from_cargo_owner == from_cargo_owner) {
        return Err(AppError::Conflict(format!(
            "the {} has already rated this transportation",
            actor.role
        )));
    }

    let created = TransportationRating {
        id: Uuid::new_v4(),
        transportation_id: id,
        from_cargo_owner,
        rating,
        comment: comment.unwrap_or_default(),
        created_at: now,
    };
    ratings.push(created.clone());
    let both_rated = ratings.iter().any(|r| r.from_cargo_owner)
        && ratings.iter().any(|r| !r.from_cargo_owner);
    drop(ratings);

    info!(transportation_id = %id, rating, from_cargo_owner, both_rated, "transportation rated");

    Ok(RatingOutcome {
        rating: created,
        both_rated,
    })
}

pub async fn add_note(
    state: &AppState,
    actor: Actor,
    id: Uuid,
    note: String,
    now: DateTime<Utc>,
) -> Result<TransportationUpdate, AppError> {
    let _guard = state.transportation_locks.acquire(id).await;
    let transportation = find_transportation(state, id)?;

    if resolve_party(actor, &transportation).is_none() {
        return Err(AppError::Forbidden(
            "only a party of this transportation can add notes".to_string(),
        ));
    }
    if transportation.status == TransportationStatus::Cancelled {
        return Err(AppError::InvalidState(
            "transportation is cancelled and takes no more notes".to_string(),
        ));
    }
    let note = note.trim();
    if note.is_empty() {
        return Err(AppError::Invalid("note must not be empty".to_string()));
    }

    Ok(append_update(
        state,
        id,
        actor.user_id,
        note.to_string(),
        None,
        now,
    ))
}

fn append_update(
    state: &AppState,
    transportation_id: Uuid,
    user_id: Uuid,
    note: String,
    position: Option<GeoPoint>,
    now: DateTime<Utc>,
) -> TransportationUpdate {
    let update = TransportationUpdate {
        id: Uuid::new_v4(),
        transportation_id,
        user_id,
        note,
        latitude: position.map(|p| p.lat),
        longitude: position.map(|p| p.lng),
        created_at: now,
    };
    state
        .updates
        .entry(transportation_id)
        .or_default()
        .push(update.clone());

    update
}

/// A transportation visible to its parties and staff.
pub fn get(state: &AppState, actor: Actor, id: Uuid) -> Result<Transportation, AppError> {
    let transportation = find_transportation(state, id)?;
    if resolve_party(actor, &transportation).is_none() {
        return Err(AppError::Forbidden(format!(
            "transportation {id} does not involve the caller"
        )));
    }
    Ok(transportation)
}

pub fn list_for_actor(state: &AppState, actor: Actor, scope: Option<Scope>) -> Vec<Transportation> {
    let mut transportations: Vec<Transportation> = state
        .transportations
        .iter()
        .filter(|entry| resolve_party(actor, entry.value()).is_some())
        .filter(|entry| scope.is_none_or(|scope| scope.matches(entry.status)))
        .map(|entry| entry.value().clone())
        .collect();

    transportations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    transportations
}

/// Audit rows in the order they were written.
pub fn notes(
    state: &AppState,
    actor: Actor,
    id: Uuid,
) -> Result<Vec<TransportationUpdate>, AppError> {
    get(state, actor, id)?;
    Ok(state
        .updates
        .get(&id)
        .map(|rows| rows.value().clone())
        .unwrap_or_default())
}

/// Location history, newest first.
pub fn locations(
    state: &AppState,
    actor: Actor,
    id: Uuid,
    limit: Option<usize>,
) -> Result<Vec<LocationHistory>, AppError> {
    get(state, actor, id)?;

    let mut rows = state
        .location_history
        .get(&id)
        .map(|rows| rows.value().clone())
        .unwrap_or_default();
    rows.reverse();
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    Ok(rows)
}

pub fn snapshot(state: &AppState, actor: Actor, id: Uuid) -> Result<LocationSnapshot, AppError> {
    let transportation = get(state, actor, id)?;
    let current = transportation.current_position();
    let delivery = transportation.delivery.location;

    Ok(LocationSnapshot {
        transportation_id: id,
        status: transportation.status,
        pickup: transportation.pickup.location,
        delivery,
        current,
        last_location_update: transportation.last_location_update,
        pickup_confirmed: transportation.pickup_confirmed,
        delivery_requested: transportation.delivery_requested,
        delivery_confirmed: transportation.delivery_confirmed,
        remaining_km: current
            .zip(delivery)
            .map(|(current, delivery)| haversine_km(&current, &delivery)),
    })
}

/// Issues a single-use location channel ticket to a participant.
pub fn issue_channel_ticket(
    state: &AppState,
    actor: Actor,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<IssuedTicket, AppError> {
    get(state, actor, id)?;
    let ticket = state.tickets.issue(actor, id, now);
    info!(transportation_id = %id, user_id = %actor.user_id, "channel ticket issued");
    Ok(ticket)
}
