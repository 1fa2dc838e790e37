use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{Actor, Role};
use crate::engine::lifecycle::check_offer_transition;
use crate::engine::listings::find_post;
use crate::error::AppError;
use crate::models::cargo_post::{CargoPost, CargoPostStatus};
use crate::models::offer::{Offer, OfferStatus};
use crate::models::transportation::{Transportation, TransportationStatus};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct NewOffer {
    pub cargo_post_id: Uuid,
    pub price: f64,
    pub message: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfferAmendment {
    pub price: Option<f64>,
    pub message: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AcceptOutcome {
    pub offer: Offer,
    pub transportation: Transportation,
    /// Sibling offers rejected by this acceptance.
    pub rejected: Vec<Uuid>,
}

pub async fn submit(
    state: &AppState,
    actor: Actor,
    new: NewOffer,
    now: DateTime<Utc>,
) -> Result<Offer, AppError> {
    let result = submit_offer(state, actor, new, now).await;
    state.metrics.record_offer("submit", &result);
    result
}

async fn submit_offer(
    state: &AppState,
    actor: Actor,
    new: NewOffer,
    now: DateTime<Utc>,
) -> Result<Offer, AppError> {
    actor.require_role(Role::Transporter, "submit offers")?;
    validate_price(new.price)?;
    validate_expiry(new.expires_at, now)?;

    let post_id = new.cargo_post_id;
    let _guard = state.post_locks.acquire(post_id).await;

    let post = find_post(state, post_id)?;
    if post.status != CargoPostStatus::Active {
        return Err(AppError::InvalidState(format!(
            "cargo post is {}, offers are only accepted while active",
            post.status
        )));
    }
    if post.is_expired(now) {
        if let Some(mut stored) = state.cargo_posts.get_mut(&post_id) {
            stored.status = CargoPostStatus::Expired;
            stored.updated_at = now;
        }
        info!(post_id = %post_id, "cargo post expired");
        return Err(AppError::InvalidState(
            "cargo post is expired, offers are only accepted while active".to_string(),
        ));
    }

    let existing = offers_on_post(state, post_id);
    if existing.iter().any(|o| o.status == OfferStatus::Accepted) {
        return Err(AppError::Conflict(
            "cargo post already has an accepted offer".to_string(),
        ));
    }
    if existing
        .iter()
        .any(|o| o.transporter_id == actor.user_id && o.status == OfferStatus::Pending)
    {
        return Err(AppError::Conflict(
            "a pending offer from this transporter already exists, amend it instead".to_string(),
        ));
    }

    let offer = Offer {
        id: Uuid::new_v4(),
        cargo_post_id: post_id,
        cargo_owner_id: post.owner_id,
        transporter_id: actor.user_id,
        price: new.price,
        message: new.message,
        response_note: None,
        status: OfferStatus::Pending,
        expires_at: new.expires_at,
        created_at: now,
        updated_at: now,
    };
    state.offers.insert(offer.id, offer.clone());
    let offer_count = reconcile_offer_count(state, post_id, now);

    info!(
        offer_id = %offer.id,
        post_id = %post_id,
        transporter_id = %actor.user_id,
        price = offer.price,
        offer_count,
        "offer submitted"
    );

    Ok(offer)
}

pub async fn accept(
    state: &AppState,
    actor: Actor,
    offer_id: Uuid,
    response_note: Option<String>,
    now: DateTime<Utc>,
) -> Result<AcceptOutcome, AppError> {
    let start = Instant::now();
    let result = accept_offer(state, actor, offer_id, response_note, now).await;

    let outcome = if result.is_ok() { "success" } else { "error" };
    state
        .metrics
        .accept_latency_seconds
        .with_label_values(&[outcome])
        .observe(start.elapsed().as_secs_f64());
    state.metrics.record_offer("accept", &result);

    result
}

async fn accept_offer(
    state: &AppState,
    actor: Actor,
    offer_id: Uuid,
    response_note: Option<String>,
    now: DateTime<Utc>,
) -> Result<AcceptOutcome, AppError> {
    actor.require_role(Role::CargoOwner, "accept offers")?;

    let post_id = find_offer(state, offer_id)?.cargo_post_id;
    let _guard = state.post_locks.acquire(post_id).await;

    // Re-read under the lock; a concurrent accept may have finished first.
    let mut offer = find_offer(state, offer_id)?;
    let mut post = find_post(state, post_id)?;

    if post.owner_id != actor.user_id {
        warn!(offer_id = %offer_id, user_id = %actor.user_id, "refused accept by non-owner");
        return Err(AppError::Forbidden(
            "only the cargo post owner can accept its offers".to_string(),
        ));
    }
    if post.status != CargoPostStatus::Active {
        return Err(AppError::InvalidState(format!(
            "cargo post is {}, an offer can only be accepted while it is active",
            post.status
        )));
    }
    check_offer_transition(offer.status, OfferStatus::Accepted)?;

    if offer.is_expired(now) {
        if let Some(mut stored) = state.offers.get_mut(&offer_id) {
            stored.status = OfferStatus::Expired;
            stored.updated_at = now;
        }
        let offer_count = reconcile_offer_count(state, post_id, now);
        info!(offer_id = %offer_id, post_id = %post_id, offer_count, "offer expired");
        return Err(AppError::InvalidState(
            "offer is expired and cannot become accepted".to_string(),
        ));
    }

    let existing = state
        .transportation_by_offer
        .get(&offer_id)
        .map(|entry| *entry.value())
        .and_then(|id| state.transportations.get(&id).map(|t| t.value().clone()));
    let transportation = match existing {
        Some(transportation) => transportation,
        None => new_transportation(&offer, &post, now),
    };

    offer.status = OfferStatus::Accepted;
    offer.response_note = response_note;
    offer.updated_at = now;
    state.offers.insert(offer.id, offer.clone());

    let siblings: Vec<Uuid> = offers_on_post(state, post_id)
        .into_iter()
        .filter(|o| o.id != offer_id && o.status == OfferStatus::Pending)
        .map(|o| o.id)
        .collect();
    for id in &siblings {
        if let Some(mut sibling) = state.offers.get_mut(id) {
            sibling.status = OfferStatus::Rejected;
            sibling.updated_at = now;
        }
    }

    // offer_count keeps the number of offers the post collected.
    post.status = CargoPostStatus::Assigned;
    post.selected_transporter = Some(offer.transporter_id);
    post.updated_at = now;
    state.cargo_posts.insert(post_id, post);

    state
        .transportation_by_offer
        .insert(offer_id, transportation.id);
    state
        .transportations
        .insert(transportation.id, transportation.clone());

    info!(
        offer_id = %offer_id,
        post_id = %post_id,
        transportation_id = %transportation.id,
        rejected = siblings.len(),
        "offer accepted"
    );

    Ok(AcceptOutcome {
        offer,
        transportation,
        rejected: siblings,
    })
}

fn new_transportation(offer: &Offer, post: &CargoPost, now: DateTime<Utc>) -> Transportation {
    Transportation {
        id: Uuid::new_v4(),
        offer_id: offer.id,
        cargo_post_id: post.id,
        cargo_owner_id: offer.cargo_owner_id,
        transporter_id: offer.transporter_id,
        status: TransportationStatus::AwaitingPickup,
        price: offer.price,
        pickup: post.pickup.clone(),
        delivery: post.delivery.clone(),
        cargo_type: post.cargo_type,
        weight_kg: post.weight_kg,
        estimated_pickup_date: post.pickup_date,
        estimated_delivery_date: post.delivery_date,
        pickup_requested: false,
        pickup_requested_at: None,
        pickup_confirmed: false,
        pickup_confirmed_at: None,
        delivery_requested: false,
        delivery_requested_at: None,
        delivery_confirmed: false,
        delivery_confirmed_at: None,
        current_latitude: None,
        current_longitude: None,
        last_location_update: None,
        cancelled_by: None,
        cancellation_reason: None,
        cancelled_at: None,
        completed_at: None,
        created_at: now,
    }
}

pub async fn reject(
    state: &AppState,
    actor: Actor,
    offer_id: Uuid,
    response_note: Option<String>,
    now: DateTime<Utc>,
) -> Result<Offer, AppError> {
    let result = close_pending(
        state,
        actor,
        offer_id,
        OfferStatus::Rejected,
        response_note,
        now,
    )
    .await;
    state.metrics.record_offer("reject", &result);
    result
}

pub async fn cancel(
    state: &AppState,
    actor: Actor,
    offer_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Offer, AppError> {
    let result = close_pending(state, actor, offer_id, OfferStatus::Cancelled, None, now).await;
    state.metrics.record_offer("cancel", &result);
    result
}

pub async fn withdraw(
    state: &AppState,
    actor: Actor,
    offer_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Offer, AppError> {
    let result = close_pending(state, actor, offer_id, OfferStatus::Withdrawn, None, now).await;
    state.metrics.record_offer("withdraw", &result);
    result
}

/// Moves a pending offer to a terminal status other than accepted. The owner
/// rejects; the offer's transporter cancels or withdraws.
async fn close_pending(
    state: &AppState,
    actor: Actor,
    offer_id: Uuid,
    to: OfferStatus,
    response_note: Option<String>,
    now: DateTime<Utc>,
) -> Result<Offer, AppError> {
    let post_id = find_offer(state, offer_id)?.cargo_post_id;
    let _guard = state.post_locks.acquire(post_id).await;
    let mut offer = find_offer(state, offer_id)?;

    let permitted = match to {
        OfferStatus::Rejected => {
            actor.require_role(Role::CargoOwner, "reject offers")?;
            offer.cargo_owner_id == actor.user_id
        }
        _ => {
            actor.require_role(Role::Transporter, "cancel or withdraw offers")?;
            offer.transporter_id == actor.user_id
        }
    };
    if !permitted {
        warn!(offer_id = %offer_id, user_id = %actor.user_id, to = %to, "refused offer transition");
        return Err(AppError::Forbidden(format!(
            "offer {offer_id} does not belong to the caller"
        )));
    }
    check_offer_transition(offer.status, to)?;

    offer.status = to;
    if response_note.is_some() {
        offer.response_note = response_note;
    }
    offer.updated_at = now;
    state.offers.insert(offer.id, offer.clone());
    let offer_count = reconcile_offer_count(state, post_id, now);

    info!(offer_id = %offer_id, post_id = %post_id, status = %to, offer_count, "offer closed");
    Ok(offer)
}

/// Lets the offer's transporter amend price, message or expiry while both the
/// offer is pending and the post is still active.
pub async fn update(
    state: &AppState,
    actor: Actor,
    offer_id: Uuid,
    amendment: OfferAmendment,
    now: DateTime<Utc>,
) -> Result<Offer, AppError> {
    let result = amend_offer(state, actor, offer_id, amendment, now).await;
    state.metrics.record_offer("update", &result);
    result
}

async fn amend_offer(
    state: &AppState,
    actor: Actor,
    offer_id: Uuid,
    amendment: OfferAmendment,
    now: DateTime<Utc>,
) -> Result<Offer, AppError> {
    actor.require_role(Role::Transporter, "amend offers")?;
    if let Some(price) = amendment.price {
        validate_price(price)?;
    }
    validate_expiry(amendment.expires_at, now)?;

    let post_id = find_offer(state, offer_id)?.cargo_post_id;
    let _guard = state.post_locks.acquire(post_id).await;
    let mut offer = find_offer(state, offer_id)?;

    if offer.transporter_id != actor.user_id {
        return Err(AppError::Forbidden(format!(
            "offer {offer_id} does not belong to the caller"
        )));
    }
    if offer.status != OfferStatus::Pending {
        return Err(AppError::InvalidState(format!(
            "offer is {}, only pending offers can be amended",
            offer.status
        )));
    }
    let post = find_post(state, post_id)?;
    if post.status != CargoPostStatus::Active {
        return Err(AppError::InvalidState(format!(
            "cargo post is {}, its offers can no longer be amended",
            post.status
        )));
    }

    if let Some(price) = amendment.price {
        offer.price = price;
    }
    if let Some(message) = amendment.message {
        offer.message = Some(message);
    }
    if let Some(expires_at) = amendment.expires_at {
        offer.expires_at = Some(expires_at);
    }
    offer.updated_at = now;
    state.offers.insert(offer.id, offer.clone());

    info!(offer_id = %offer_id, price = offer.price, "offer amended");
    Ok(offer)
}

/// Recounts pending offers and stores the result on the post. Callers hold
/// the post lock. Running it twice yields the same count.
pub fn reconcile_offer_count(state: &AppState, post_id: Uuid, now: DateTime<Utc>) -> u32 {
    let pending = state
        .offers
        .iter()
        .filter(|entry| entry.cargo_post_id == post_id && entry.status == OfferStatus::Pending)
        .count();
    let pending = u32::try_from(pending).unwrap_or(u32::MAX);

    if let Some(mut post) = state.cargo_posts.get_mut(&post_id) {
        if post.offer_count != pending {
            post.offer_count = pending;
            post.updated_at = now;
        }
    }

    pending
}

pub fn find_offer(state: &AppState, id: Uuid) -> Result<Offer, AppError> {
    state
        .offers
        .get(&id)
        .map(|offer| offer.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("offer {id} not found")))
}

/// A single offer, visible to its two parties and to staff.
pub fn get_offer(state: &AppState, actor: Actor, id: Uuid) -> Result<Offer, AppError> {
    let offer = find_offer(state, id)?;
    let visible = actor.is_staff()
        || offer.transporter_id == actor.user_id
        || offer.cargo_owner_id == actor.user_id;

    if visible {
        Ok(offer)
    } else {
        Err(AppError::Forbidden(format!(
            "offer {id} does not belong to the caller"
        )))
    }
}

/// Offers on a post. The owner and staff see every offer; a transporter sees
/// only their own.
pub fn offers_for_post(
    state: &AppState,
    actor: Actor,
    post_id: Uuid,
) -> Result<Vec<Offer>, AppError> {
    let post = find_post(state, post_id)?;

    let mut offers = offers_on_post(state, post_id);
    match actor.role {
        Role::Staff => {}
        Role::CargoOwner if post.owner_id == actor.user_id => {}
        Role::Transporter => offers.retain(|o| o.transporter_id == actor.user_id),
        Role::CargoOwner => {
            return Err(AppError::Forbidden(
                "only the owner can list offers on this cargo post".to_string(),
            ))
        }
    }

    sort_newest_first(&mut offers);
    Ok(offers)
}

/// Offers sent by a transporter or received by a cargo owner.
pub fn list_for_actor(
    state: &AppState,
    actor: Actor,
    status: Option<OfferStatus>,
) -> Result<Vec<Offer>, AppError> {
    let mut offers: Vec<Offer> = state
        .offers
        .iter()
        .filter(|entry| match actor.role {
            Role::Transporter => entry.transporter_id == actor.user_id,
            Role::CargoOwner => entry.cargo_owner_id == actor.user_id,
            Role::Staff => true,
        })
        .filter(|entry| status.is_none_or(|status| entry.status == status))
        .map(|entry| entry.value().clone())
        .collect();

    sort_newest_first(&mut offers);
    Ok(offers)
}

fn offers_on_post(state: &AppState, post_id: Uuid) -> Vec<Offer> {
    state
        .offers
        .iter()
        .filter(|entry| entry.cargo_post_id == post_id)
        .map(|entry| entry.value().clone())
        .collect()
}

fn sort_newest_first(offers: &mut [Offer]) {
    offers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

fn validate_price(price: f64) -> Result<(), AppError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(AppError::Invalid("price must be a positive number".to_string()))
    }
}

fn validate_expiry(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<(), AppError> {
    if expires_at.is_some_and(|at| at <= now) {
        return Err(AppError::Invalid("expires_at must be in the future".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::{accept, cancel, reject, submit, withdraw, NewOffer};
    use crate::auth::{Actor, Role};
    use crate::engine::listings::{create_post, NewCargoPost};
    use crate::error::AppError;
    use crate::models::cargo_post::{CargoPostStatus, CargoType};
    use crate::models::offer::OfferStatus;
    use crate::models::place::Place;
    use crate::state::AppState;

    fn state() -> AppState {
        AppState::new(b"unit-test-secret-0123".to_vec(), 16, Duration::minutes(30))
    }

    fn place(address: &str) -> Place {
        Place {
            address: address.to_string(),
            city: None,
            country: "Türkiye".to_string(),
            location: None,
        }
    }

    fn post(state: &AppState, owner: Actor) -> Uuid {
        let new = NewCargoPost {
            title: "20 pallets of tiles".to_string(),
            description: None,
            cargo_type: CargoType::General,
            weight_kg: Some(8_000.0),
            volume_m3: None,
            package_count: Some(20),
            pickup: place("Gebze OSB"),
            delivery: place("Ankara OSTIM"),
            pickup_date: None,
            delivery_date: None,
            price: Some(600.0),
            required_vehicle: None,
            expires_at: None,
        };
        create_post(state, owner, new, Utc::now()).unwrap().id
    }

    fn bid(post_id: Uuid, price: f64) -> NewOffer {
        NewOffer {
            cargo_post_id: post_id,
            price,
            message: None,
            expires_at: None,
        }
    }

    fn offer_count(state: &AppState, post_id: Uuid) -> u32 {
        state.cargo_posts.get(&post_id).unwrap().offer_count
    }

    #[tokio::test]
    async fn accept_rejects_siblings_and_keeps_count() {
        let state = state();
        let owner = Actor::new(Uuid::new_v4(), Role::CargoOwner);
        let a = Actor::new(Uuid::new_v4(), Role::Transporter);
        let b = Actor::new(Uuid::new_v4(), Role::Transporter);
        let post_id = post(&state, owner);

        let o1 = submit(&state, a, bid(post_id, 500.0), Utc::now()).await.unwrap();
        assert_eq!(offer_count(&state, post_id), 1);
        let o2 = submit(&state, b, bid(post_id, 450.0), Utc::now()).await.unwrap();
        assert_eq!(offer_count(&state, post_id), 2);

        let outcome = accept(&state, owner, o1.id, None, Utc::now()).await.unwrap();
        assert_eq!(outcome.offer.status, OfferStatus::Accepted);
        assert_eq!(outcome.rejected, vec![o2.id]);
        assert_eq!(state.offers.get(&o2.id).unwrap().status, OfferStatus::Rejected);

        let stored = state.cargo_posts.get(&post_id).unwrap().clone();
        assert_eq!(stored.status, CargoPostStatus::Assigned);
        assert_eq!(stored.selected_transporter, Some(a.user_id));
        assert_eq!(stored.offer_count, 2);
        assert_eq!(outcome.transportation.transporter_id, a.user_id);
        assert_eq!(outcome.transportation.price, 500.0);
    }

    #[tokio::test]
    async fn duplicate_pending_offer_is_a_conflict() {
        let state = state();
        let owner = Actor::new(Uuid::new_v4(), Role::CargoOwner);
        let a = Actor::new(Uuid::new_v4(), Role::Transporter);
        let post_id = post(&state, owner);

        submit(&state, a, bid(post_id, 500.0), Utc::now()).await.unwrap();
        let err = submit(&state, a, bid(post_id, 480.0), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(offer_count(&state, post_id), 1);
    }

    #[tokio::test]
    async fn closing_offers_recounts_pending() {
        let state = state();
        let owner = Actor::new(Uuid::new_v4(), Role::CargoOwner);
        let a = Actor::new(Uuid::new_v4(), Role::Transporter);
        let b = Actor::new(Uuid::new_v4(), Role::Transporter);
        let c = Actor::new(Uuid::new_v4(), Role::Transporter);
        let post_id = post(&state, owner);

        let o1 = submit(&state, a, bid(post_id, 500.0), Utc::now()).await.unwrap();
        let o2 = submit(&state, b, bid(post_id, 450.0), Utc::now()).await.unwrap();
        let o3 = submit(&state, c, bid(post_id, 470.0), Utc::now()).await.unwrap();
        assert_eq!(offer_count(&state, post_id), 3);

        reject(&state, owner, o1.id, Some("too slow".to_string()), Utc::now())
            .await
            .unwrap();
        assert_eq!(offer_count(&state, post_id), 2);
        cancel(&state, b, o2.id, Utc::now()).await.unwrap();
        assert_eq!(offer_count(&state, post_id), 1);
        withdraw(&state, c, o3.id, Utc::now()).await.unwrap();
        assert_eq!(offer_count(&state, post_id), 0);

        let err = withdraw(&state, c, o3.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(msg) if msg.contains("withdrawn")));
        assert_eq!(offer_count(&state, post_id), 0);
    }

    #[tokio::test]
    async fn other_transporter_cannot_withdraw() {
        let state = state();
        let owner = Actor::new(Uuid::new_v4(), Role::CargoOwner);
        let a = Actor::new(Uuid::new_v4(), Role::Transporter);
        let intruder = Actor::new(Uuid::new_v4(), Role::Transporter);
        let post_id = post(&state, owner);

        let offer = submit(&state, a, bid(post_id, 500.0), Utc::now()).await.unwrap();
        let err = withdraw(&state, intruder, offer.id, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(state.offers.get(&offer.id).unwrap().status, OfferStatus::Pending);
    }

    #[tokio::test]
    async fn accepting_an_expired_offer_marks_it_expired() {
        let state = state();
        let owner = Actor::new(Uuid::new_v4(), Role::CargoOwner);
        let a = Actor::new(Uuid::new_v4(), Role::Transporter);
        let post_id = post(&state, owner);

        let mut new = bid(post_id, 500.0);
        new.expires_at = Some(Utc::now() + Duration::minutes(5));
        let offer = submit(&state, a, new, Utc::now()).await.unwrap();

        let later = Utc::now() + Duration::hours(1);
        let err = accept(&state, owner, offer.id, None, later).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(msg) if msg.contains("expired")));
        assert_eq!(state.offers.get(&offer.id).unwrap().status, OfferStatus::Expired);
        assert_eq!(offer_count(&state, post_id), 0);
        assert_eq!(
            state.cargo_posts.get(&post_id).unwrap().status,
            CargoPostStatus::Active
        );
    }

    #[tokio::test]
    async fn submit_after_accept_is_refused() {
        let state = state();
        let owner = Actor::new(Uuid::new_v4(), Role::CargoOwner);
        let a = Actor::new(Uuid::new_v4(), Role::Transporter);
        let b = Actor::new(Uuid::new_v4(), Role::Transporter);
        let post_id = post(&state, owner);

        let offer = submit(&state, a, bid(post_id, 500.0), Utc::now()).await.unwrap();
        accept(&state, owner, offer.id, None, Utc::now()).await.unwrap();

        let err = submit(&state, b, bid(post_id, 400.0), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(msg) if msg.contains("assigned")));
    }

    #[tokio::test]
    async fn submit_on_lapsed_post_expires_it() {
        let state = state();
        let owner = Actor::new(Uuid::new_v4(), Role::CargoOwner);
        let a = Actor::new(Uuid::new_v4(), Role::Transporter);
        let post_id = post(&state, owner);
        state.cargo_posts.get_mut(&post_id).unwrap().expires_at =
            Some(Utc::now() + Duration::hours(1));

        let later = Utc::now() + Duration::hours(2);
        let err = submit(&state, a, bid(post_id, 500.0), later)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(msg) if msg.contains("expired")));
        assert_eq!(
            state.cargo_posts.get(&post_id).unwrap().status,
            CargoPostStatus::Expired
        );
        assert!(state.offers.is_empty());
        assert_eq!(offer_count(&state, post_id), 0);
    }
}
