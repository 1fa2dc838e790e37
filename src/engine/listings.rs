use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{Actor, Role};
use crate::error::AppError;
use crate::geo::checked_point;
use crate::models::cargo_post::{CargoPost, CargoPostStatus, CargoType, VehicleType};
use crate::models::place::Place;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct NewCargoPost {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub cargo_type: CargoType,
    pub weight_kg: Option<f64>,
    pub volume_m3: Option<f64>,
    pub package_count: Option<u32>,
    pub pickup: Place,
    pub delivery: Place,
    pub pickup_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub price: Option<f64>,
    pub required_vehicle: Option<VehicleType>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewCargoPost {
    fn validate(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Invalid("title must not be empty".to_string()));
        }

        for (field, value) in [
            ("weight_kg", self.weight_kg),
            ("volume_m3", self.volume_m3),
            ("price", self.price),
        ] {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(AppError::Invalid(format!(
                        "{field} must be a non-negative number"
                    )));
                }
            }
        }

        for (field, place) in [("pickup", &self.pickup), ("delivery", &self.delivery)] {
            if place.address.trim().is_empty() {
                return Err(AppError::Invalid(format!("{field} address must not be empty")));
            }
            if let Some(point) = place.location {
                checked_point(point.lat, point.lng).ok_or_else(|| {
                    AppError::Invalid(format!("{field} coordinates are out of range"))
                })?;
            }
        }

        if let (Some(pickup), Some(delivery)) = (self.pickup_date, self.delivery_date) {
            if delivery < pickup {
                return Err(AppError::Invalid(
                    "delivery_date must not be before pickup_date".to_string(),
                ));
            }
        }

        if self.expires_at.is_some_and(|at| at <= now) {
            return Err(AppError::Invalid("expires_at must be in the future".to_string()));
        }

        Ok(())
    }
}

pub fn create_post(
    state: &AppState,
    actor: Actor,
    new: NewCargoPost,
    now: DateTime<Utc>,
) -> Result<CargoPost, AppError> {
    actor.require_role(Role::CargoOwner, "create cargo posts")?;
    new.validate(now)?;

    let post = CargoPost {
        id: Uuid::new_v4(),
        owner_id: actor.user_id,
        title: new.title.trim().to_string(),
        description: new.description,
        cargo_type: new.cargo_type,
        weight_kg: new.weight_kg,
        volume_m3: new.volume_m3,
        package_count: new.package_count,
        pickup: new.pickup,
        delivery: new.delivery,
        pickup_date: new.pickup_date,
        delivery_date: new.delivery_date,
        price: new.price,
        required_vehicle: new.required_vehicle,
        status: CargoPostStatus::Active,
        selected_transporter: None,
        offer_count: 0,
        view_count: 0,
        expires_at: new.expires_at,
        created_at: now,
        updated_at: now,
    };

    state.cargo_posts.insert(post.id, post.clone());
    info!(post_id = %post.id, owner_id = %post.owner_id, "cargo post created");

    Ok(post)
}

/// Returns the post and counts the view.
pub fn view_post(state: &AppState, id: Uuid) -> Result<CargoPost, AppError> {
    let mut post = state
        .cargo_posts
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("cargo post {id} not found")))?;

    post.view_count = post.view_count.saturating_add(1);
    Ok(post.clone())
}

pub fn find_post(state: &AppState, id: Uuid) -> Result<CargoPost, AppError> {
    state
        .cargo_posts
        .get(&id)
        .map(|post| post.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("cargo post {id} not found")))
}

/// Active listings that have not passed their expiry, newest first.
pub fn list_active(state: &AppState, now: DateTime<Utc>) -> Vec<CargoPost> {
    let mut posts: Vec<CargoPost> = state
        .cargo_posts
        .iter()
        .filter(|entry| entry.status == CargoPostStatus::Active && !entry.is_expired(now))
        .map(|entry| entry.value().clone())
        .collect();

    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    posts
}

pub fn list_owned(state: &AppState, actor: Actor) -> Result<Vec<CargoPost>, AppError> {
    actor.require_role(Role::CargoOwner, "list their cargo posts")?;

    let mut posts: Vec<CargoPost> = state
        .cargo_posts
        .iter()
        .filter(|entry| entry.owner_id == actor.user_id)
        .map(|entry| entry.value().clone())
        .collect();

    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(posts)
}

/// Deletes a post and its offers. Refused once a transportation references
/// the post.
pub async fn delete_post(state: &AppState, actor: Actor, id: Uuid) -> Result<(), AppError> {
    let _guard = state.post_locks.acquire(id).await;

    let post = find_post(state, id)?;
    if post.owner_id != actor.user_id {
        warn!(post_id = %id, user_id = %actor.user_id, "refused cargo post delete by non-owner");
        return Err(AppError::Forbidden(
            "only the owner can delete a cargo post".to_string(),
        ));
    }

    let referenced = state
        .transportations
        .iter()
        .any(|entry| entry.cargo_post_id == id);
    if referenced {
        return Err(AppError::Conflict(format!(
            "cargo post {id} has a transportation and cannot be deleted"
        )));
    }

    state.offers.retain(|_, offer| offer.cargo_post_id != id);
    state.cargo_posts.remove(&id);
    state.post_locks.forget(&id);

    info!(post_id = %id, "cargo post deleted");
    Ok(())
}
