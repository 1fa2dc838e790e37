use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::cargo_post::CargoType;
use crate::models::place::{GeoPoint, Place};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransportationStatus {
    AwaitingPickup,
    InTransit,
    Completed,
    Cancelled,
}

impl TransportationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportationStatus::AwaitingPickup => "awaiting_pickup",
            TransportationStatus::InTransit => "in_transit",
            TransportationStatus::Completed => "completed",
            TransportationStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(
            self,
            TransportationStatus::AwaitingPickup | TransportationStatus::InTransit
        )
    }
}

impl fmt::Display for TransportationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    CargoOwner,
    Transporter,
    Staff,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transportation {
    pub id: Uuid,
    pub offer_id: Uuid,
    pub cargo_post_id: Uuid,
    pub cargo_owner_id: Uuid,
    pub transporter_id: Uuid,
    pub status: TransportationStatus,
    pub price: f64,
    pub pickup: Place,
    pub delivery: Place,
    pub cargo_type: CargoType,
    pub weight_kg: Option<f64>,
    pub estimated_pickup_date: Option<NaiveDate>,
    pub estimated_delivery_date: Option<NaiveDate>,

    pub pickup_requested: bool,
    pub pickup_requested_at: Option<DateTime<Utc>>,
    pub pickup_confirmed: bool,
    pub pickup_confirmed_at: Option<DateTime<Utc>>,
    pub delivery_requested: bool,
    pub delivery_requested_at: Option<DateTime<Utc>>,
    pub delivery_confirmed: bool,
    pub delivery_confirmed_at: Option<DateTime<Utc>>,

    pub current_latitude: Option<f64>,
    pub current_longitude: Option<f64>,
    pub last_location_update: Option<DateTime<Utc>>,

    pub cancelled_by: Option<CancelledBy>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Transportation {
    pub fn current_position(&self) -> Option<GeoPoint> {
        match (self.current_latitude, self.current_longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        }
    }

    pub fn set_position(&mut self, point: GeoPoint, at: DateTime<Utc>) {
        self.current_latitude = Some(point.lat);
        self.current_longitude = Some(point.lng);
        self.last_location_update = Some(at);
    }
}

/// Audit row appended by every milestone transition and by free-text notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportationUpdate {
    pub id: Uuid,
    pub transportation_id: Uuid,
    pub user_id: Uuid,
    pub note: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationHistory {
    pub id: Uuid,
    pub transportation_id: Uuid,
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportationRating {
    pub id: Uuid,
    pub transportation_id: Uuid,
    pub from_cargo_owner: bool,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}
