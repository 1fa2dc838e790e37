use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::place::Place;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CargoPostStatus {
    Pending,
    Active,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
    Expired,
}

impl CargoPostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CargoPostStatus::Pending => "pending",
            CargoPostStatus::Active => "active",
            CargoPostStatus::Assigned => "assigned",
            CargoPostStatus::InProgress => "in_progress",
            CargoPostStatus::Completed => "completed",
            CargoPostStatus::Cancelled => "cancelled",
            CargoPostStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for CargoPostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CargoType {
    #[default]
    General,
    Bulk,
    Container,
    Breakbulk,
    Liquid,
    Vehicle,
    Machinery,
    Furniture,
    Dangerous,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    OpenTruck,
    ClosedTruck,
    RefrigeratedTruck,
    SemiTrailer,
    Lowbed,
    ContainerCarrier,
    Tanker,
    Tipper,
    Van,
    Pickup,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CargoPost {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
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
    pub status: CargoPostStatus,
    pub selected_transporter: Option<Uuid>,
    /// Number of pending offers. Maintained by the offer engine, never set directly.
    pub offer_count: u32,
    pub view_count: u64,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CargoPost {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    pub fn days_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at
            .map(|expires_at| (expires_at - now).num_days().max(0))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::{CargoPost, CargoPostStatus, CargoType};
    use crate::models::place::Place;

    fn post(expires_in: Option<Duration>) -> CargoPost {
        let now = Utc::now();
        let place = Place {
            address: "Depot 4".to_string(),
            city: None,
            country: "Türkiye".to_string(),
            location: None,
        };
        CargoPost {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "pallets".to_string(),
            description: None,
            cargo_type: CargoType::General,
            weight_kg: None,
            volume_m3: None,
            package_count: None,
            pickup: place.clone(),
            delivery: place,
            pickup_date: None,
            delivery_date: None,
            price: None,
            required_vehicle: None,
            status: CargoPostStatus::Active,
            selected_transporter: None,
            offer_count: 0,
            view_count: 0,
            expires_at: expires_in.map(|d| now + d),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn post_without_expiry_never_expires() {
        let p = post(None);
        assert!(!p.is_expired(Utc::now() + Duration::days(3650)));
        assert_eq!(p.days_remaining(Utc::now()), None);
    }

    #[test]
    fn days_remaining_floors_at_zero() {
        let p = post(Some(Duration::days(2)));
        let now = Utc::now();
        assert!(!p.is_expired(now));
        assert_eq!(p.days_remaining(now + Duration::days(5)), Some(0));
        assert!(p.is_expired(now + Duration::days(5)));
    }
}
