use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
    Expired,
    Withdrawn,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Rejected => "rejected",
            OfferStatus::Cancelled => "cancelled",
            OfferStatus::Expired => "expired",
            OfferStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OfferStatus::Pending)
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: Uuid,
    pub cargo_post_id: Uuid,
    pub cargo_owner_id: Uuid,
    pub transporter_id: Uuid,
    pub price: f64,
    pub message: Option<String>,
    pub response_note: Option<String>,
    pub status: OfferStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    /// Only a pending offer can expire; terminal offers keep their status.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == OfferStatus::Pending && self.expires_at.is_some_and(|at| now > at)
    }

    pub fn hours_remaining(&self, now: DateTime<Utc>) -> Option<f64> {
        if self.status != OfferStatus::Pending {
            return None;
        }

        self.expires_at.map(|at| {
            let seconds = (at - now).num_seconds().max(0) as f64;
            seconds / 3600.0
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::{Offer, OfferStatus};

    fn offer(status: OfferStatus, expires_in: Option<Duration>) -> Offer {
        let now = Utc::now();
        Offer {
            id: Uuid::new_v4(),
            cargo_post_id: Uuid::new_v4(),
            cargo_owner_id: Uuid::new_v4(),
            transporter_id: Uuid::new_v4(),
            price: 500.0,
            message: None,
            response_note: None,
            status,
            expires_at: expires_in.map(|d| now + d),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn terminal_offer_is_never_expired() {
        let o = offer(OfferStatus::Rejected, Some(Duration::hours(-1)));
        assert!(!o.is_expired(Utc::now()));
        assert_eq!(o.hours_remaining(Utc::now()), None);
    }

    #[test]
    fn pending_offer_past_deadline_is_expired() {
        let o = offer(OfferStatus::Pending, Some(Duration::hours(-1)));
        assert!(o.is_expired(Utc::now()));
        assert_eq!(o.hours_remaining(Utc::now()), Some(0.0));
    }

    #[test]
    fn hours_remaining_counts_down() {
        let o = offer(OfferStatus::Pending, Some(Duration::hours(10)));
        let remaining = o.hours_remaining(Utc::now()).unwrap();
        assert!(remaining > 9.9 && remaining <= 10.0);
    }
}
