//! Transition rules for offers and transportations, free of any storage.

use chrono::{DateTime, Utc};

use crate::auth::Role;
use crate::error::AppError;
use crate::models::offer::OfferStatus;
use crate::models::transportation::{Transportation, TransportationStatus};

/// Every terminal offer status is reachable from `pending` and from nowhere else.
pub fn check_offer_transition(from: OfferStatus, to: OfferStatus) -> Result<(), AppError> {
    if from == OfferStatus::Pending && to.is_terminal() {
        return Ok(());
    }

    Err(AppError::InvalidState(format!(
        "offer is {from} and cannot become {to}"
    )))
}

pub fn check_transportation_transition(
    from: TransportationStatus,
    to: TransportationStatus,
) -> Result<(), AppError> {
    use TransportationStatus::*;

    let legal = matches!(
        (from, to),
        (AwaitingPickup, InTransit)
            | (InTransit, Completed)
            | (AwaitingPickup, Cancelled)
            | (InTransit, Cancelled)
    );

    if legal {
        Ok(())
    } else {
        Err(AppError::InvalidState(format!(
            "transportation is {from} and cannot become {to}"
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneStep {
    RequestPickup,
    ConfirmPickup,
    RequestDelivery,
    ConfirmDelivery,
}

impl MilestoneStep {
    pub fn name(self) -> &'static str {
        match self {
            MilestoneStep::RequestPickup => "request_pickup",
            MilestoneStep::ConfirmPickup => "confirm_pickup",
            MilestoneStep::RequestDelivery => "request_delivery",
            MilestoneStep::ConfirmDelivery => "confirm_delivery",
        }
    }

    /// Requests come from the transporter, confirmations from the cargo owner.
    pub fn performed_by(self) -> Role {
        match self {
            MilestoneStep::RequestPickup | MilestoneStep::RequestDelivery => Role::Transporter,
            MilestoneStep::ConfirmPickup | MilestoneStep::ConfirmDelivery => Role::CargoOwner,
        }
    }

    pub fn required_status(self) -> TransportationStatus {
        match self {
            MilestoneStep::RequestPickup | MilestoneStep::ConfirmPickup => {
                TransportationStatus::AwaitingPickup
            }
            MilestoneStep::RequestDelivery | MilestoneStep::ConfirmDelivery => {
                TransportationStatus::InTransit
            }
        }
    }

    pub fn resulting_status(self) -> TransportationStatus {
        match self {
            MilestoneStep::RequestPickup => TransportationStatus::AwaitingPickup,
            MilestoneStep::ConfirmPickup | MilestoneStep::RequestDelivery => {
                TransportationStatus::InTransit
            }
            MilestoneStep::ConfirmDelivery => TransportationStatus::Completed,
        }
    }

    pub fn default_note(self) -> &'static str {
        match self {
            MilestoneStep::RequestPickup => "Ready for pickup.",
            MilestoneStep::ConfirmPickup => "Pickup confirmed.",
            MilestoneStep::RequestDelivery => "Cargo delivered.",
            MilestoneStep::ConfirmDelivery => "Delivery confirmed.",
        }
    }

    /// Checks the status precondition and, for confirmations, that the
    /// counterpart has already requested.
    pub fn check(self, transportation: &Transportation) -> Result<(), AppError> {
        let required = self.required_status();
        if transportation.status != required {
            return Err(AppError::InvalidState(format!(
                "transportation is {}, {} requires {required}",
                transportation.status,
                self.name()
            )));
        }

        match self {
            MilestoneStep::ConfirmPickup if !transportation.pickup_requested => {
                Err(AppError::InvalidState(format!(
                    "transportation is {} and pickup has not been requested yet",
                    transportation.status
                )))
            }
            MilestoneStep::ConfirmDelivery if !transportation.delivery_requested => {
                Err(AppError::InvalidState(format!(
                    "transportation is {} and delivery has not been requested yet",
                    transportation.status
                )))
            }
            _ => Ok(()),
        }
    }

    /// Applies the step to a copy that has already passed [`MilestoneStep::check`].
    pub fn apply(self, transportation: &mut Transportation, now: DateTime<Utc>) {
        match self {
            MilestoneStep::RequestPickup => {
                transportation.pickup_requested = true;
                transportation.pickup_requested_at = Some(now);
            }
            MilestoneStep::ConfirmPickup => {
                transportation.pickup_confirmed = true;
                transportation.pickup_confirmed_at = Some(now);
            }
            MilestoneStep::RequestDelivery => {
                transportation.delivery_requested = true;
                transportation.delivery_requested_at = Some(now);
            }
            MilestoneStep::ConfirmDelivery => {
                transportation.delivery_confirmed = true;
                transportation.delivery_confirmed_at = Some(now);
                transportation.completed_at = Some(now);
            }
        }
        transportation.status = self.resulting_status();
    }
}
