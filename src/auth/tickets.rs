use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::RngCore;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::Actor;

const TICKET_BYTES: usize = 48;

#[derive(Debug, Clone)]
struct ChannelTicket {
    actor: Actor,
    transportation_id: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedTicket {
    pub ticket: String,
    pub transportation_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Single-use credentials admitting one location-channel connection for one
/// (user, transportation) pair.
pub struct TicketStore {
    tickets: DashMap<String, ChannelTicket>,
    ttl: Duration,
}

impl TicketStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tickets: DashMap::new(),
            ttl,
        }
    }

    /// Issues a fresh ticket. Older tickets for the same pair and every
    /// expired ticket are dropped.
    pub fn issue(&self, actor: Actor, transportation_id: Uuid, now: DateTime<Utc>) -> IssuedTicket {
        self.tickets.retain(|_, existing| {
            existing.expires_at > now
                && !(existing.actor.user_id == actor.user_id
                    && existing.transportation_id == transportation_id)
        });

        let mut bytes = [0u8; TICKET_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let ticket = URL_SAFE_NO_PAD.encode(bytes);
        let expires_at = now + self.ttl;

        self.tickets.insert(
            ticket.clone(),
            ChannelTicket {
                actor,
                transportation_id,
                expires_at,
            },
        );

        IssuedTicket {
            ticket,
            transportation_id,
            expires_at,
        }
    }

    /// Consumes a ticket. The ticket is gone after this call whether or not it
    /// was valid for `transportation_id`.
    pub fn consume(
        &self,
        ticket: &str,
        transportation_id: Uuid,
        now: DateTime<Utc>,
    ) -> Option<Actor> {
        let (_, entry) = self.tickets.remove(ticket)?;

        if entry.expires_at <= now || entry.transportation_id != transportation_id {
            return None;
        }

        Some(entry.actor)
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::TicketStore;
    use crate::auth::{Actor, Role};

    fn actor() -> Actor {
        Actor::new(Uuid::new_v4(), Role::Transporter)
    }

    #[test]
    fn ticket_is_single_use() {
        let store = TicketStore::new(Duration::minutes(30));
        let transportation_id = Uuid::new_v4();
        let who = actor();
        let issued = store.issue(who, transportation_id, Utc::now());

        assert_eq!(
            store.consume(&issued.ticket, transportation_id, Utc::now()),
            Some(who)
        );
        assert_eq!(store.consume(&issued.ticket, transportation_id, Utc::now()), None);
    }

    #[test]
    fn expired_ticket_is_refused() {
        let store = TicketStore::new(Duration::minutes(1));
        let transportation_id = Uuid::new_v4();
        let issued = store.issue(actor(), transportation_id, Utc::now());

        let later = Utc::now() + Duration::minutes(2);
        assert_eq!(store.consume(&issued.ticket, transportation_id, later), None);
    }

    #[test]
    fn ticket_is_bound_to_its_transportation() {
        let store = TicketStore::new(Duration::minutes(30));
        let issued = store.issue(actor(), Uuid::new_v4(), Utc::now());

        assert_eq!(store.consume(&issued.ticket, Uuid::new_v4(), Utc::now()), None);
        assert!(store.is_empty());
    }

    #[test]
    fn reissue_invalidates_previous_ticket() {
        let store = TicketStore::new(Duration::minutes(30));
        let transportation_id = Uuid::new_v4();
        let who = actor();

        let first = store.issue(who, transportation_id, Utc::now());
        let second = store.issue(who, transportation_id, Utc::now());

        assert_ne!(first.ticket, second.ticket);
        assert_eq!(store.len(), 1);
        assert_eq!(store.consume(&first.ticket, transportation_id, Utc::now()), None);
        assert_eq!(
            store.consume(&second.ticket, transportation_id, Utc::now()),
            Some(who)
        );
    }
}
