use chrono::Duration;
use dashmap::DashMap;
use uuid::Uuid;

use crate::auth::tickets::TicketStore;
use crate::channel::ChannelHub;
use crate::engine::locks::LockTable;
use crate::models::cargo_post::CargoPost;
use crate::models::offer::Offer;
use crate::models::transportation::{
    LocationHistory, Transportation, TransportationRating, TransportationUpdate,
};
use crate::observability::metrics::Metrics;

/// Shared store and runtime resources.
///
/// Rows live in `DashMap`s. Multi-row transitions take the owning entity's
/// lock from `post_locks` or `transportation_locks` first; when both are
/// needed the transportation lock is taken before the post lock.
pub struct AppState {
    pub cargo_posts: DashMap<Uuid, CargoPost>,
    pub offers: DashMap<Uuid, Offer>,
    pub transportations: DashMap<Uuid, Transportation>,
    /// offer id -> transportation id
    pub transportation_by_offer: DashMap<Uuid, Uuid>,
    /// transportation id -> append-only rows
    pub updates: DashMap<Uuid, Vec<TransportationUpdate>>,
    pub location_history: DashMap<Uuid, Vec<LocationHistory>>,
    pub ratings: DashMap<Uuid, Vec<TransportationRating>>,
    pub post_locks: LockTable,
    pub transportation_locks: LockTable,
    pub channels: ChannelHub,
    pub tickets: TicketStore,
    pub auth_secret: Vec<u8>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        auth_secret: impl Into<Vec<u8>>,
        channel_buffer_size: usize,
        ticket_ttl: Duration,
    ) -> Self {
        Self {
            cargo_posts: DashMap::new(),
            offers: DashMap::new(),
            transportations: DashMap::new(),
            transportation_by_offer: DashMap::new(),
            updates: DashMap::new(),
            location_history: DashMap::new(),
            ratings: DashMap::new(),
            post_locks: LockTable::default(),
            transportation_locks: LockTable::default(),
            channels: ChannelHub::new(channel_buffer_size),
            tickets: TicketStore::new(ticket_ttl),
            auth_secret: auth_secret.into(),
            metrics: Metrics::new(),
        }
    }
}
