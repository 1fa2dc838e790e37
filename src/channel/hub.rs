use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

/// A pre-serialized frame fanned out to every member of one group.
#[derive(Debug, Clone)]
pub struct ChannelEvent {
    /// Connection that produced the frame; that connection skips it.
    pub origin: Option<Uuid>,
    pub body: Arc<str>,
}

impl ChannelEvent {
    pub fn from_server(body: String) -> Self {
        Self {
            origin: None,
            body: body.into(),
        }
    }

    pub fn from_connection(origin: Uuid, body: String) -> Self {
        Self {
            origin: Some(origin),
            body: body.into(),
        }
    }
}

pub struct ChannelHub {
    groups: DashMap<Uuid, broadcast::Sender<ChannelEvent>>,
    buffer_size: usize,
}

impl ChannelHub {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            groups: DashMap::new(),
            buffer_size: buffer_size.max(1),
        }
    }

    pub fn join(&self, transportation_id: Uuid) -> broadcast::Receiver<ChannelEvent> {
        self.groups
            .entry(transportation_id)
            .or_insert_with(|| broadcast::channel(self.buffer_size).0)
            .subscribe()
    }

    /// Drops the group once its last receiver is gone. Call after the
    /// member's receiver has been dropped.
    pub fn leave(&self, transportation_id: Uuid) {
        self.groups
            .remove_if(&transportation_id, |_, sender| sender.receiver_count() == 0);
    }

    /// Returns how many members the event was queued for. Publishing to a
    /// group nobody has joined is a no-op.
    pub fn publish(&self, transportation_id: Uuid, event: ChannelEvent) -> usize {
        match self.groups.get(&transportation_id) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    pub fn member_count(&self, transportation_id: Uuid) -> usize {
        self.groups
            .get(&transportation_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
