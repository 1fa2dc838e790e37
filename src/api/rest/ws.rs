use std::borrow::Cow;
use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{Actor, Role};
use crate::channel::protocol::{
    parse_client_message, stamp_location, ClientMessage, ServerMessage, CLOSE_FORBIDDEN,
    CLOSE_NOT_FOUND, CLOSE_UNAUTHENTICATED,
};
use crate::channel::ChannelEvent;
use crate::engine::transportation::{find_transportation, resolve_party, update_location};
use crate::state::AppState;

const REPLY_BUFFER: usize = 32;

#[derive(Deserialize)]
pub struct ChannelQuery {
    pub ticket: Option<String>,
}

/// One admitted connection.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub transportation_id: Uuid,
    pub connection_id: Uuid,
    pub actor: Actor,
    /// The part the user plays in this transportation.
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Refusal {
    pub code: u16,
    pub reason: &'static str,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ChannelQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, id, query.ticket))
}

/// Checks the ticket and the caller's part in the transportation. The ticket
/// is consumed even when admission fails afterwards.
pub fn admit(
    state: &AppState,
    transportation_id: Uuid,
    ticket: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Session, Refusal> {
    let ticket = ticket.filter(|t| !t.is_empty()).ok_or(Refusal {
        code: CLOSE_UNAUTHENTICATED,
        reason: "missing ticket",
    })?;

    let transportation = find_transportation(state, transportation_id).map_err(|_| Refusal {
        code: CLOSE_NOT_FOUND,
        reason: "transportation not found",
    })?;

    let actor = state
        .tickets
        .consume(ticket, transportation_id, now)
        .ok_or(Refusal {
            code: CLOSE_UNAUTHENTICATED,
            reason: "invalid or expired ticket",
        })?;

    let role = resolve_party(actor, &transportation).ok_or(Refusal {
        code: CLOSE_FORBIDDEN,
        reason: "not a participant of this transportation",
    })?;

    Ok(Session {
        transportation_id,
        connection_id: Uuid::new_v4(),
        actor,
        role,
    })
}

async fn handle_socket(
    mut socket: WebSocket,
    state: Arc<AppState>,
    transportation_id: Uuid,
    ticket: Option<String>,
) {
    match admit(&state, transportation_id, ticket.as_deref(), Utc::now()) {
        Ok(session) => run_session(socket, state, session).await,
        Err(refusal) => {
            warn!(
                transportation_id = %transportation_id,
                code = refusal.code,
                reason = refusal.reason,
                "location channel refused"
            );
            let frame = CloseFrame {
                code: refusal.code,
                reason: Cow::Borrowed(refusal.reason),
            };
            let _ = socket.send(Message::Close(Some(frame))).await;
        }
    }
}

async fn run_session(socket: WebSocket, state: Arc<AppState>, session: Session) {
    let id = session.transportation_id;
    let mut events = BroadcastStream::new(state.channels.join(id));

    let joined = ServerMessage::ParticipantJoined {
        user_id: session.actor.user_id,
        role: session.role,
        timestamp: Utc::now(),
    };
    state.channels.publish(
        id,
        ChannelEvent::from_connection(session.connection_id, joined.to_text()),
    );
    state.metrics.channel_connections.inc();
    info!(
        transportation_id = %id,
        user_id = %session.actor.user_id,
        role = %session.role,
        "location channel joined"
    );

    let (mut sender, mut receiver) = socket.split();
    let (reply_tx, mut reply_rx) = mpsc::channel::<String>(REPLY_BUFFER);

    let mut send_task = tokio::spawn(async move {
        loop {
            let text = tokio::select! {
                Some(reply) = reply_rx.recv() => reply,
                event = events.next() => match event {
                    Some(Ok(event)) if event.origin == Some(session.connection_id) => continue,
                    Some(Ok(event)) => event.body.to_string(),
                    Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                        warn!(transportation_id = %id, skipped, "location channel receiver lagged");
                        continue;
                    }
                    None => break,
                },
            };

            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(text) => handle_frame(&recv_state, session, &text, &reply_tx).await,
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // The receiver must be dropped before leaving so an empty group is removed.
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            let _ = recv_task.await;
        }
        _ = &mut recv_task => {
            send_task.abort();
            let _ = send_task.await;
        }
    }

    state.channels.leave(id);
    state.metrics.channel_connections.dec();
    info!(transportation_id = %id, user_id = %session.actor.user_id, "location channel left");
}

async fn handle_frame(
    state: &AppState,
    session: Session,
    text: &str,
    replies: &mpsc::Sender<String>,
) {
    let (message, raw) = match parse_client_message(text) {
        Ok(parsed) => parsed,
        Err(err) => {
            count(state, "malformed");
            let reply = ServerMessage::Error {
                message: format!("unrecognized message: {err}"),
            };
            let _ = replies.send(reply.to_text()).await;
            return;
        }
    };

    match message {
        ClientMessage::Ping => {
            count(state, "ping");
            let pong = ServerMessage::Pong {
                timestamp: Utc::now(),
            };
            let _ = replies.send(pong.to_text()).await;
        }
        ClientMessage::LocationUpdate {
            latitude,
            longitude,
            note,
        } => {
            if session.role != Role::Transporter {
                count(state, "ignored");
                debug!(
                    transportation_id = %session.transportation_id,
                    user_id = %session.actor.user_id,
                    "ignored location update from non-transporter"
                );
                return;
            }

            let now = Utc::now();
            match update_location(
                state,
                session.actor,
                session.transportation_id,
                latitude,
                longitude,
                note,
                now,
            ) {
                Ok(_) => {
                    count(state, "location_update");
                    let frame = stamp_location(raw, now);
                    state.channels.publish(
                        session.transportation_id,
                        ChannelEvent::from_connection(session.connection_id, frame.to_string()),
                    );
                }
                Err(err) => {
                    count(state, "rejected");
                    warn!(
                        transportation_id = %session.transportation_id,
                        error = %err,
                        "location update rejected"
                    );
                    let reply = ServerMessage::Error {
                        message: err.to_string(),
                    };
                    let _ = replies.send(reply.to_text()).await;
                }
            }
        }
    }
}

fn count(state: &AppState, kind: &str) {
    state
        .metrics
        .channel_messages_total
        .with_label_values(&[kind])
        .inc();
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::admit;
    use crate::auth::{Actor, Role};
    use crate::channel::protocol::{CLOSE_FORBIDDEN, CLOSE_NOT_FOUND, CLOSE_UNAUTHENTICATED};
    use crate::models::cargo_post::CargoType;
    use crate::models::place::Place;
    use crate::models::transportation::{Transportation, TransportationStatus};
    use crate::state::AppState;

    fn seeded() -> (AppState, Transportation) {
        let state = AppState::new(b"unit-test-secret-0123".to_vec(), 16, Duration::minutes(30));
        let place = Place {
            address: "Depot".to_string(),
            city: None,
            country: "Türkiye".to_string(),
            location: None,
        };
        let t = Transportation {
            id: Uuid::new_v4(),
            offer_id: Uuid::new_v4(),
            cargo_post_id: Uuid::new_v4(),
            cargo_owner_id: Uuid::new_v4(),
            transporter_id: Uuid::new_v4(),
            status: TransportationStatus::InTransit,
            price: 300.0,
            pickup: place.clone(),
            delivery: place,
            cargo_type: CargoType::General,
            weight_kg: None,
            estimated_pickup_date: None,
            estimated_delivery_date: None,
            pickup_requested: true,
            pickup_requested_at: None,
            pickup_confirmed: true,
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
            created_at: Utc::now(),
        };
        state.transportations.insert(t.id, t.clone());
        (state, t)
    }

    #[test]
    fn participant_is_admitted_once() {
        let (state, t) = seeded();
        let owner = Actor::new(t.cargo_owner_id, Role::CargoOwner);
        let issued = state.tickets.issue(owner, t.id, Utc::now());

        let session = admit(&state, t.id, Some(&issued.ticket), Utc::now()).unwrap();
        assert_eq!(session.role, Role::CargoOwner);

        let refusal = admit(&state, t.id, Some(&issued.ticket), Utc::now()).unwrap_err();
        assert_eq!(refusal.code, CLOSE_UNAUTHENTICATED);
    }

    #[test]
    fn staff_is_admitted_as_staff() {
        let (state, t) = seeded();
        let staff = Actor::new(Uuid::new_v4(), Role::Staff);
        let issued = state.tickets.issue(staff, t.id, Utc::now());

        let session = admit(&state, t.id, Some(&issued.ticket), Utc::now()).unwrap();
        assert_eq!(session.role, Role::Staff);
        assert_eq!(session.actor.user_id, staff.user_id);
    }

    #[test]
    fn refusal_codes_are_distinct() {
        let (state, t) = seeded();

        assert_eq!(
            admit(&state, t.id, None, Utc::now()).unwrap_err().code,
            CLOSE_UNAUTHENTICATED
        );
        assert_eq!(
            admit(&state, Uuid::new_v4(), Some("whatever"), Utc::now())
                .unwrap_err()
                .code,
            CLOSE_NOT_FOUND
        );

        let stranger = Actor::new(Uuid::new_v4(), Role::Transporter);
        let issued = state.tickets.issue(stranger, t.id, Utc::now());
        assert_eq!(
            admit(&state, t.id, Some(&issued.ticket), Utc::now())
                .unwrap_err()
                .code,
            CLOSE_FORBIDDEN
        );
    }
}
