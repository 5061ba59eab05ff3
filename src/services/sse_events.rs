use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        game::GameSnapshot,
        sse::{RoomChangedEvent, ServerEvent, SystemStatus},
    },
    state::SseHub,
};

const EVENT_ROOM_CHANGED: &str = "room_changed";
const EVENT_SYSTEM_STATUS: &str = "system_status";

/// Broadcast the fresh state of a room after an event was applied.
pub fn broadcast_room_snapshot(hub: &SseHub, room_id: Uuid, snapshot: &GameSnapshot) {
    let payload = RoomChangedEvent {
        room_id,
        snapshot: snapshot.clone(),
    };
    send_scoped_event(hub, room_id, EVENT_ROOM_CHANGED, &payload);
}

/// Broadcast a degraded-mode flip to every connected stream.
pub fn broadcast_system_status(hub: &SseHub, degraded: bool) {
    let payload = SystemStatus { degraded };
    match ServerEvent::json(Some(EVENT_SYSTEM_STATUS.to_string()), &payload) {
        Ok(event) => hub.broadcast(event),
        Err(err) => {
            warn!(event = EVENT_SYSTEM_STATUS, error = %err, "failed to serialize SSE payload");
        }
    }
}

fn send_scoped_event(hub: &SseHub, room_id: Uuid, event: &str, payload: &impl Serialize) {
    match ServerEvent::scoped(room_id, Some(event.to_string()), payload) {
        Ok(event) => hub.broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}
