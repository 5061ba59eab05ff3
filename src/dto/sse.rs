use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::game::GameSnapshot;

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    /// SSE event name, if any.
    pub event: Option<String>,
    /// Serialized event payload.
    pub data: String,
    /// Room the event concerns; `None` for process-wide events. Used for
    /// per-stream filtering, never serialized.
    pub room: Option<Uuid>,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
            room: None,
        })
    }

    /// Like [`ServerEvent::json`], scoped to a single room.
    pub fn scoped<E, T>(room: Uuid, event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        let mut server_event = Self::json(event, payload)?;
        server_event.room = Some(room);
        Ok(server_event)
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the room the stream observes.
    pub room_id: Uuid,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a board store connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever a room's state changes.
pub struct RoomChangedEvent {
    /// The room whose state changed.
    pub room_id: Uuid,
    /// The room state after the change.
    pub snapshot: GameSnapshot,
}
