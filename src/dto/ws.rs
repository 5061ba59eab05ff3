use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{dto::game::GameSnapshot, sync::EventEnvelope};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from player WebSocket clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// First message of every connection, binding it to a stable user id.
    Hello {
        user_id: String,
    },
    /// A locally-originated game event to run through the room.
    Event {
        #[schema(value_type = Object)]
        envelope: EventEnvelope,
    },
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// The user id when this is the identification message.
    pub fn hello_user_id(&self) -> Option<&str> {
        match self {
            Self::Hello { user_id } => Some(user_id.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Messages pushed to player WebSocket clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Positive acknowledgement of [`ClientMessage::Hello`], with the
    /// current state so the client can render immediately.
    Welcome {
        user_id: String,
        snapshot: GameSnapshot,
    },
    /// An event applied by another participant of the room.
    Event {
        #[schema(value_type = Object)]
        envelope: EventEnvelope,
    },
    /// Fresh state after one of this client's events was applied.
    Snapshot { snapshot: GameSnapshot },
    /// One of this client's events did not apply; state is unchanged.
    Rejected { message: String },
}
