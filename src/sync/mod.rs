//! Replication and room orchestration on top of the deterministic engine.

pub mod replica;
pub mod room;

pub use replica::{EventEnvelope, Replica};
pub use room::{RoomError, RoomHandle, spawn_room};
