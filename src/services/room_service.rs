//! Room lifecycle: board lookup, room creation, and summaries.

use uuid::Uuid;

use crate::{
    dto::game::{BoardSummary, CreateRoomRequest, RoomSummary},
    engine::{Board, GameState},
    error::ServiceError,
    state::SharedState,
    sync::{RoomHandle, spawn_room},
};

/// List the boards currently available to play.
pub async fn list_boards(state: &SharedState) -> Result<Vec<BoardSummary>, ServiceError> {
    let store = state.board_store().await.ok_or(ServiceError::Degraded)?;
    let boards = store.list_boards().await?;
    Ok(boards.into_iter().map(Into::into).collect())
}

/// Open a new room playing the requested board.
pub async fn create_room(
    state: &SharedState,
    request: CreateRoomRequest,
) -> Result<RoomSummary, ServiceError> {
    let store = state.board_store().await.ok_or(ServiceError::Degraded)?;
    let entity = store
        .find_board(request.board_id.clone())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("board `{}` not found", request.board_id)))?;

    let board = Board::from(entity);
    let game = GameState::new(board, state.config().timings);

    let id = Uuid::new_v4();
    let handle = spawn_room(id, game, request.solo, state.sse().clone());
    let summary = RoomSummary::from_handle(&handle);
    let mut snapshots = handle.watch_snapshot();
    state.rooms().insert(id, handle);

    // The room task drops its snapshot sender when the game ends; reap the
    // registry entry then so finished rooms do not accumulate.
    let registry = state.clone();
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {}
        registry.rooms().remove(&id);
        tracing::info!(room = %id, "room removed from registry");
    });

    tracing::info!(room = %id, board = %request.board_id, solo = request.solo, "room created");
    Ok(summary)
}

/// Current summary of a live room.
pub fn room_summary(state: &SharedState, id: Uuid) -> Result<RoomSummary, ServiceError> {
    let handle = require_room(state, id)?;
    Ok(RoomSummary::from_handle(&handle))
}

/// Look up a room handle, failing with `NotFound` when it does not exist.
pub fn require_room(state: &SharedState, id: Uuid) -> Result<RoomHandle, ServiceError> {
    state
        .room(id)
        .ok_or_else(|| ServiceError::NotFound(format!("room `{id}` not found")))
}
