use axum::{
    Router,
    extract::{Path, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    services::{room_service, websocket_service},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/rooms/{id}/ws",
    tag = "players",
    params(("id" = Uuid, Path, description = "Identifier of the room to join")),
    responses((status = 101, description = "Switching protocols to WebSocket"))
)]
/// Upgrade the HTTP connection into a player WebSocket session for a room.
pub async fn ws_handler(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let room = room_service::require_room(&state, id)?;
    Ok(ws.on_upgrade(move |socket| websocket_service::handle_socket(room, socket)))
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/rooms/{id}/ws", get(ws_handler))
}
