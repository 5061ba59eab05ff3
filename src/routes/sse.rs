use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    services::{room_service, sse_service},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/rooms/{id}",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Identifier of the room to observe")),
    responses((status = 200, description = "Room SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream realtime room state changes to spectator frontends.
pub async fn room_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    room_service::require_room(&state, id)?;
    let receiver = sse_service::subscribe(&state);
    info!(room = %id, "new SSE connection");
    sse_service::broadcast_handshake(state.sse(), id, state.is_degraded().await);
    Ok(sse_service::to_sse_stream(receiver, id))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/rooms/{id}", get(room_stream))
}
