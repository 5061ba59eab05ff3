use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::game::{BoardSummary, CreateRoomRequest, RoomSummary},
    error::AppError,
    services::room_service,
    state::SharedState,
};

/// Routes handling board listing and room lifecycle.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/boards", get(list_boards))
        .route("/rooms", post(create_room))
        .route("/rooms/{id}", get(get_room))
}

/// List the boards available to play.
#[utoipa::path(
    get,
    path = "/boards",
    tag = "game",
    responses(
        (status = 200, description = "Available boards", body = Vec<BoardSummary>)
    )
)]
pub async fn list_boards(
    State(state): State<SharedState>,
) -> Result<Json<Vec<BoardSummary>>, AppError> {
    let boards = room_service::list_boards(&state).await?;
    Ok(Json(boards))
}

/// Open a new room playing the requested board.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "game",
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Room created", body = RoomSummary)
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<Json<RoomSummary>, AppError> {
    payload.validate()?;
    let summary = room_service::create_room(&state, payload).await?;
    Ok(Json(summary))
}

/// Current state of a live room.
#[utoipa::path(
    get,
    path = "/rooms/{id}",
    tag = "game",
    params(("id" = Uuid, Path, description = "Identifier of the room")),
    responses(
        (status = 200, description = "Room state", body = RoomSummary)
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomSummary>, AppError> {
    let summary = room_service::room_summary(&state, id)?;
    Ok(Json(summary))
}
