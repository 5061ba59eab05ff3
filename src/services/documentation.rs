use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quiz Board Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::create_room,
        crate::routes::game::get_room,
        crate::routes::game::list_boards,
        crate::routes::sse::room_stream,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::CreateRoomRequest,
            crate::dto::game::RoomSummary,
            crate::dto::game::BoardSummary,
            crate::dto::game::GameSnapshot,
            crate::dto::game::PlayerSummary,
            crate::dto::game::CategorySnapshot,
            crate::dto::game::BoardCellSnapshot,
            crate::dto::game::ClueSnapshot,
            crate::dto::game::BuzzSnapshot,
            crate::dto::game::BuzzOutcomeDto,
            crate::dto::phase::VisibleGamePhase,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::RoomChangedEvent,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Room and board management"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "players", description = "WebSocket operations for player clients"),
    )
)]
pub struct ApiDoc;
