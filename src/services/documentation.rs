use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quiz Battle Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::rooms::create_room,
        crate::routes::rooms::list_rooms,
        crate::routes::rooms::join_room,
        crate::routes::rooms::leave_room,
        crate::routes::rooms::toggle_ready,
        crate::routes::rooms::switch_team,
        crate::routes::rooms::start_game,
        crate::routes::game::submit_answer,
        crate::routes::game::submit_suggestion,
        crate::routes::game::snapshot,
        crate::routes::sse::room_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::CreateRoomResponse,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::PlayerActionRequest,
            crate::dto::room::ReadyResponse,
            crate::dto::room::SwitchTeamRequest,
            crate::dto::room::AnswerRequest,
            crate::dto::room::AnswerResponse,
            crate::dto::room::SuggestRequest,
            crate::dto::room::RoomSummary,
            crate::dto::room::RoomListResponse,
            crate::dto::room::PlayerSummary,
            crate::dto::room::CurrentQuestionView,
            crate::dto::room::RoomSnapshot,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Room lifecycle and roster operations"),
        (name = "game", description = "In-match answer and suggestion operations"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
