//! Room-facing request and response payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::format_system_time,
    state::{
        machine::RoomStatus,
        room::{GameMode, Player, Question, QuestionRound, Room, TeamId},
    },
};

/// Payload used to create a new room. Bounds beyond these static checks
/// (configured caps) are enforced by the service.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRoomRequest {
    /// Display name of the room.
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    /// FFA or TEAM.
    pub game_mode: GameMode,
    /// Roster capacity, at least 2.
    #[validate(range(min = 2))]
    pub max_players: usize,
    /// Number of questions to play, at least 1.
    #[validate(range(min = 1))]
    pub question_count: usize,
    /// Answer window per question in seconds, at least 1.
    #[validate(range(min = 1))]
    pub time_per_question_seconds: u64,
    /// Identity of the creator, registered as the first player.
    pub creator_id: Uuid,
    /// Display name of the creator.
    #[validate(length(min = 1, max = 64))]
    pub creator_name: String,
}

/// Response to a successful room creation.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateRoomResponse {
    /// Shareable room code.
    pub code: String,
}

/// Payload used to join a room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRoomRequest {
    /// Identity of the joining player.
    pub player_id: Uuid,
    /// Display name of the joining player.
    #[validate(length(min = 1, max = 64))]
    pub display_name: String,
}

/// Payload identifying the acting player for leave/ready/start requests.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlayerActionRequest {
    /// Identity of the acting player.
    pub player_id: Uuid,
}

/// Response to a ready toggle.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// The player's readiness after the toggle.
    pub is_ready: bool,
    /// Whether every player in the room is now ready.
    pub all_ready: bool,
}

/// Payload used to switch teams in TEAM mode.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SwitchTeamRequest {
    /// Identity of the acting player.
    pub player_id: Uuid,
    /// Team to join.
    pub team: TeamId,
}

/// Payload used to submit an authoritative answer.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnswerRequest {
    /// Identity of the answering player.
    pub player_id: Uuid,
    /// Index of the question being answered; must match the current question.
    pub question_index: usize,
    /// Chosen option index.
    pub option_index: usize,
}

/// Response to an accepted answer. The points shown are provisional; the
/// authoritative delta is computed once at settlement and reported in
/// `question_result`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerResponse {
    /// Whether the submitted option is the correct one.
    pub is_correct: bool,
    /// Provisional points for this submission as it stands.
    pub points_awarded: u32,
}

/// Payload used to suggest an answer to teammates (TEAM mode).
#[derive(Debug, Deserialize, ToSchema)]
pub struct SuggestRequest {
    /// Identity of the suggesting player.
    pub player_id: Uuid,
    /// Suggested option index.
    pub option_index: usize,
}

/// Lobby listing entry for a joinable room.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomSummary {
    /// Shareable room code.
    pub code: String,
    /// Display name of the room.
    pub name: String,
    /// FFA or TEAM.
    pub game_mode: GameMode,
    /// Current roster size.
    pub current_players: usize,
    /// Roster capacity.
    pub max_players: usize,
    /// Lifecycle status.
    pub status: RoomStatus,
}

impl RoomSummary {
    /// Project a room into its lobby listing entry.
    pub fn from_room(room: &Room) -> Self {
        Self {
            code: room.code.clone(),
            name: room.config.name.clone(),
            game_mode: room.config.mode,
            current_players: room.players.len(),
            max_players: room.config.max_players,
            status: room.status,
        }
    }
}

/// Response to the lobby listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomListResponse {
    /// Joinable rooms.
    pub rooms: Vec<RoomSummary>,
}

/// One roster entry in a snapshot.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerSummary {
    /// Player identity.
    pub player_id: Uuid,
    /// Display name.
    pub display_name: String,
    /// Team assignment, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<TeamId>,
    /// Whether this player answers for their team.
    pub is_captain: bool,
    /// Pre-start readiness.
    pub is_ready: bool,
    /// Cumulative score.
    pub score: u32,
    /// Current correct-answer streak.
    pub streak: u32,
    /// Join time, RFC 3339.
    pub joined_at: String,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            player_id: player.user_id,
            display_name: player.display_name.clone(),
            team: player.team,
            is_captain: player.is_captain,
            is_ready: player.is_ready,
            score: player.score,
            streak: player.streak,
            joined_at: format_system_time(player.joined_at),
        }
    }
}

/// The question currently open for answers, with the correct index withheld.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentQuestionView {
    /// Index of the question within the match.
    pub index: usize,
    /// Prompt text.
    pub prompt: String,
    /// Answer options.
    pub options: Vec<String>,
    /// Answer window in seconds.
    pub time_limit_seconds: u64,
    /// Submission deadline as unix milliseconds.
    pub ends_at_ms: u64,
}

impl CurrentQuestionView {
    /// Build the client view of an open round.
    pub fn from_round(round: &QuestionRound, question: &Question, time_limit_seconds: u64) -> Self {
        Self {
            index: round.index,
            prompt: question.prompt.clone(),
            options: question.options.clone(),
            time_limit_seconds,
            ends_at_ms: round.ends_at_ms,
        }
    }
}

/// Full reconciliation view for polling clients: the authoritative room
/// state plus the version of the last committed change.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomSnapshot {
    /// Room metadata.
    pub room: RoomSummary,
    /// Roster, in leaderboard order.
    pub players: Vec<PlayerSummary>,
    /// Question count configured for the match.
    pub question_count: usize,
    /// Index of the question most recently started, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question_index: Option<usize>,
    /// The open question, while one is running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<CurrentQuestionView>,
    /// Monotonic version of the last committed state change.
    pub room_version: u64,
}

impl RoomSnapshot {
    /// Project a room into the polling snapshot. The open round is included
    /// only while it is unsettled, and never leaks the correct option.
    pub fn from_room(room: &Room) -> Self {
        let current_question = room.round.as_ref().filter(|r| !r.settled).and_then(|r| {
            room.questions.get(r.index).map(|question| {
                CurrentQuestionView::from_round(r, question, room.config.time_per_question_secs)
            })
        });

        Self {
            room: RoomSummary::from_room(room),
            players: room.leaderboard().into_iter().map(Into::into).collect(),
            question_count: room.config.question_count,
            current_question_index: room.current_index,
            current_question,
            room_version: room.version,
        }
    }
}
