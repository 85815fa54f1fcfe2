use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::room::{CurrentQuestionView, PlayerSummary},
    state::room::{FinalScore, TeamId},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across a room's SSE channel.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
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
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a player joins the roster.
pub struct PlayerJoinedEvent {
    pub player: PlayerSummary,
    pub current_players: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a player leaves or is removed.
pub struct PlayerLeftEvent {
    pub player_id: Uuid,
    pub current_players: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a player toggles readiness.
pub struct PlayerReadyEvent {
    pub player_id: Uuid,
    pub is_ready: bool,
    pub all_ready: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a player switches teams.
pub struct TeamChangedEvent {
    pub player_id: Uuid,
    pub team: TeamId,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a team's captaincy moves to another member.
pub struct CaptainChangedEvent {
    pub team: TeamId,
    pub captain_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the match has been validated and questions are loading.
pub struct GameStartingEvent {
    pub question_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a question opens for answers.
pub struct QuestionStartEvent {
    pub question: CurrentQuestionView,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a player's answer is accepted. Correctness is withheld
/// until the round settles.
pub struct PlayerAnsweredEvent {
    pub player_id: Uuid,
    pub answered_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a team member suggests an option. Tallies count the latest
/// suggestion per distinct suggester, one slot per option.
pub struct AnswerSuggestionEvent {
    pub team: TeamId,
    pub suggester_id: Uuid,
    pub suggester_name: String,
    pub option_index: usize,
    pub tallies: Vec<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Per-player score movement inside a `question_result` event.
pub struct ScoreLine {
    pub player_id: Uuid,
    pub delta: u32,
    pub total: u32,
    pub streak: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast exactly once per question when its round settles.
pub struct QuestionResultEvent {
    pub question_index: usize,
    pub correct_option: usize,
    pub scores: Vec<ScoreLine>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the match ends, carrying the final ranking.
pub struct GameEndedEvent {
    pub final_scores: Vec<FinalScore>,
}
