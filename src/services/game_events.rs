//! Versioned event emission. Every helper here bumps the room version and
//! publishes under it, so push subscribers and polling clients agree on the
//! order of committed changes. All helpers must be called while the room's
//! lock is held; that is what makes the version sequence gap-free.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        room::{CurrentQuestionView, PlayerSummary},
        sse::{
            AnswerSuggestionEvent, CaptainChangedEvent, GameEndedEvent, GameStartingEvent,
            PlayerAnsweredEvent, PlayerJoinedEvent, PlayerLeftEvent, PlayerReadyEvent,
            QuestionResultEvent, QuestionStartEvent, ScoreLine, TeamChangedEvent,
        },
    },
    state::{
        events::RoomChannel,
        room::{FinalScore, Room, TeamId},
    },
};

const EVENT_PLAYER_JOINED: &str = "player_joined";
const EVENT_PLAYER_LEFT: &str = "player_left";
const EVENT_PLAYER_READY: &str = "player_ready";
const EVENT_TEAM_CHANGED: &str = "team_changed";
const EVENT_CAPTAIN_CHANGED: &str = "captain_changed";
const EVENT_GAME_STARTING: &str = "game_starting";
const EVENT_QUESTION_START: &str = "question_start";
const EVENT_PLAYER_ANSWERED: &str = "player_answered";
const EVENT_ANSWER_SUGGESTION: &str = "answer_suggestion";
const EVENT_QUESTION_RESULT: &str = "question_result";
const EVENT_GAME_ENDED: &str = "game_ended";

/// Commit a state change: advance the room version and publish the payload
/// under it. Serialization failures are logged and swallowed; the version
/// advance still counts as a committed change for polling clients.
fn emit<T: Serialize>(room: &mut Room, channel: &RoomChannel, tag: &str, payload: &T) {
    room.version += 1;
    room.touch();
    if let Err(err) = channel.publish(tag, room.version, payload) {
        warn!(room = %room.code, event = tag, error = %err, "failed to serialize event");
    }
}

/// A player was added to the roster.
pub fn player_joined(room: &mut Room, channel: &RoomChannel, player: PlayerSummary) {
    let current_players = room.players.len();
    emit(
        room,
        channel,
        EVENT_PLAYER_JOINED,
        &PlayerJoinedEvent {
            player,
            current_players,
        },
    );
}

/// A player left or was removed.
pub fn player_left(room: &mut Room, channel: &RoomChannel, player_id: Uuid) {
    let current_players = room.players.len();
    emit(
        room,
        channel,
        EVENT_PLAYER_LEFT,
        &PlayerLeftEvent {
            player_id,
            current_players,
        },
    );
}

/// A player toggled readiness.
pub fn player_ready(room: &mut Room, channel: &RoomChannel, player_id: Uuid, is_ready: bool) {
    let all_ready = room.all_ready();
    emit(
        room,
        channel,
        EVENT_PLAYER_READY,
        &PlayerReadyEvent {
            player_id,
            is_ready,
            all_ready,
        },
    );
}

/// A player switched teams.
pub fn team_changed(room: &mut Room, channel: &RoomChannel, player_id: Uuid, team: TeamId) {
    emit(
        room,
        channel,
        EVENT_TEAM_CHANGED,
        &TeamChangedEvent { player_id, team },
    );
}

/// Captaincy moved to another team member.
pub fn captain_changed(room: &mut Room, channel: &RoomChannel, team: TeamId, captain_id: Uuid) {
    emit(
        room,
        channel,
        EVENT_CAPTAIN_CHANGED,
        &CaptainChangedEvent { team, captain_id },
    );
}

/// The match was validated and questions are being loaded.
pub fn game_starting(room: &mut Room, channel: &RoomChannel) {
    let question_count = room.config.question_count;
    emit(
        room,
        channel,
        EVENT_GAME_STARTING,
        &GameStartingEvent { question_count },
    );
}

/// A question opened for answers.
pub fn question_start(room: &mut Room, channel: &RoomChannel, question: CurrentQuestionView) {
    emit(
        room,
        channel,
        EVENT_QUESTION_START,
        &QuestionStartEvent { question },
    );
}

/// An answer was accepted; correctness stays hidden until settlement.
pub fn player_answered(room: &mut Room, channel: &RoomChannel, player_id: Uuid) {
    let answered_count = room
        .round
        .as_ref()
        .map(|round| round.answers.len())
        .unwrap_or(0);
    emit(
        room,
        channel,
        EVENT_PLAYER_ANSWERED,
        &PlayerAnsweredEvent {
            player_id,
            answered_count,
        },
    );
}

/// A team member suggested an option; tallies reflect one vote per suggester.
pub fn answer_suggestion(room: &mut Room, channel: &RoomChannel, payload: AnswerSuggestionEvent) {
    emit(room, channel, EVENT_ANSWER_SUGGESTION, &payload);
}

/// A question settled; exactly one such event exists per question index.
pub fn question_result(
    room: &mut Room,
    channel: &RoomChannel,
    question_index: usize,
    correct_option: usize,
    scores: Vec<ScoreLine>,
) {
    emit(
        room,
        channel,
        EVENT_QUESTION_RESULT,
        &QuestionResultEvent {
            question_index,
            correct_option,
            scores,
        },
    );
}

/// The match ended with the given final standings.
pub fn game_ended(room: &mut Room, channel: &RoomChannel, final_scores: Vec<FinalScore>) {
    emit(
        room,
        channel,
        EVENT_GAME_ENDED,
        &GameEndedEvent { final_scores },
    );
}
