//! Domain model for a quiz-battle room and everything that lives inside it.

use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::task::AbortHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::state::machine::RoomStatus;

/// How players compete inside a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Free-for-all: every player answers and scores individually.
    Ffa,
    /// Two teams; only the captain's answer is scored, teammates suggest.
    Team,
}

/// Identifier of one of the two fixed teams in TEAM mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum TeamId {
    /// Team A.
    A,
    /// Team B.
    B,
}

impl TeamId {
    /// Both teams, in a stable order.
    pub const BOTH: [TeamId; 2] = [TeamId::A, TeamId::B];

    /// The opposing team.
    pub fn other(self) -> TeamId {
        match self {
            TeamId::A => TeamId::B,
            TeamId::B => TeamId::A,
        }
    }
}

/// Question difficulty as carried by the question bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Easy question.
    Easy,
    /// Medium question.
    Medium,
    /// Hard question.
    Hard,
}

/// A multiple-choice question. Immutable once exposed to clients; the correct
/// index never leaves the server before the question is settled.
#[derive(Debug, Clone)]
pub struct Question {
    /// Stable identifier inside the bank.
    pub id: Uuid,
    /// Prompt text shown to players.
    pub prompt: String,
    /// Ordered answer options (at least two).
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_option: usize,
    /// Difficulty tag.
    pub difficulty: Difficulty,
}

/// One participant of a room.
#[derive(Debug, Clone)]
pub struct Player {
    /// Identity provided by the host's auth layer.
    pub user_id: Uuid,
    /// Name shown to other players.
    pub display_name: String,
    /// Team assignment; `None` in FFA mode or before picking a side.
    pub team: Option<TeamId>,
    /// Whether this player is the authoritative answerer of their team.
    pub is_captain: bool,
    /// Pre-start readiness flag.
    pub is_ready: bool,
    /// Cumulative score, non-decreasing across the match.
    pub score: u32,
    /// Current run of consecutive correct answers.
    pub streak: u32,
    /// Questions answered correctly.
    pub correct_answers: u32,
    /// Questions answered incorrectly.
    pub wrong_answers: u32,
    /// Join time, used as the deterministic leaderboard tie-breaker.
    pub joined_at: SystemTime,
}

impl Player {
    /// Build a fresh player entry at the current time.
    pub fn new(user_id: Uuid, display_name: String, team: Option<TeamId>) -> Self {
        Self {
            user_id,
            display_name,
            team,
            is_captain: false,
            is_ready: false,
            score: 0,
            streak: 0,
            correct_answers: 0,
            wrong_answers: 0,
            joined_at: SystemTime::now(),
        }
    }
}

/// A player's answer for one question. Overwritten in place when the player
/// changes their mind before the window closes.
#[derive(Debug, Clone)]
pub struct AnswerSubmission {
    /// Chosen option index.
    pub option_index: usize,
    /// Seconds elapsed between question start and this submission.
    pub response_secs: f64,
}

/// An advisory answer choice from a team member. Append-only and never scored.
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// Who suggested.
    pub suggester_id: Uuid,
    /// The suggester's team.
    pub team: TeamId,
    /// Suggested option index.
    pub option_index: usize,
}

/// Live state of the question currently open for answers.
#[derive(Debug)]
pub struct QuestionRound {
    /// Index into the room's question list.
    pub index: usize,
    /// When the question was exposed to clients.
    pub started_at: Instant,
    /// Hard deadline after which submissions are rejected.
    pub deadline: Instant,
    /// Deadline as unix milliseconds, for clients.
    pub ends_at_ms: u64,
    /// Latest submission per player.
    pub answers: IndexMap<Uuid, AnswerSubmission>,
    /// Append-only suggestion log (TEAM mode).
    pub suggestions: Vec<Suggestion>,
    /// Exactly-once settlement guard; set before any score mutation.
    pub settled: bool,
    /// Handle of the deadline timer task, aborted on early settlement.
    pub timer: Option<AbortHandle>,
}

impl QuestionRound {
    /// Count of distinct suggesters currently backing each option, keyed by
    /// option index. A suggester's latest entry is the only one counted.
    pub fn suggestion_tally(&self, team: TeamId, option_count: usize) -> Vec<u32> {
        let mut latest: IndexMap<Uuid, usize> = IndexMap::new();
        for suggestion in self.suggestions.iter().filter(|s| s.team == team) {
            latest.insert(suggestion.suggester_id, suggestion.option_index);
        }
        let mut tally = vec![0u32; option_count];
        for option in latest.values() {
            if let Some(slot) = tally.get_mut(*option) {
                *slot += 1;
            }
        }
        tally
    }
}

/// Final standing of one player, reported on `game_ended` and handed to the
/// result repository.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct FinalScore {
    /// Player identity.
    pub player_id: Uuid,
    /// Display name at the end of the match.
    pub display_name: String,
    /// Cumulative score.
    pub score: u32,
    /// 1-based leaderboard rank.
    pub rank: u32,
}

/// Immutable-ish configuration chosen at room creation.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Human-readable room name.
    pub name: String,
    /// FFA or TEAM.
    pub mode: GameMode,
    /// Roster capacity.
    pub max_players: usize,
    /// Number of questions to play.
    pub question_count: usize,
    /// Answer window per question, in seconds.
    pub time_per_question_secs: u64,
}

/// Authoritative state of one room. Mutated only under the room's lock.
#[derive(Debug)]
pub struct Room {
    /// Shareable 6-character code.
    pub code: String,
    /// Creation-time configuration.
    pub config: RoomConfig,
    /// User who created the room and may start the game.
    pub creator_id: Uuid,
    /// Lifecycle status, advances monotonically.
    pub status: RoomStatus,
    /// Monotonic counter bumped by every published event.
    pub version: u64,
    /// Roster in join order.
    pub players: IndexMap<Uuid, Player>,
    /// Questions for this match, loaded at start.
    pub questions: Vec<Question>,
    /// Index of the question most recently started; `None` before start.
    pub current_index: Option<usize>,
    /// The question currently open, if any.
    pub round: Option<QuestionRound>,
    /// Creation time, used by the cleanup sweep.
    pub created_at: SystemTime,
    /// Last mutation time, used by the cleanup sweep.
    pub last_activity: SystemTime,
}

impl Room {
    /// Build a fresh room in the `Waiting` state.
    pub fn new(code: String, config: RoomConfig, creator_id: Uuid) -> Self {
        let now = SystemTime::now();
        Self {
            code,
            config,
            creator_id,
            status: RoomStatus::Waiting,
            version: 0,
            players: IndexMap::new(),
            questions: Vec::new(),
            current_index: None,
            round: None,
            created_at: now,
            last_activity: now,
        }
    }

    /// Record that the room was touched, for idle-room garbage collection.
    pub fn touch(&mut self) {
        self.last_activity = SystemTime::now();
    }

    /// Whether every player has flagged ready. False for an empty roster.
    pub fn all_ready(&self) -> bool {
        !self.players.is_empty() && self.players.values().all(|p| p.is_ready)
    }

    /// Members of one team, in join order.
    pub fn team_members(&self, team: TeamId) -> impl Iterator<Item = &Player> {
        self.players.values().filter(move |p| p.team == Some(team))
    }

    /// The captain of a team, if the team has any members.
    pub fn captain_of(&self, team: TeamId) -> Option<&Player> {
        self.team_members(team).find(|p| p.is_captain)
    }

    /// Hand captaincy to the oldest remaining member of `team`. Returns the
    /// new captain's id when one was designated.
    pub fn promote_oldest_member(&mut self, team: TeamId) -> Option<Uuid> {
        let next = self
            .team_members(team)
            .min_by_key(|p| p.joined_at)
            .map(|p| p.user_id)?;
        if let Some(player) = self.players.get_mut(&next) {
            player.is_captain = true;
        }
        Some(next)
    }

    /// True once the current round has collected every required answer:
    /// all players in FFA, every non-empty team's captain in TEAM mode.
    pub fn round_complete(&self) -> bool {
        let Some(round) = &self.round else {
            return false;
        };
        match self.config.mode {
            GameMode::Ffa => self
                .players
                .keys()
                .all(|id| round.answers.contains_key(id)),
            GameMode::Team => TeamId::BOTH.iter().all(|team| {
                match self.captain_of(*team) {
                    Some(captain) => round.answers.contains_key(&captain.user_id),
                    // A team with no members places no requirement.
                    None => self.team_members(*team).next().is_none(),
                }
            }),
        }
    }

    /// Players ordered by descending score, ties broken by earliest join.
    pub fn leaderboard(&self) -> Vec<&Player> {
        let mut ordered: Vec<&Player> = self.players.values().collect();
        ordered.sort_by(|a, b| b.score.cmp(&a.score).then(a.joined_at.cmp(&b.joined_at)));
        ordered
    }

    /// Final standings derived from the leaderboard ordering.
    pub fn final_scores(&self) -> Vec<FinalScore> {
        self.leaderboard()
            .into_iter()
            .enumerate()
            .map(|(i, p)| FinalScore {
                player_id: p.user_id,
                display_name: p.display_name.clone(),
                score: p.score,
                rank: i as u32 + 1,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn room(mode: GameMode) -> Room {
        Room::new(
            "TESTRM".into(),
            RoomConfig {
                name: "test".into(),
                mode,
                max_players: 6,
                question_count: 1,
                time_per_question_secs: 10,
            },
            Uuid::new_v4(),
        )
    }

    fn add_player(room: &mut Room, name: &str, team: Option<TeamId>) -> Uuid {
        let id = Uuid::new_v4();
        let mut player = Player::new(id, name.into(), team);
        // Deterministic join order even when inserts land on the same tick.
        player.joined_at = SystemTime::UNIX_EPOCH
            + Duration::from_secs(room.players.len() as u64);
        room.players.insert(id, player);
        id
    }

    fn open_round(room: &mut Room) {
        let now = Instant::now();
        room.round = Some(QuestionRound {
            index: 0,
            started_at: now,
            deadline: now + Duration::from_secs(10),
            ends_at_ms: 0,
            answers: IndexMap::new(),
            suggestions: Vec::new(),
            settled: false,
            timer: None,
        });
    }

    #[test]
    fn leaderboard_breaks_ties_by_earliest_join() {
        let mut room = room(GameMode::Ffa);
        let first = add_player(&mut room, "first", None);
        let second = add_player(&mut room, "second", None);
        let third = add_player(&mut room, "third", None);
        for (id, score) in [(second, 200), (third, 100), (first, 100)] {
            if let Some(p) = room.players.get_mut(&id) {
                p.score = score;
            }
        }

        let ranks: Vec<Uuid> = room.final_scores().iter().map(|s| s.player_id).collect();
        assert_eq!(ranks, vec![second, first, third]);
        assert_eq!(room.final_scores()[0].rank, 1);
    }

    #[test]
    fn suggestion_tally_counts_one_vote_per_suggester() {
        let mut room = room(GameMode::Team);
        open_round(&mut room);
        let (waverer, steady) = (Uuid::new_v4(), Uuid::new_v4());
        let round = room.round.as_mut().unwrap();
        for (suggester_id, option_index) in [(waverer, 0), (steady, 2), (waverer, 2)] {
            round.suggestions.push(Suggestion {
                suggester_id,
                team: TeamId::A,
                option_index,
            });
        }

        assert_eq!(round.suggestion_tally(TeamId::A, 4), vec![0, 0, 2, 0]);
        assert_eq!(round.suggestion_tally(TeamId::B, 4), vec![0, 0, 0, 0]);
    }

    #[test]
    fn ffa_round_completes_when_every_player_answered() {
        let mut room = room(GameMode::Ffa);
        let alice = add_player(&mut room, "alice", None);
        let bob = add_player(&mut room, "bob", None);
        open_round(&mut room);

        let answer = AnswerSubmission {
            option_index: 0,
            response_secs: 1.0,
        };
        room.round.as_mut().unwrap().answers.insert(alice, answer.clone());
        assert!(!room.round_complete());
        room.round.as_mut().unwrap().answers.insert(bob, answer);
        assert!(room.round_complete());
    }

    #[test]
    fn team_round_waits_only_for_captains_of_occupied_teams() {
        let mut room = room(GameMode::Team);
        let captain = add_player(&mut room, "captain", Some(TeamId::A));
        let member = add_player(&mut room, "member", Some(TeamId::A));
        if let Some(p) = room.players.get_mut(&captain) {
            p.is_captain = true;
        }
        open_round(&mut room);

        // Team B is empty, so only team A's captain is required.
        let answer = AnswerSubmission {
            option_index: 0,
            response_secs: 1.0,
        };
        room.round.as_mut().unwrap().answers.insert(member, answer.clone());
        assert!(!room.round_complete());
        room.round.as_mut().unwrap().answers.insert(captain, answer);
        assert!(room.round_complete());
    }

    #[test]
    fn captaincy_passes_to_the_oldest_remaining_member() {
        let mut room = room(GameMode::Team);
        add_player(&mut room, "gone", Some(TeamId::A));
        let elder = add_player(&mut room, "elder", Some(TeamId::A));
        let junior = add_player(&mut room, "junior", Some(TeamId::A));
        let _ = room.players.shift_remove_index(0);

        let promoted = room.promote_oldest_member(TeamId::A);
        assert_eq!(promoted, Some(elder));
        assert!(room.captain_of(TeamId::A).is_some());
        assert_ne!(promoted, Some(junior));
    }
}
