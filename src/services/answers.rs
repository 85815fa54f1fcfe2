//! Answer and suggestion collection, and exactly-once question settlement.
//!
//! Two triggers can settle a question: the deadline timer firing, or the last
//! required answer arriving. Both paths funnel into [`settle_round`], which
//! checks and sets the round's `settled` flag under the room lock before any
//! score is touched, so concurrent triggers resolve to a single settlement.

use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dto::{
        room::{AnswerRequest, AnswerResponse, SuggestRequest},
        sse::{AnswerSuggestionEvent, ScoreLine},
    },
    error::ServiceError,
    services::{
        game_events,
        scoring::{self, ScoreDelta},
        sequencer,
    },
    state::{
        SharedState,
        events::RoomChannel,
        machine::RoomStatus,
        room::{AnswerSubmission, FinalScore, GameMode, Player, Room, Suggestion, TeamId},
    },
};

/// What a settlement decided about the match, dispatched after the room lock
/// is released.
pub(crate) enum Settled {
    /// Schedule the next question at this index.
    Next(usize),
    /// The match is over; archive these standings.
    Finished(Vec<FinalScore>),
}

/// Record a player's authoritative answer for the current question. Accepts
/// resubmissions until the window closes; only the last one counts. Settles
/// the round inline when this was the last required answer.
pub async fn submit_answer(
    state: &SharedState,
    code: &str,
    payload: AnswerRequest,
) -> Result<AnswerResponse, ServiceError> {
    let handle = state.room(code)?;
    let (response, settled) = {
        let mut room = handle.room.lock().await;
        if room.status != RoomStatus::Playing {
            return Err(ServiceError::AnswerWindowClosed(
                "no question is open".into(),
            ));
        }

        let player = room
            .players
            .get(&payload.player_id)
            .ok_or_else(|| ServiceError::NotAuthorized("player is not in this room".into()))?;
        if room.config.mode == GameMode::Team && !player.is_captain {
            return Err(ServiceError::NotAuthorized(
                "only the team captain may answer".into(),
            ));
        }
        let streak = player.streak;

        let round = room
            .round
            .as_ref()
            .ok_or_else(|| ServiceError::AnswerWindowClosed("no question is open".into()))?;
        if round.settled || payload.question_index != round.index {
            return Err(ServiceError::AnswerWindowClosed(format!(
                "question {} is not accepting answers",
                payload.question_index
            )));
        }
        if Instant::now() > round.deadline {
            return Err(ServiceError::AnswerWindowClosed(
                "the deadline has passed".into(),
            ));
        }
        let index = round.index;
        let response_secs = round.started_at.elapsed().as_secs_f64();

        let question = room
            .questions
            .get(index)
            .ok_or_else(|| ServiceError::Internal(format!("question {index} out of bounds")))?;
        if payload.option_index >= question.options.len() {
            return Err(ServiceError::InvalidConfig(
                "option index out of range".into(),
            ));
        }
        let correct_option = question.correct_option;

        if let Some(round) = room.round.as_mut() {
            round.answers.insert(
                payload.player_id,
                AnswerSubmission {
                    option_index: payload.option_index,
                    response_secs,
                },
            );
        }
        game_events::player_answered(&mut room, &handle.channel, payload.player_id);

        // Provisional points only; the authoritative delta is computed once,
        // at settlement, from the final submission.
        let is_correct = payload.option_index == correct_option;
        let window = room.config.time_per_question_secs;
        let provisional =
            scoring::score_submission(is_correct, response_secs, window, streak, &state.config().scoring);

        let settled = if room.round_complete() {
            settle_round(&mut room, &handle.channel, state.config())
        } else {
            None
        };

        (
            AnswerResponse {
                is_correct,
                points_awarded: provisional.points,
            },
            settled,
        )
    };

    if let Some(settled) = settled {
        dispatch_settlement(state, code, settled).await;
    }
    Ok(response)
}

/// Append an advisory suggestion to the current round and broadcast the
/// refreshed tallies. TEAM mode only; never affects scoring.
pub async fn submit_suggestion(
    state: &SharedState,
    code: &str,
    payload: SuggestRequest,
) -> Result<(), ServiceError> {
    let handle = state.room(code)?;
    let mut room = handle.room.lock().await;

    if room.config.mode != GameMode::Team {
        return Err(ServiceError::InvalidConfig(
            "suggestions are only available in team mode".into(),
        ));
    }
    if room.status != RoomStatus::Playing {
        return Err(ServiceError::AnswerWindowClosed(
            "no question is open".into(),
        ));
    }

    let player = room
        .players
        .get(&payload.player_id)
        .ok_or_else(|| ServiceError::NotAuthorized("player is not in this room".into()))?;
    let team = player
        .team
        .ok_or_else(|| ServiceError::NotAuthorized("join a team before suggesting".into()))?;
    let suggester_name = player.display_name.clone();

    let round = room
        .round
        .as_ref()
        .ok_or_else(|| ServiceError::AnswerWindowClosed("no question is open".into()))?;
    if round.settled || Instant::now() > round.deadline {
        return Err(ServiceError::AnswerWindowClosed(
            "the deadline has passed".into(),
        ));
    }
    let index = round.index;
    let option_count = room
        .questions
        .get(index)
        .map(|question| question.options.len())
        .unwrap_or(0);
    if payload.option_index >= option_count {
        return Err(ServiceError::InvalidConfig(
            "option index out of range".into(),
        ));
    }

    let tallies = match room.round.as_mut() {
        Some(round) => {
            round.suggestions.push(Suggestion {
                suggester_id: payload.player_id,
                team,
                option_index: payload.option_index,
            });
            round.suggestion_tally(team, option_count)
        }
        None => return Err(ServiceError::AnswerWindowClosed("no question is open".into())),
    };

    game_events::answer_suggestion(
        &mut room,
        &handle.channel,
        AnswerSuggestionEvent {
            team,
            suggester_id: payload.player_id,
            suggester_name,
            option_index: payload.option_index,
            tallies,
        },
    );
    Ok(())
}

/// Deadline-timer entry point. Verifies the round it was armed for is still
/// the open one before settling; a stale timer is a no-op.
pub(crate) async fn settle_by_deadline(state: SharedState, code: String, index: usize) {
    let Ok(handle) = state.room(&code) else {
        return;
    };
    let settled = {
        let mut room = handle.room.lock().await;
        let current = room
            .round
            .as_ref()
            .map(|round| round.index == index && !round.settled)
            .unwrap_or(false);
        if current {
            // The stored timer handle is this very task; discard it instead
            // of letting settlement abort the task that is running it.
            if let Some(round) = room.round.as_mut() {
                round.timer.take();
            }
            settle_round(&mut room, &handle.channel, state.config())
        } else {
            None
        }
    };
    if let Some(settled) = settled {
        dispatch_settlement(&state, &code, settled).await;
    }
}

/// Settle the open round exactly once: score every unit, emit
/// `question_result`, and decide whether the match continues. Returns `None`
/// when there is no open round or it has already been settled. Must run while
/// the room lock is held.
pub(crate) fn settle_round(
    room: &mut Room,
    channel: &RoomChannel,
    config: &AppConfig,
) -> Option<Settled> {
    let (index, submissions) = {
        let round = room.round.as_mut()?;
        if round.settled {
            return None;
        }
        round.settled = true;
        if let Some(timer) = round.timer.take() {
            timer.abort();
        }
        (round.index, round.answers.clone())
    };

    let Some(question) = room.questions.get(index) else {
        // The question list broke its contract; end the match instead of
        // leaving the room stuck mid-question.
        warn!(room = %room.code, index, "settling a question with no backing entry");
        sequencer::force_finish(room, channel);
        return Some(Settled::Finished(room.final_scores()));
    };
    let correct_option = question.correct_option;
    let window = room.config.time_per_question_secs;
    let scoring = config.scoring;

    let mut lines: Vec<ScoreLine> = Vec::new();
    match room.config.mode {
        GameMode::Ffa => {
            let ids: Vec<Uuid> = room.players.keys().copied().collect();
            for id in ids {
                let Some(player) = room.players.get_mut(&id) else {
                    continue;
                };
                match submissions.get(&id) {
                    Some(submission) => {
                        let is_correct = submission.option_index == correct_option;
                        let delta = scoring::score_submission(
                            is_correct,
                            submission.response_secs,
                            window,
                            player.streak,
                            &scoring,
                        );
                        apply_delta(player, is_correct, delta);
                        lines.push(score_line(player, delta));
                    }
                    // No submission: no points, streak broken.
                    None => player.streak = 0,
                }
            }
        }
        GameMode::Team => {
            for team in TeamId::BOTH {
                let captain_submission = room
                    .captain_of(team)
                    .and_then(|captain| submissions.get(&captain.user_id))
                    .cloned();
                let member_ids: Vec<Uuid> = room.team_members(team).map(|p| p.user_id).collect();
                match captain_submission {
                    // The captain's answer is applied identically to every
                    // member, so teammates' scores stay equal by construction.
                    Some(submission) => {
                        let is_correct = submission.option_index == correct_option;
                        for id in member_ids {
                            let Some(player) = room.players.get_mut(&id) else {
                                continue;
                            };
                            let delta = scoring::score_submission(
                                is_correct,
                                submission.response_secs,
                                window,
                                player.streak,
                                &scoring,
                            );
                            apply_delta(player, is_correct, delta);
                            lines.push(score_line(player, delta));
                        }
                    }
                    None => {
                        for id in member_ids {
                            if let Some(player) = room.players.get_mut(&id) {
                                player.streak = 0;
                            }
                        }
                    }
                }
            }
        }
    }

    game_events::question_result(room, channel, index, correct_option, lines);

    let next = index + 1;
    if next < room.questions.len() && !room.players.is_empty() {
        Some(Settled::Next(next))
    } else {
        room.status = room
            .status
            .advance(RoomStatus::Finished)
            .unwrap_or(RoomStatus::Finished);
        let final_scores = room.final_scores();
        game_events::game_ended(room, channel, final_scores.clone());
        Some(Settled::Finished(final_scores))
    }
}

/// Act on a settlement outcome once the room lock has been released, so no
/// lock is held across the repository call.
pub(crate) async fn dispatch_settlement(state: &SharedState, code: &str, settled: Settled) {
    match settled {
        Settled::Next(index) => sequencer::schedule_next(state, code, index),
        Settled::Finished(scores) => {
            info!(room = %code, "match finished");
            if let Err(err) = state.repository().persist_result(code, &scores).await {
                warn!(room = %code, error = %err, "failed to archive final scores");
            }
        }
    }
}

fn apply_delta(player: &mut Player, is_correct: bool, delta: ScoreDelta) {
    player.score += delta.points;
    player.streak = delta.streak;
    if is_correct {
        player.correct_answers += 1;
    } else {
        player.wrong_answers += 1;
    }
}

fn score_line(player: &Player, delta: ScoreDelta) -> ScoreLine {
    ScoreLine {
        player_id: player.user_id,
        delta: delta.points,
        total: player.score,
        streak: player.streak,
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use tokio::{sync::broadcast::error::TryRecvError, time::sleep};

    use super::*;
    use crate::{
        dao::memory::BuiltinBank,
        dto::room::{CreateRoomRequest, JoinRoomRequest, SwitchTeamRequest},
        services::room_service,
        state::{
            AppState,
            room::{Difficulty, Question},
        },
    };

    fn bank_question(correct: usize) -> Question {
        Question {
            id: Uuid::new_v4(),
            prompt: "prompt".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_option: correct,
            difficulty: Difficulty::Easy,
        }
    }

    fn test_state() -> SharedState {
        let mut config = AppConfig::default();
        // No pacing gap so tests can observe the next question immediately.
        config.timing.next_question_delay = Duration::ZERO;
        let bank = BuiltinBank::with_questions(vec![
            bank_question(1),
            bank_question(1),
            bank_question(1),
        ]);
        AppState::new(config, Arc::new(bank))
    }

    async fn playing_room(state: &SharedState, mode: GameMode, players: &[Uuid]) -> String {
        let creator = players[0];
        let code = room_service::create_room(
            state,
            CreateRoomRequest {
                name: "battle".into(),
                game_mode: mode,
                max_players: 6,
                question_count: 3,
                time_per_question_seconds: 10,
                creator_id: creator,
                creator_name: "p0".into(),
            },
        )
        .unwrap()
        .code;

        for (i, id) in players.iter().enumerate().skip(1) {
            room_service::join_room(
                state,
                &code,
                JoinRoomRequest {
                    player_id: *id,
                    display_name: format!("p{i}"),
                },
            )
            .await
            .unwrap();
        }
        if mode == GameMode::Team {
            // First half onto team A, rest onto team B, in join order so the
            // first occupant of each side is its captain.
            for (i, id) in players.iter().enumerate() {
                let team = if i < players.len().div_ceil(2) {
                    TeamId::A
                } else {
                    TeamId::B
                };
                room_service::switch_team(
                    state,
                    &code,
                    SwitchTeamRequest {
                        player_id: *id,
                        team,
                    },
                )
                .await
                .unwrap();
            }
        }
        for id in players {
            room_service::toggle_ready(state, &code, *id).await.unwrap();
        }
        room_service::start_game(state, &code, creator).await.unwrap();
        code
    }

    async fn score_of(state: &SharedState, code: &str, player_id: Uuid) -> (u32, u32) {
        let handle = state.room(code).unwrap();
        let room = handle.room.lock().await;
        let player = room.players.get(&player_id).unwrap();
        (player.score, player.streak)
    }

    fn drain_events(
        receiver: &mut tokio::sync::broadcast::Receiver<crate::dto::sse::ServerEvent>,
    ) -> Vec<crate::dto::sse::ServerEvent> {
        let mut drained = Vec::new();
        loop {
            match receiver.try_recv() {
                Ok(event) => drained.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(_)) => continue,
            }
        }
        drained
    }

    fn count_events(events: &[crate::dto::sse::ServerEvent], tag: &str) -> usize {
        events
            .iter()
            .filter(|event| event.event.as_deref() == Some(tag))
            .count()
    }

    #[tokio::test]
    async fn ffa_scores_speed_bonus_and_resets_streak_on_miss() {
        // Scenario: one fast correct answer, one wrong one, in a 10s window.
        let state = test_state();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let code = playing_room(&state, GameMode::Ffa, &[alice, bob]).await;

        let correct = submit_answer(
            &state,
            &code,
            AnswerRequest {
                player_id: alice,
                question_index: 0,
                option_index: 1,
            },
        )
        .await
        .unwrap();
        assert!(correct.is_correct);
        // Near-instant answer keeps almost the whole 50-point speed bonus.
        assert!(correct.points_awarded > 140 && correct.points_awarded <= 150);

        let wrong = submit_answer(
            &state,
            &code,
            AnswerRequest {
                player_id: bob,
                question_index: 0,
                option_index: 0,
            },
        )
        .await
        .unwrap();
        assert!(!wrong.is_correct);
        assert_eq!(wrong.points_awarded, 0);

        // Both answered, so the round settled inline.
        let (alice_score, alice_streak) = score_of(&state, &code, alice).await;
        assert!(alice_score > 140);
        assert_eq!(alice_streak, 1);
        let (bob_score, bob_streak) = score_of(&state, &code, bob).await;
        assert_eq!(bob_score, 0);
        assert_eq!(bob_streak, 0);
    }

    #[tokio::test]
    async fn resubmission_overwrites_until_the_window_closes() {
        let state = test_state();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let code = playing_room(&state, GameMode::Ffa, &[alice, bob]).await;

        for option_index in [0, 1] {
            submit_answer(
                &state,
                &code,
                AnswerRequest {
                    player_id: alice,
                    question_index: 0,
                    option_index,
                },
            )
            .await
            .unwrap();
        }
        submit_answer(
            &state,
            &code,
            AnswerRequest {
                player_id: bob,
                question_index: 0,
                option_index: 1,
            },
        )
        .await
        .unwrap();

        // Only Alice's final (correct) submission counted.
        let (alice_score, alice_streak) = score_of(&state, &code, alice).await;
        assert!(alice_score > 0);
        assert_eq!(alice_streak, 1);
    }

    #[tokio::test]
    async fn wrong_index_submission_is_rejected_as_window_closed() {
        let state = test_state();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let code = playing_room(&state, GameMode::Ffa, &[alice, bob]).await;

        let err = submit_answer(
            &state,
            &code,
            AnswerRequest {
                player_id: alice,
                question_index: 2,
                option_index: 1,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::AnswerWindowClosed(_)));
    }

    #[tokio::test]
    async fn team_delta_applies_identically_to_every_member() {
        // Scenario: three members suggest {0, 1, 1}; the captain submits 1.
        let state = test_state();
        let players: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let code = playing_room(&state, GameMode::Team, &players).await;
        let (captain_a, member_a, captain_b) = (players[0], players[1], players[2]);

        for (suggester, option_index) in [(member_a, 0), (member_a, 1), (captain_a, 1)] {
            submit_suggestion(
                &state,
                &code,
                SuggestRequest {
                    player_id: suggester,
                    option_index,
                },
            )
            .await
            .unwrap();
        }

        for captain in [captain_a, captain_b] {
            submit_answer(
                &state,
                &code,
                AnswerRequest {
                    player_id: captain,
                    question_index: 0,
                    option_index: 1,
                },
            )
            .await
            .unwrap();
        }

        let (captain_score, _) = score_of(&state, &code, captain_a).await;
        let (member_score, _) = score_of(&state, &code, member_a).await;
        assert!(captain_score > 0);
        assert_eq!(captain_score, member_score);
    }

    #[tokio::test]
    async fn non_captains_cannot_answer_in_team_mode() {
        let state = test_state();
        let players: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let code = playing_room(&state, GameMode::Team, &players).await;
        let member = players[1];

        let err = submit_answer(
            &state,
            &code,
            AnswerRequest {
                player_id: member,
                question_index: 0,
                option_index: 1,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotAuthorized(_)));
    }

    #[tokio::test]
    async fn suggestion_tallies_move_a_changed_vote() {
        let state = test_state();
        let players: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let code = playing_room(&state, GameMode::Team, &players).await;
        let member = players[1];

        let handle = state.room(&code).unwrap();
        let mut events = handle.channel.subscribe();

        for option_index in [0, 1] {
            submit_suggestion(
                &state,
                &code,
                SuggestRequest {
                    player_id: member,
                    option_index,
                },
            )
            .await
            .unwrap();
        }

        let mut last_tallies = None;
        while let Ok(event) = events.try_recv() {
            if event.event.as_deref() == Some("answer_suggestion") {
                let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
                last_tallies = Some(payload["tallies"].clone());
            }
        }
        // The single vote moved from option 0 to option 1.
        assert_eq!(last_tallies.unwrap(), serde_json::json!([0, 1, 0, 0]));
    }

    #[tokio::test]
    async fn suggestions_are_rejected_outside_team_mode() {
        let state = test_state();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let code = playing_room(&state, GameMode::Ffa, &[alice, bob]).await;

        let err = submit_suggestion(
            &state,
            &code,
            SuggestRequest {
                player_id: alice,
                option_index: 0,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn deadline_settlement_is_exactly_once_and_advances() {
        // Scenario: nobody answers; the deadline path settles the question
        // once, even when triggered twice, and the match moves on.
        let state = test_state();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let code = playing_room(&state, GameMode::Ffa, &[alice, bob]).await;

        let handle = state.room(&code).unwrap();
        let mut events = handle.channel.subscribe();

        settle_by_deadline(state.clone(), code.clone(), 0).await;
        settle_by_deadline(state.clone(), code.clone(), 0).await;

        // Zero inter-question delay; yield so the advance task runs.
        sleep(Duration::from_millis(50)).await;

        let received = drain_events(&mut events);
        assert_eq!(count_events(&received, "question_result"), 1);
        assert_eq!(count_events(&received, "question_start"), 1);

        let view = room_service::snapshot(&state, &code).await.unwrap();
        assert_eq!(view.current_question_index, Some(1));

        let (alice_score, _) = score_of(&state, &code, alice).await;
        assert_eq!(alice_score, 0);
    }

    #[tokio::test]
    async fn finishing_the_last_question_archives_the_standings() {
        let state = test_state();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let code = playing_room(&state, GameMode::Ffa, &[alice, bob]).await;

        let handle = state.room(&code).unwrap();
        let mut events = handle.channel.subscribe();

        for index in 0..3 {
            // Questions past the first open asynchronously after settlement.
            for _ in 0..100 {
                let view = room_service::snapshot(&state, &code).await.unwrap();
                if view.current_question_index == Some(index)
                    && view.current_question.is_some()
                {
                    break;
                }
                sleep(Duration::from_millis(10)).await;
            }
            for player in [alice, bob] {
                submit_answer(
                    &state,
                    &code,
                    AnswerRequest {
                        player_id: player,
                        question_index: index,
                        option_index: 1,
                    },
                )
                .await
                .unwrap();
            }
        }
        sleep(Duration::from_millis(50)).await;

        let view = room_service::snapshot(&state, &code).await.unwrap();
        assert_eq!(view.room.status, RoomStatus::Finished);
        assert_eq!(count_events(&drain_events(&mut events), "game_ended"), 1);

        // Third consecutive correct answer crossed the streak threshold.
        let (_, streak) = score_of(&state, &code, alice).await;
        assert_eq!(streak, 3);
    }
}
