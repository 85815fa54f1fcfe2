//! Per-room question clock: opening questions, arming deadline timers, and
//! pacing the gap between a settled question and the next one.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{error, info};

use crate::{
    dto::room::CurrentQuestionView,
    error::ServiceError,
    services::{answers, game_events},
    state::{
        SharedState,
        events::RoomChannel,
        machine::RoomStatus,
        room::{QuestionRound, Room},
    },
};

/// Open question `index` for answers: install a fresh round, arm the deadline
/// timer, and emit `question_start`. Must run while the room lock is held.
pub(crate) fn open_question(
    state: &SharedState,
    room: &mut Room,
    channel: &RoomChannel,
    index: usize,
) -> Result<(), ServiceError> {
    let question = room
        .questions
        .get(index)
        .ok_or_else(|| ServiceError::Internal(format!("question {index} out of bounds")))?;

    let window_secs = room.config.time_per_question_secs;
    let now = Instant::now();
    let deadline = now + Duration::from_secs(window_secs);

    let mut round = QuestionRound {
        index,
        started_at: now,
        deadline,
        ends_at_ms: unix_millis_in(window_secs),
        answers: IndexMap::new(),
        suggestions: Vec::new(),
        settled: false,
        timer: None,
    };
    let view = CurrentQuestionView::from_round(&round, question, window_secs);

    // Deadline path of the exactly-once settlement pair. The handle is kept
    // on the round so early settlement can disarm it.
    let timer_state = state.clone();
    let timer_code = room.code.clone();
    let timer = tokio::spawn(async move {
        sleep_until(deadline).await;
        answers::settle_by_deadline(timer_state, timer_code, index).await;
    });
    round.timer = Some(timer.abort_handle());

    room.current_index = Some(index);
    room.round = Some(round);
    game_events::question_start(room, channel, view);
    info!(room = %room.code, index, "question opened");
    Ok(())
}

/// After a question settles, wait out the inter-question delay and open the
/// next one. The room may finish or empty out in the meantime, so the spawned
/// task re-validates before advancing.
pub(crate) fn schedule_next(state: &SharedState, code: &str, next_index: usize) {
    let state = state.clone();
    let code = code.to_string();
    let delay = state.config().timing.next_question_delay;

    tokio::spawn(async move {
        sleep(delay).await;

        let Ok(handle) = state.room(&code) else {
            return;
        };
        let mut room = handle.room.lock().await;
        if room.status != RoomStatus::Playing {
            return;
        }
        let due = room
            .round
            .as_ref()
            .map(|round| round.settled && round.index + 1 == next_index)
            .unwrap_or(false);
        if !due {
            return;
        }
        if let Err(err) = open_question(&state, &mut room, &handle.channel, next_index) {
            error!(room = %code, index = next_index, error = %err, "failed to open next question");
            force_finish(&mut room, &handle.channel);
        }
    });
}

/// Wall-clock deadline for clients, `secs` seconds from now.
fn unix_millis_in(secs: u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0);
    now + secs * 1000
}

/// Force a live room to `Finished` after an unrecoverable failure, emitting
/// `game_ended` with whatever standings exist so clients are not left hanging.
pub(crate) fn force_finish(room: &mut Room, channel: &RoomChannel) {
    if let Some(round) = room.round.as_mut() {
        round.settled = true;
        if let Some(timer) = round.timer.take() {
            timer.abort();
        }
    }
    room.status = room
        .status
        .advance(RoomStatus::Finished)
        .unwrap_or(RoomStatus::Finished);
    let final_scores = room.final_scores();
    game_events::game_ended(room, channel, final_scores);
}
