//! Pure scoring math applied at question settlement.

use crate::config::ScoringConfig;

/// Outcome of scoring one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreDelta {
    /// Points earned by this submission.
    pub points: u32,
    /// The player's streak after this submission.
    pub streak: u32,
}

/// Score a single submission. A wrong answer (or no answer) earns nothing and
/// resets the streak. A correct answer earns the base points, a speed bonus
/// that decays linearly from its maximum at an instant answer down to zero at
/// the deadline, and a flat streak bonus once the streak (counting this
/// answer) reaches the configured threshold.
pub fn score_submission(
    is_correct: bool,
    response_secs: f64,
    window_secs: u64,
    current_streak: u32,
    scoring: &ScoringConfig,
) -> ScoreDelta {
    if !is_correct {
        return ScoreDelta {
            points: 0,
            streak: 0,
        };
    }

    let streak = current_streak.saturating_add(1);
    let mut points = scoring.base_points + speed_bonus(response_secs, window_secs, scoring);
    if streak >= scoring.streak_threshold {
        points += scoring.streak_bonus;
    }

    ScoreDelta { points, streak }
}

/// Linear decay of the speed bonus across the answer window. Answers at or
/// past the deadline earn zero; the fraction is clamped so clock skew in the
/// recorded response time can never produce a negative or oversized bonus.
fn speed_bonus(response_secs: f64, window_secs: u64, scoring: &ScoringConfig) -> u32 {
    if window_secs == 0 {
        return 0;
    }
    let remaining = 1.0 - (response_secs / window_secs as f64);
    let fraction = remaining.clamp(0.0, 1.0);
    (scoring.speed_bonus_max as f64 * fraction).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScoringConfig {
        ScoringConfig::default()
    }

    #[test]
    fn wrong_answer_earns_nothing_and_resets_streak() {
        let delta = score_submission(false, 1.0, 10, 5, &config());
        assert_eq!(delta, ScoreDelta { points: 0, streak: 0 });
    }

    #[test]
    fn fast_correct_answer_earns_linear_speed_bonus() {
        // 1s into a 10s window keeps 90% of the 50-point bonus.
        let delta = score_submission(true, 1.0, 10, 0, &config());
        assert_eq!(delta.points, 145);
        assert_eq!(delta.streak, 1);
    }

    #[test]
    fn instant_answer_earns_full_speed_bonus() {
        let delta = score_submission(true, 0.0, 10, 0, &config());
        assert_eq!(delta.points, 150);
    }

    #[test]
    fn deadline_answer_earns_no_speed_bonus() {
        let delta = score_submission(true, 10.0, 10, 0, &config());
        assert_eq!(delta.points, 100);
    }

    #[test]
    fn skewed_response_time_is_clamped() {
        let late = score_submission(true, 25.0, 10, 0, &config());
        assert_eq!(late.points, 100);
        let negative = score_submission(true, -3.0, 10, 0, &config());
        assert_eq!(negative.points, 150);
    }

    #[test]
    fn streak_bonus_applies_from_the_threshold_on() {
        // Third consecutive correct answer crosses the default threshold.
        let below = score_submission(true, 10.0, 10, 1, &config());
        assert_eq!(below.points, 100);
        assert_eq!(below.streak, 2);

        let at = score_submission(true, 10.0, 10, 2, &config());
        assert_eq!(at.points, 125);
        assert_eq!(at.streak, 3);

        let past = score_submission(true, 10.0, 10, 7, &config());
        assert_eq!(past.points, 125);
    }
}
