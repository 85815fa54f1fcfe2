//! In-memory repository backed by a baked-in question set. Serves shuffled
//! questions and retains finished-match results for later inspection.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use rand::seq::SliceRandom;
use uuid::Uuid;

use crate::{
    dao::{QuestionRepository, QuestionRequest, RepositoryError, RepositoryResult},
    state::room::{Difficulty, FinalScore, Question},
};

/// Built-in bank plus an in-memory results archive.
pub struct BuiltinBank {
    questions: Arc<Vec<Question>>,
    results: Arc<DashMap<String, Vec<FinalScore>>>,
}

impl BuiltinBank {
    /// Bank preloaded with the default question set.
    pub fn new() -> Self {
        Self::with_questions(default_questions())
    }

    /// Bank serving a caller-provided question set (used by tests).
    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            questions: Arc::new(questions),
            results: Arc::new(DashMap::new()),
        }
    }

    /// Archived standings for a room, if any were persisted.
    pub fn result_for(&self, room_code: &str) -> Option<Vec<FinalScore>> {
        self.results.get(room_code).map(|entry| entry.clone())
    }
}

impl Default for BuiltinBank {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionRepository for BuiltinBank {
    fn load_questions(
        &self,
        request: QuestionRequest,
    ) -> BoxFuture<'static, RepositoryResult<Vec<Question>>> {
        let bank = self.questions.clone();
        Box::pin(async move {
            if bank.is_empty() {
                return Err(RepositoryError::unavailable("question bank is empty"));
            }
            let mut shuffled: Vec<Question> = bank.as_ref().clone();
            shuffled.shuffle(&mut rand::rng());
            // Cycle when the match asks for more questions than the bank holds.
            let selected = shuffled
                .into_iter()
                .cycle()
                .take(request.count)
                .collect();
            Ok(selected)
        })
    }

    fn persist_result(
        &self,
        room_code: &str,
        scores: &[FinalScore],
    ) -> BoxFuture<'static, RepositoryResult<()>> {
        let results = self.results.clone();
        let code = room_code.to_string();
        let scores = scores.to_vec();
        Box::pin(async move {
            results.insert(code, scores);
            Ok(())
        })
    }
}

fn question(prompt: &str, options: [&str; 4], correct: usize, difficulty: Difficulty) -> Question {
    Question {
        id: Uuid::new_v4(),
        prompt: prompt.to_string(),
        options: options.iter().map(|s| s.to_string()).collect(),
        correct_option: correct,
        difficulty,
    }
}

/// Default question set used when no external bank is wired in.
fn default_questions() -> Vec<Question> {
    vec![
        question(
            "What is the past tense of 'go'?",
            ["goed", "went", "gone", "going"],
            1,
            Difficulty::Easy,
        ),
        question(
            "Choose the correct form: She ___ to school.",
            ["go", "goes", "going", "gone"],
            1,
            Difficulty::Easy,
        ),
        question(
            "The opposite of 'happy' is?",
            ["glad", "sad", "excited", "joyful"],
            1,
            Difficulty::Easy,
        ),
        question(
            "Which word is a noun?",
            ["run", "beautiful", "river", "quickly"],
            2,
            Difficulty::Easy,
        ),
        question(
            "What does 'magnificent' mean?",
            ["tiny", "wonderful", "bad", "slow"],
            1,
            Difficulty::Medium,
        ),
        question(
            "Pick the correct plural of 'child'.",
            ["childs", "childes", "children", "childrens"],
            2,
            Difficulty::Easy,
        ),
        question(
            "Which sentence is in the passive voice?",
            [
                "The cat chased the mouse.",
                "The mouse was chased by the cat.",
                "The cat is chasing the mouse.",
                "The cat will chase the mouse.",
            ],
            1,
            Difficulty::Medium,
        ),
        question(
            "A synonym for 'rapid' is?",
            ["slow", "swift", "late", "steady"],
            1,
            Difficulty::Easy,
        ),
        question(
            "Which word is an adverb?",
            ["quick", "quickly", "quickness", "quicken"],
            1,
            Difficulty::Medium,
        ),
        question(
            "Choose the correctly spelled word.",
            ["recieve", "receive", "receeve", "receve"],
            1,
            Difficulty::Medium,
        ),
        question(
            "What is the comparative form of 'good'?",
            ["gooder", "better", "best", "well"],
            1,
            Difficulty::Easy,
        ),
        question(
            "Identify the preposition: 'The book is on the table.'",
            ["book", "is", "on", "table"],
            2,
            Difficulty::Hard,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_exact_count_even_past_bank_size() {
        let bank = BuiltinBank::new();
        let questions = bank
            .load_questions(QuestionRequest { count: 30 })
            .await
            .unwrap();
        assert_eq!(questions.len(), 30);
        assert!(questions.iter().all(|q| q.options.len() >= 2));
    }

    #[tokio::test]
    async fn empty_bank_is_an_error() {
        let bank = BuiltinBank::with_questions(Vec::new());
        let err = bank
            .load_questions(QuestionRequest { count: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn persists_and_returns_results() {
        let bank = BuiltinBank::new();
        let scores = vec![FinalScore {
            player_id: Uuid::new_v4(),
            display_name: "winner".into(),
            score: 145,
            rank: 1,
        }];
        bank.persist_result("ABC234", &scores).await.unwrap();
        let stored = bank.result_for("ABC234").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].score, 145);
    }
}
