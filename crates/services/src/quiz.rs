use std::collections::BTreeSet;

use course_core::NotFound;
use course_core::model::{Catalog, QuizId, QuizResult, QuizResults};

use crate::api::QuizVerdict;
use crate::error::QuizError;

/// Write-once quiz answers plus the set of answers currently being scored.
#[derive(Debug, Clone, Default)]
pub struct QuizAnswers {
    results: QuizResults,
    pending: BTreeSet<QuizId>,
}

impl QuizAnswers {
    #[must_use]
    pub fn new(results: QuizResults) -> Self {
        Self {
            results,
            pending: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn results(&self) -> &QuizResults {
        &self.results
    }

    /// Stored result, replayed for display on reload.
    #[must_use]
    pub fn result(&self, quiz: QuizId) -> Option<&QuizResult> {
        self.results.get(quiz)
    }

    #[must_use]
    pub fn is_pending(&self, quiz: QuizId) -> bool {
        self.pending.contains(&quiz)
    }

    /// Reserve `quiz` for scoring.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the quiz is unknown, already answered, or
    /// already being scored.
    pub fn begin(&mut self, quiz: QuizId, catalog: &Catalog) -> Result<(), QuizError> {
        if catalog.find_quiz(quiz).is_none() {
            return Err(NotFound::Quiz(quiz).into());
        }
        if self.results.is_answered(quiz) {
            return Err(QuizError::AlreadyAnswered(quiz));
        }
        if !self.pending.insert(quiz) {
            return Err(QuizError::Pending(quiz));
        }
        Ok(())
    }

    /// Store the server verdict. Returns `None` if a result already exists.
    pub fn finish(
        &mut self,
        quiz: QuizId,
        selected_answer: usize,
        verdict: &QuizVerdict,
    ) -> Option<QuizResult> {
        self.pending.remove(&quiz);
        let result = QuizResult {
            selected_answer,
            is_correct: verdict.is_correct,
        };
        self.results.insert_once(quiz, result).then_some(result)
    }

    /// Release a reservation after a failed request; nothing is stored.
    pub fn abort(&mut self, quiz: QuizId) {
        self.pending.remove(&quiz);
    }
}
