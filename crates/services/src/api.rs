use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use course_core::model::{LessonId, Module, QuizId};

use crate::error::ApiError;

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

/// Server verdict for a submitted quiz answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizVerdict {
    pub is_correct: bool,
    #[serde(default)]
    pub correct_answer: Option<usize>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// One test of an exercise run by the grading service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub test: String,
    pub passed: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default)]
    pub actual: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseReport {
    pub all_passed: bool,
    #[serde(default)]
    pub results: Vec<TestResult>,
}

impl ExerciseReport {
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|result| result.passed).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleProgress {
    pub title: String,
    #[serde(default)]
    pub progress_percentage: u8,
}

/// Aggregate progress as computed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    #[serde(default)]
    pub progress_percentage: u8,
    #[serde(default)]
    pub completed_lessons: usize,
    #[serde(default)]
    pub total_lessons: usize,
    #[serde(default)]
    pub total_time_seconds: u64,
    #[serde(default)]
    pub modules_progress: Vec<ModuleProgress>,
}

//
// ─── API SEAM ──────────────────────────────────────────────────────────────────
//

/// Authenticated request channel to the course server.
#[async_trait]
pub trait CourseApi: Send + Sync {
    /// Ordered module list with nested lessons and server completion flags.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-2xx status, or a bad body.
    async fn list_modules(&self) -> Result<Vec<Module>, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or non-2xx status.
    async fn complete_lesson(&self, lesson: LessonId) -> Result<(), ApiError>;

    /// Add `seconds` of viewing time to the lesson.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::AuthRequired` on 403, otherwise as for other calls.
    async fn track_time(&self, lesson: LessonId, seconds: u64) -> Result<(), ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-2xx status, or a bad body.
    async fn submit_quiz(&self, quiz: QuizId, selected_answer: usize)
    -> Result<QuizVerdict, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-2xx status, or a bad body.
    async fn submit_exercise(&self, lesson: LessonId, code: &str)
    -> Result<ExerciseReport, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-2xx status, or a bad body.
    async fn progress_summary(&self) -> Result<ProgressSummary, ApiError>;

    /// Opaque server-side progress blob.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-2xx status, or a bad body.
    async fn export_progress(&self) -> Result<Value, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or non-2xx status.
    async fn import_progress(&self, blob: &Value) -> Result<(), ApiError>;
}
