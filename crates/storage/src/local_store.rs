//! Typed access to the persisted player state.
//!
//! Reads never fail: a missing, unreadable, or malformed entry degrades to an
//! empty value and a logged warning, so startup cannot be blocked by a bad
//! cache. Writes report `StorageError` and callers decide whether to care.

use std::sync::Arc;

use course_core::model::{ExerciseCodes, ProgressMap, QuizResults};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::repository::{KeyValueStore, StorageError};

pub const PROGRESS_KEY: &str = "progress";
pub const QUIZ_RESULTS_KEY: &str = "quizResults";
pub const EXERCISE_CODES_KEY: &str = "exerciseCodes";
pub const DARK_MODE_KEY: &str = "darkMode";

/// Everything the player restores at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalSnapshot {
    pub progress: ProgressMap,
    pub quiz_results: QuizResults,
    pub exercise_codes: ExerciseCodes,
    pub dark_mode: bool,
}

#[derive(Clone)]
pub struct LocalStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LocalStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub async fn load_snapshot(&self) -> LocalSnapshot {
        LocalSnapshot {
            progress: self.load_progress().await,
            quiz_results: self.load_quiz_results().await,
            exercise_codes: self.load_exercise_codes().await,
            dark_mode: self.load_dark_mode().await,
        }
    }

    pub async fn load_progress(&self) -> ProgressMap {
        self.read_json(PROGRESS_KEY)
            .await
            .map(ProgressMap::from_json_lenient)
            .unwrap_or_default()
    }

    pub async fn load_quiz_results(&self) -> QuizResults {
        self.read_json(QUIZ_RESULTS_KEY)
            .await
            .map(QuizResults::from_json_lenient)
            .unwrap_or_default()
    }

    pub async fn load_exercise_codes(&self) -> ExerciseCodes {
        self.read_json(EXERCISE_CODES_KEY)
            .await
            .map(ExerciseCodes::from_json_lenient)
            .unwrap_or_default()
    }

    /// Accepts a JSON boolean or the strings `"true"`/`"false"`.
    pub async fn load_dark_mode(&self) -> bool {
        match self.read_json(DARK_MODE_KEY).await {
            Some(Value::Bool(flag)) => flag,
            Some(Value::String(text)) => text == "true",
            Some(other) => {
                warn!(key = DARK_MODE_KEY, value = %other, "unexpected theme flag, using light");
                false
            }
            None => false,
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be written.
    pub async fn save_progress(&self, progress: &ProgressMap) -> Result<(), StorageError> {
        self.write_json(PROGRESS_KEY, progress).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be written.
    pub async fn save_quiz_results(&self, results: &QuizResults) -> Result<(), StorageError> {
        self.write_json(QUIZ_RESULTS_KEY, results).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be written.
    pub async fn save_exercise_codes(&self, codes: &ExerciseCodes) -> Result<(), StorageError> {
        self.write_json(EXERCISE_CODES_KEY, codes).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be written.
    pub async fn save_dark_mode(&self, enabled: bool) -> Result<(), StorageError> {
        self.write_json(DARK_MODE_KEY, &enabled).await
    }

    async fn read_json(&self, key: &str) -> Option<Value> {
        let raw = match self.kv.get(key).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(key, error = %err, "local store read failed, using empty");
                return None;
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "malformed local store entry, using empty");
                None
            }
        }
    }

    async fn write_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let text = serde_json::to_string(value)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.kv.set(key, &text).await
    }
}
