//! Shared error types for the services crate.

use thiserror::Error;

use course_core::NotFound;
use course_core::model::{LessonId, QuizId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `CourseApi` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("course api request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("course api rejected the session (403)")]
    AuthRequired,
    #[error("course api returned an unreadable body: {0}")]
    Decode(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted when answering a quiz.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz {0} was already answered")]
    AlreadyAnswered(QuizId),
    #[error("an answer for quiz {0} is already being scored")]
    Pending(QuizId),
    #[error(transparent)]
    NotFound(#[from] NotFound),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted when submitting exercise code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExerciseError {
    #[error("no lesson is open")]
    NoLesson,
    #[error("lesson {0} has no exercise")]
    NoExercise(LessonId),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by progress export and import.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackupError {
    #[error("backup file is not valid progress JSON: {0}")]
    Malformed(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted while bootstrapping or refreshing a player session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
}
