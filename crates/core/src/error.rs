use thiserror::Error;

use crate::model::{LessonId, ModuleId, QuizId};

/// A fragment that does not match any known route shape.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RouteError {
    #[error("unrecognized route fragment: {0:?}")]
    Malformed(String),
}

/// A reference into the loaded catalog that could not be resolved.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFound {
    #[error("module not found: {0}")]
    ModuleSlug(String),

    #[error("lesson {lesson} not found in module {module}")]
    LessonSlug { module: String, lesson: String },

    #[error("module {0} not found")]
    Module(ModuleId),

    #[error("module {0} has no lessons")]
    EmptyModule(ModuleId),

    #[error("lesson {0} not found")]
    Lesson(LessonId),

    #[error("quiz {0} not found")]
    Quiz(QuizId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error(transparent)]
    NotFound(#[from] NotFound),
}
