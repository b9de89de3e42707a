mod course;
mod ids;
mod progress;
mod view;

pub use course::{Catalog, Lesson, LessonPosition, Module, Quiz};
pub use ids::{LessonId, ModuleId, ParseIdError, QuizId};
pub use progress::{ExerciseCodes, ProgressMap, ProgressRecord, QuizResult, QuizResults};
pub use view::{NavigationState, ViewKind};

#[cfg(test)]
pub(crate) use course::fixtures;
