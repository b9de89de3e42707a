mod course_vm;
mod markdown_vm;
mod nav_history;
mod time_fmt;

pub use course_vm::{
    ExerciseVm, LessonRowVm, LessonVm, ModuleAction, ModuleCardVm, QuizVm, ShellVm,
};
pub use markdown_vm::{markdown_to_html, plain_excerpt, sanitize_html};
pub use nav_history::{NavHistory, display_fragment};
pub use time_fmt::format_duration;
