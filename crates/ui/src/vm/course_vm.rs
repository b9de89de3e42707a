use course_core::model::{Lesson, LessonId, Module, ModuleId, QuizId, ViewKind};
use course_core::navigator::Direction;
use course_core::reconcile::Reconciler;
use services::exercise::solution;
use services::CoursePlayer;

use super::markdown_vm::{markdown_to_html, plain_excerpt};
use super::time_fmt::format_duration;

const DESCRIPTION_EXCERPT_CHARS: usize = 160;

/// What the primary button on a module card does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleAction {
    Start,
    Continue,
    Review,
}

impl ModuleAction {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Continue => "Continue",
            Self::Review => "Review",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LessonRowVm {
    pub id: LessonId,
    pub title: String,
    pub completed: bool,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleCardVm {
    pub id: ModuleId,
    pub title: String,
    pub description: String,
    pub estimated_minutes: u32,
    pub percent: u8,
    pub completed: usize,
    pub total: usize,
    pub action: ModuleAction,
    pub lessons: Vec<LessonRowVm>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizVm {
    pub id: QuizId,
    pub number: usize,
    pub question: String,
    pub options: Vec<String>,
    pub selected: Option<usize>,
    pub is_correct: Option<bool>,
    pub pending: bool,
}

impl QuizVm {
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.selected.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExerciseVm {
    pub code: String,
    pub solution: Option<String>,
    pub completed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LessonVm {
    pub id: LessonId,
    pub module_id: ModuleId,
    pub module_title: String,
    pub title: String,
    pub content_html: String,
    pub position: usize,
    pub lesson_count: usize,
    pub completed: bool,
    pub time_spent: String,
    pub quizzes: Vec<QuizVm>,
    pub exercise: Option<ExerciseVm>,
    pub can_prev: bool,
    pub can_next: bool,
}

/// Everything the shell renders, rebuilt from the player after each dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShellVm {
    pub view: ViewKind,
    pub fragment: String,
    pub title: String,
    pub site_title: String,
    pub dark_mode: bool,
    pub catalog_loaded: bool,
    pub overall_percent: u8,
    pub completed_lessons: usize,
    pub total_lessons: usize,
    pub modules: Vec<ModuleCardVm>,
    pub module: Option<ModuleId>,
    pub lesson: Option<LessonVm>,
    pub tracking: bool,
}

impl Default for ShellVm {
    fn default() -> Self {
        Self {
            view: ViewKind::Home,
            fragment: String::new(),
            title: String::new(),
            site_title: String::new(),
            dark_mode: false,
            catalog_loaded: false,
            overall_percent: 0,
            completed_lessons: 0,
            total_lessons: 0,
            modules: Vec::new(),
            module: None,
            lesson: None,
            tracking: false,
        }
    }
}

impl ShellVm {
    #[must_use]
    pub fn from_player(player: &CoursePlayer) -> Self {
        let reconciler = player.reconciler();
        let state = player.state();
        let active_lesson = state.active_lesson();
        let summary = reconciler.local_summary();

        let modules = player
            .catalog()
            .modules()
            .iter()
            .map(|module| module_card(&reconciler, module, active_lesson))
            .collect();

        let lesson = player
            .current_lesson()
            .filter(|_| state.is_lesson())
            .map(|(module, lesson)| lesson_vm(player, &reconciler, module, lesson));

        Self {
            view: state.view(),
            fragment: player.fragment().to_string(),
            title: player.title().to_string(),
            site_title: player.site_title().to_string(),
            dark_mode: player.dark_mode(),
            catalog_loaded: player.is_catalog_loaded(),
            overall_percent: summary.progress_percentage,
            completed_lessons: summary.completed_lessons,
            total_lessons: summary.total_lessons,
            modules,
            module: state.module(),
            lesson,
            tracking: player.tracker().is_tracking(),
        }
    }

    #[must_use]
    pub fn module_card(&self, id: ModuleId) -> Option<&ModuleCardVm> {
        self.modules.iter().find(|card| card.id == id)
    }

    #[must_use]
    pub fn current_module_card(&self) -> Option<&ModuleCardVm> {
        self.module.and_then(|id| self.module_card(id))
    }
}

fn module_card(
    reconciler: &Reconciler<'_>,
    module: &Module,
    active_lesson: Option<LessonId>,
) -> ModuleCardVm {
    let completed = reconciler.completed_count(module);
    let action = if reconciler.is_module_complete(module) && !module.lessons.is_empty() {
        ModuleAction::Review
    } else if reconciler.has_started(module) {
        ModuleAction::Continue
    } else {
        ModuleAction::Start
    };
    ModuleCardVm {
        id: module.id,
        title: module.title.clone(),
        description: plain_excerpt(&module.description, DESCRIPTION_EXCERPT_CHARS),
        estimated_minutes: module.estimated_minutes,
        percent: reconciler.module_progress_percent(module),
        completed,
        total: module.lessons.len(),
        action,
        lessons: module
            .lessons
            .iter()
            .map(|lesson| LessonRowVm {
                id: lesson.id,
                title: lesson.title.clone(),
                completed: reconciler.is_complete(lesson),
                active: active_lesson == Some(lesson.id),
            })
            .collect(),
    }
}

fn lesson_vm(
    player: &CoursePlayer,
    reconciler: &Reconciler<'_>,
    module: &Module,
    lesson: &Lesson,
) -> LessonVm {
    let record = player.progress().get(lesson.id);
    let position = module
        .lessons
        .iter()
        .position(|candidate| candidate.id == lesson.id)
        .map_or(0, |index| index + 1);

    let quizzes = lesson
        .quizzes
        .iter()
        .enumerate()
        .map(|(index, quiz)| {
            let result = player.quiz_result(quiz.id);
            QuizVm {
                id: quiz.id,
                number: index + 1,
                question: quiz.question.clone(),
                options: quiz.options.clone(),
                selected: result.map(|result| result.selected_answer),
                is_correct: result.map(|result| result.is_correct),
                pending: player.quiz_answers().is_pending(quiz.id),
            }
        })
        .collect();

    let exercise = lesson.has_exercise.then(|| ExerciseVm {
        code: player.exercise_code(lesson),
        solution: solution(lesson).map(str::to_string),
        completed: record.is_some_and(|record| record.is_exercise_completed()),
    });

    LessonVm {
        id: lesson.id,
        module_id: module.id,
        module_title: module.title.clone(),
        title: lesson.title.clone(),
        content_html: markdown_to_html(&lesson.content),
        position,
        lesson_count: module.lessons.len(),
        completed: reconciler.is_complete(lesson),
        time_spent: format_duration(record.map_or(0, |record| record.time_spent())),
        quizzes,
        exercise,
        can_prev: player.can_step(Direction::Prev),
        can_next: player.can_step(Direction::Next),
    }
}

#[cfg(test)]
mod tests {
    use course_core::model::NavigationState;
    use course_core::route::Route;
    use course_core::time::fixed_clock;
    use serde_json::json;
    use services::{Command, CoursePlayer};
    use storage::local_store::{LocalSnapshot, LocalStore};
    use storage::repository::Storage;

    use super::*;

    fn catalog_json() -> serde_json::Value {
        json!([
            {"id": 1, "slug": "basics", "title": "Basics",
             "description": "Start **here**.", "lessons": [
                {"id": 10, "slug": "setup", "title": "Setup", "content": "# Setup\n\nInstall it.",
                 "is_completed": true,
                 "quizzes": [{"id": 5, "question": "Pick one", "options": ["a", "b"]}]},
                {"id": 11, "slug": "models", "title": "Models", "has_exercise": true,
                 "exercise_starter_code": "class Post: pass", "exercise_solution": "  "}
            ]},
            {"id": 2, "slug": "views", "title": "Views", "lessons": [
                {"id": 20, "slug": "urls", "title": "URLs"}
            ]}
        ])
    }

    async fn loaded_player() -> CoursePlayer {
        let store = LocalStore::new(Storage::in_memory().kv);
        let mut player = CoursePlayer::new(store, LocalSnapshot::default(), fixed_clock());
        let catalog = serde_json::from_value(catalog_json()).expect("catalog");
        player.dispatch(Command::CatalogLoaded(catalog)).await;
        player
    }

    #[tokio::test]
    async fn home_cards_reflect_server_completion() {
        let player = loaded_player().await;
        let vm = ShellVm::from_player(&player);

        assert_eq!(vm.view, ViewKind::Home);
        assert!(vm.catalog_loaded);
        assert_eq!(vm.overall_percent, 33);
        let basics = vm.module_card(ModuleId::new(1)).expect("basics card");
        assert_eq!(basics.percent, 50);
        assert_eq!(basics.action, ModuleAction::Continue);
        assert_eq!(basics.description, "Start here.");
        let views = vm.module_card(ModuleId::new(2)).expect("views card");
        assert_eq!(views.action, ModuleAction::Start);
        assert!(vm.lesson.is_none());
    }

    #[tokio::test]
    async fn lesson_vm_carries_exercise_and_step_flags() {
        let mut player = loaded_player().await;
        player
            .dispatch(Command::NavigateTo(Route::Lesson {
                module: "basics".into(),
                lesson: "models".into(),
            }))
            .await;
        assert_eq!(
            player.state(),
            NavigationState::lesson(ModuleId::new(1), LessonId::new(11))
        );

        let vm = ShellVm::from_player(&player);
        let lesson = vm.lesson.expect("lesson vm");
        assert_eq!(lesson.position, 2);
        assert_eq!(lesson.lesson_count, 2);
        assert!(lesson.can_prev);
        assert!(lesson.can_next);
        let exercise = lesson.exercise.expect("exercise");
        assert_eq!(exercise.code, "class Post: pass");
        assert_eq!(exercise.solution, None);
        assert!(vm.tracking);
        let card = vm.current_module_card().expect("current module");
        assert!(card.lessons.iter().any(|row| row.active && row.id == LessonId::new(11)));
    }

    #[tokio::test]
    async fn lesson_content_is_rendered_markdown() {
        let mut player = loaded_player().await;
        player.dispatch(Command::GotoLesson(LessonId::new(10))).await;

        let lesson = ShellVm::from_player(&player).lesson.expect("lesson vm");
        assert!(lesson.content_html.contains("<h1>Setup</h1>"));
        assert!(lesson.completed);
        assert!(!lesson.can_prev);
        assert_eq!(lesson.quizzes.len(), 1);
        assert!(!lesson.quizzes[0].is_answered());
    }
}
