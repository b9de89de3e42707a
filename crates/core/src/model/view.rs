use crate::model::ids::{LessonId, ModuleId};

/// The single panel currently displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Home,
    ModuleOverview,
    Lesson,
    ProgressDashboard,
    Settings,
}

/// Which view is active and which module/lesson backs it.
///
/// Never persisted: on startup it is derived from the URL fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationState {
    view: ViewKind,
    module: Option<ModuleId>,
    lesson: Option<LessonId>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::home()
    }
}

impl NavigationState {
    #[must_use]
    pub fn home() -> Self {
        Self {
            view: ViewKind::Home,
            module: None,
            lesson: None,
        }
    }

    #[must_use]
    pub fn settings() -> Self {
        Self {
            view: ViewKind::Settings,
            module: None,
            lesson: None,
        }
    }

    #[must_use]
    pub fn progress_dashboard() -> Self {
        Self {
            view: ViewKind::ProgressDashboard,
            module: None,
            lesson: None,
        }
    }

    #[must_use]
    pub fn module_overview(module: ModuleId) -> Self {
        Self {
            view: ViewKind::ModuleOverview,
            module: Some(module),
            lesson: None,
        }
    }

    #[must_use]
    pub fn lesson(module: ModuleId, lesson: LessonId) -> Self {
        Self {
            view: ViewKind::Lesson,
            module: Some(module),
            lesson: Some(lesson),
        }
    }

    #[must_use]
    pub fn view(&self) -> ViewKind {
        self.view
    }

    #[must_use]
    pub fn module(&self) -> Option<ModuleId> {
        self.module
    }

    #[must_use]
    pub fn lesson_id(&self) -> Option<LessonId> {
        self.lesson
    }

    /// The lesson being viewed, only when the Lesson view is active.
    #[must_use]
    pub fn active_lesson(&self) -> Option<LessonId> {
        match self.view {
            ViewKind::Lesson => self.lesson,
            _ => None,
        }
    }

    #[must_use]
    pub fn is_lesson(&self) -> bool {
        self.view == ViewKind::Lesson
    }
}
