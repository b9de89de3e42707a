//! Merge of local progress records with server-reported completion.
//!
//! A lesson counts as completed when the local record says so OR the server
//! flag says so. Neither side can turn the other's `true` into `false`.
//! Percentages are always recomputed from the lesson arrays; server aggregate
//! counts on `Module` are informational only.

use crate::model::{Catalog, Lesson, LessonId, Module, ProgressMap};

/// `round(100 * completed / total)` with halves rounded up; zero when `total == 0`.
#[must_use]
pub fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    let rounded = (200 * completed + total) / (2 * total);
    u8::try_from(rounded).unwrap_or(100)
}

/// Locally computed totals, used when the server summary is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalSummary {
    pub completed_lessons: usize,
    pub total_lessons: usize,
    pub progress_percentage: u8,
    pub total_time_seconds: u64,
}

/// Read-only view combining the catalog (server truth) with local progress.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'a> {
    catalog: &'a Catalog,
    local: &'a ProgressMap,
}

impl<'a> Reconciler<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog, local: &'a ProgressMap) -> Self {
        Self { catalog, local }
    }

    #[must_use]
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Completion by id. Ids missing from the catalog only consult local state.
    #[must_use]
    pub fn lesson_completed(&self, lesson: LessonId) -> bool {
        if self.local.is_completed(lesson) {
            return true;
        }
        self.catalog
            .find_lesson(lesson)
            .is_some_and(|(_, found)| found.is_completed)
    }

    #[must_use]
    pub fn is_complete(&self, lesson: &Lesson) -> bool {
        lesson.is_completed || self.local.is_completed(lesson.id)
    }

    #[must_use]
    pub fn completed_count(&self, module: &Module) -> usize {
        module
            .lessons
            .iter()
            .filter(|lesson| self.is_complete(lesson))
            .count()
    }

    #[must_use]
    pub fn module_progress_percent(&self, module: &Module) -> u8 {
        percent(self.completed_count(module), module.lessons.len())
    }

    #[must_use]
    pub fn overall_progress_percent(&self) -> u8 {
        let completed = self
            .catalog
            .lessons()
            .filter(|lesson| self.is_complete(lesson))
            .count();
        percent(completed, self.catalog.lesson_count())
    }

    /// First lesson in stored order that is not completed.
    #[must_use]
    pub fn next_incomplete_lesson(&self, module: &'a Module) -> Option<&'a Lesson> {
        module.lessons.iter().find(|lesson| !self.is_complete(lesson))
    }

    /// Whether any lesson of the module has been completed.
    #[must_use]
    pub fn has_started(&self, module: &Module) -> bool {
        module.lessons.iter().any(|lesson| self.is_complete(lesson))
    }

    #[must_use]
    pub fn is_module_complete(&self, module: &Module) -> bool {
        module.lessons.iter().all(|lesson| self.is_complete(lesson))
    }

    #[must_use]
    pub fn local_summary(&self) -> LocalSummary {
        let total_lessons = self.catalog.lesson_count();
        let completed_lessons = self
            .catalog
            .lessons()
            .filter(|lesson| self.is_complete(lesson))
            .count();
        let total_time_seconds = self
            .catalog
            .lessons()
            .filter_map(|lesson| self.local.get(lesson.id))
            .map(|record| record.time_spent())
            .sum();
        LocalSummary {
            completed_lessons,
            total_lessons,
            progress_percentage: percent(completed_lessons, total_lessons),
            total_time_seconds,
        }
    }
}
