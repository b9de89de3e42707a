//! Lesson sequencing across the ordered module list.

use tracing::debug;

use crate::error::NotFound;
use crate::model::{Catalog, LessonId, LessonPosition, ModuleId, ProgressMap};
use crate::reconcile::Reconciler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Next,
    Prev,
}

/// Where a navigation operation lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonTarget {
    pub module: ModuleId,
    pub lesson: LessonId,
    /// True when the move left the module the learner started from.
    pub crosses_module: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Navigator<'a> {
    catalog: &'a Catalog,
    reconciler: Reconciler<'a>,
}

impl<'a> Navigator<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog, local: &'a ProgressMap) -> Self {
        Self {
            catalog,
            reconciler: Reconciler::new(catalog, local),
        }
    }

    /// First lesson of the module.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the module is unknown or has no lessons.
    pub fn start(&self, module: ModuleId) -> Result<LessonTarget, NotFound> {
        let found = self.catalog.module(module).ok_or(NotFound::Module(module))?;
        let first = found.first_lesson().ok_or(NotFound::EmptyModule(module))?;
        Ok(LessonTarget {
            module,
            lesson: first.id,
            crosses_module: false,
        })
    }

    /// First incomplete lesson, or the first lesson when everything is done.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the module is unknown or has no lessons.
    pub fn continue_or_start(&self, module: ModuleId) -> Result<LessonTarget, NotFound> {
        let found = self.catalog.module(module).ok_or(NotFound::Module(module))?;
        match self.reconciler.next_incomplete_lesson(found) {
            Some(lesson) => Ok(LessonTarget {
                module,
                lesson: lesson.id,
                crosses_module: false,
            }),
            None => self.start(module),
        }
    }

    /// Jump to a lesson by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound::Lesson` if no module owns the lesson.
    pub fn goto(&self, lesson: LessonId) -> Result<LessonTarget, NotFound> {
        let (module, found) = self.catalog.find_lesson(lesson).ok_or(NotFound::Lesson(lesson))?;
        Ok(LessonTarget {
            module: module.id,
            lesson: found.id,
            crosses_module: false,
        })
    }

    /// First lesson of the first module that has any.
    #[must_use]
    pub fn start_course(&self) -> Option<LessonTarget> {
        self.catalog.modules().iter().find_map(|module| {
            module.first_lesson().map(|lesson| LessonTarget {
                module: module.id,
                lesson: lesson.id,
                crosses_module: false,
            })
        })
    }

    /// Neighbouring lesson in the given direction, or `None` at either end of
    /// the course (or for a lesson the catalog does not know).
    #[must_use]
    pub fn step(&self, from: LessonId, direction: Direction) -> Option<LessonTarget> {
        let Some(position) = self.catalog.locate(from) else {
            debug!(lesson = %from, "step from a lesson outside the catalog");
            return None;
        };
        let target = match direction {
            Direction::Next => self.next_position(position)?,
            Direction::Prev => self.prev_position(position)?,
        };
        let (module, lesson) = self.catalog.at(target)?;
        Some(LessonTarget {
            module: module.id,
            lesson: lesson.id,
            crosses_module: target.module != position.module,
        })
    }

    /// Whether the prev/next control should be enabled.
    #[must_use]
    pub fn can_step(&self, from: LessonId, direction: Direction) -> bool {
        self.step(from, direction).is_some()
    }

    fn next_position(&self, at: LessonPosition) -> Option<LessonPosition> {
        let current = self.catalog.module_at(at.module)?;
        if at.lesson + 1 < current.lessons.len() {
            return Some(LessonPosition {
                module: at.module,
                lesson: at.lesson + 1,
            });
        }
        // modules without lessons are skipped
        (at.module + 1..self.catalog.modules().len()).find_map(|index| {
            let module = self.catalog.module_at(index)?;
            (!module.lessons.is_empty()).then_some(LessonPosition {
                module: index,
                lesson: 0,
            })
        })
    }

    fn prev_position(&self, at: LessonPosition) -> Option<LessonPosition> {
        if at.lesson > 0 {
            return Some(LessonPosition {
                module: at.module,
                lesson: at.lesson - 1,
            });
        }
        (0..at.module).rev().find_map(|index| {
            let module = self.catalog.module_at(index)?;
            let last = module.lessons.len().checked_sub(1)?;
            Some(LessonPosition {
                module: index,
                lesson: last,
            })
        })
    }
}
