use serde::{Deserialize, Serialize};

use crate::model::ids::{LessonId, ModuleId, QuizId};

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// A multiple-choice question attached to a lesson.
///
/// The correct option index never reaches the client before an answer is
/// submitted; the server judges correctness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub has_exercise: bool,
    #[serde(default)]
    pub exercise_starter_code: Option<String>,
    #[serde(default)]
    pub exercise_solution: Option<String>,
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
    /// Server truth as of the last catalog fetch.
    #[serde(default)]
    pub is_completed: bool,
}

impl Lesson {
    #[must_use]
    pub fn quiz(&self, id: QuizId) -> Option<&Quiz> {
        self.quizzes.iter().find(|quiz| quiz.id == id)
    }
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    /// Aggregate counts reported by the server, if it sent them.
    #[serde(default)]
    pub total_lessons: Option<u32>,
    #[serde(default)]
    pub completed_lessons: Option<u32>,
}

impl Module {
    #[must_use]
    pub fn first_lesson(&self) -> Option<&Lesson> {
        self.lessons.first()
    }

    #[must_use]
    pub fn last_lesson(&self) -> Option<&Lesson> {
        self.lessons.last()
    }

    #[must_use]
    pub fn lesson(&self, id: LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|lesson| lesson.id == id)
    }

    #[must_use]
    pub fn lesson_by_slug(&self, slug: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|lesson| lesson.slug == slug)
    }

    /// Server-reported `(completed, total)` when both counts are present.
    #[must_use]
    pub fn server_counts(&self) -> Option<(u32, u32)> {
        Some((self.completed_lessons?, self.total_lessons?))
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Index pair locating a lesson inside the catalog's stored order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonPosition {
    pub module: usize,
    pub lesson: usize,
}

/// The ordered list of modules loaded from the server for this session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    modules: Vec<Module>,
}

impl Catalog {
    #[must_use]
    pub fn new(modules: Vec<Module>) -> Self {
        Self { modules }
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.iter().find(|module| module.id == id)
    }

    #[must_use]
    pub fn module_by_slug(&self, slug: &str) -> Option<&Module> {
        self.modules.iter().find(|module| module.slug == slug)
    }

    #[must_use]
    pub fn module_index(&self, id: ModuleId) -> Option<usize> {
        self.modules.iter().position(|module| module.id == id)
    }

    #[must_use]
    pub fn module_at(&self, index: usize) -> Option<&Module> {
        self.modules.get(index)
    }

    /// Locate a lesson by id across all modules.
    #[must_use]
    pub fn locate(&self, lesson_id: LessonId) -> Option<LessonPosition> {
        self.modules.iter().enumerate().find_map(|(module, m)| {
            m.lessons
                .iter()
                .position(|lesson| lesson.id == lesson_id)
                .map(|lesson| LessonPosition { module, lesson })
        })
    }

    #[must_use]
    pub fn at(&self, position: LessonPosition) -> Option<(&Module, &Lesson)> {
        let module = self.modules.get(position.module)?;
        let lesson = module.lessons.get(position.lesson)?;
        Some((module, lesson))
    }

    /// Find a lesson and its owning module.
    #[must_use]
    pub fn find_lesson(&self, lesson_id: LessonId) -> Option<(&Module, &Lesson)> {
        self.locate(lesson_id).and_then(|position| self.at(position))
    }

    #[must_use]
    pub fn find_quiz(&self, quiz_id: QuizId) -> Option<(&Lesson, &Quiz)> {
        self.lessons()
            .find_map(|lesson| lesson.quiz(quiz_id).map(|quiz| (lesson, quiz)))
    }

    /// All lessons in stored order.
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.modules.iter().flat_map(|module| module.lessons.iter())
    }

    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|module| module.lessons.len()).sum()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn locates_lessons_across_modules() {
        let catalog = two_module_catalog();
        assert_eq!(
            catalog.locate(LessonId::new(20)),
            Some(LessonPosition { module: 1, lesson: 0 })
        );
        assert_eq!(catalog.locate(LessonId::new(99)), None);
        let (module, lesson) = catalog.find_lesson(LessonId::new(11)).unwrap();
        assert_eq!(module.slug, "basics");
        assert_eq!(lesson.slug, "models");
    }

    #[test]
    fn deserializes_server_payload_with_missing_fields() {
        let json = r##"[{
            "id": 1, "slug": "intro", "title": "Intro",
            "description": "d", "estimated_minutes": 15,
            "total_lessons": 1, "completed_lessons": 0,
            "dotnet_comparison": "ignored",
            "lessons": [{
                "id": 5, "slug": "hello", "title": "Hello", "content": "# hi",
                "order": 1, "has_exercise": true, "exercise_starter_code": "pass",
                "quizzes": [{"id": 9, "question": "?", "options": ["a", "b"]}],
                "is_completed": true
            }]
        }]"##;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        let module = catalog.module_by_slug("intro").unwrap();
        assert_eq!(module.server_counts(), Some((0, 1)));
        let lesson = module.lesson_by_slug("hello").unwrap();
        assert!(lesson.is_completed);
        assert_eq!(lesson.exercise_solution, None);
        assert!(catalog.find_quiz(QuizId::new(9)).is_some());
    }

    #[test]
    fn counts_lessons() {
        assert_eq!(two_module_catalog().lesson_count(), 3);
        assert_eq!(Catalog::default().lesson_count(), 0);
    }
}
