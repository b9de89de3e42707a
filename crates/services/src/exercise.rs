use course_core::model::{ExerciseCodes, Lesson};

/// Code to show in the editor: the learner's saved code, else the starter
/// code, else nothing.
#[must_use]
pub fn editor_code(lesson: &Lesson, saved: &ExerciseCodes) -> String {
    saved
        .get(lesson.id)
        .or(lesson.exercise_starter_code.as_deref())
        .unwrap_or_default()
        .to_string()
}

#[must_use]
pub fn solution(lesson: &Lesson) -> Option<&str> {
    lesson
        .exercise_solution
        .as_deref()
        .filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::LessonId;
    use serde_json::json;

    fn lesson() -> Lesson {
        serde_json::from_value(json!({
            "id": 4,
            "slug": "views",
            "title": "Views",
            "has_exercise": true,
            "exercise_starter_code": "def index(request):\n    pass",
            "exercise_solution": "   "
        }))
        .unwrap()
    }

    #[test]
    fn saved_code_wins_over_starter() {
        let lesson = lesson();
        let mut saved = ExerciseCodes::default();
        assert_eq!(editor_code(&lesson, &saved), "def index(request):\n    pass");

        saved.set(LessonId::new(4), "return 1");
        assert_eq!(editor_code(&lesson, &saved), "return 1");
    }

    #[test]
    fn blank_solution_counts_as_missing() {
        assert_eq!(solution(&lesson()), None);
    }
}
