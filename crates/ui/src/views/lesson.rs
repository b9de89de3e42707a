use dioxus::prelude::*;

use course_core::model::{LessonId, ModuleId};
use course_core::navigator::Direction;
use course_core::route::Route;
use services::{Command, ExerciseReport, QuizVerdict};

use crate::shell::{ShellMsg, use_shell};
use crate::vm::{ExerciseVm, QuizVm};

#[component]
pub fn LessonView() -> Element {
    let shell = use_shell();
    let vm = shell.state.vm.read().clone();
    let Some(lesson) = vm.lesson else {
        return rsx! {
            div { class: "page",
                p { class: "muted", "This lesson is not available." }
            }
        };
    };
    let lesson_id = lesson.id;
    let module_id = lesson.module_id;
    let feedback = shell.state.quiz_feedback.read().clone();
    let report = shell.state.exercise_reports.read().get(&lesson_id).cloned();

    rsx! {
        div { class: "page lesson-page",
            nav { class: "breadcrumbs",
                button {
                    class: "link-btn",
                    r#type: "button",
                    onclick: move |_| shell.dispatch(Command::NavigateTo(Route::Home)),
                    "Modules"
                }
                span { " / " }
                button {
                    class: "link-btn",
                    r#type: "button",
                    onclick: move |_| shell.dispatch(Command::OpenModule(module_id)),
                    "{lesson.module_title}"
                }
            }
            header { class: "lesson-header",
                h1 { "{lesson.title}" }
                p { class: "muted",
                    "Lesson {lesson.position} of {lesson.lesson_count} · {lesson.time_spent} spent"
                }
            }

            article { class: "lesson-body", dangerous_inner_html: "{lesson.content_html}" }

            if !lesson.quizzes.is_empty() {
                section { class: "quiz-section",
                    h2 { "Check your understanding" }
                    for quiz in lesson.quizzes {
                        QuizCard {
                            key: "{quiz.id}",
                            feedback: feedback.get(&quiz.id).cloned(),
                            quiz: quiz.clone(),
                        }
                    }
                }
            }

            if let Some(exercise) = lesson.exercise {
                ExercisePanel {
                    key: "{lesson_id}",
                    lesson: lesson_id,
                    exercise,
                    report,
                }
            }

            LessonFooter {
                lesson: lesson_id,
                module: module_id,
                completed: lesson.completed,
                can_prev: lesson.can_prev,
                can_next: lesson.can_next,
            }
        }
    }
}

#[component]
fn QuizCard(quiz: QuizVm, feedback: Option<QuizVerdict>) -> Element {
    let shell = use_shell();
    let quiz_id = quiz.id;
    let locked = quiz.is_answered() || quiz.pending;
    let correct_answer = feedback.as_ref().and_then(|verdict| verdict.correct_answer);
    let message = result_message(&quiz, feedback.as_ref());

    rsx! {
        div { class: "quiz-question",
            h4 { "Question {quiz.number}" }
            p { "{quiz.question}" }
            div { class: "quiz-options",
                for (index, option) in quiz.options.iter().enumerate() {
                    button {
                        key: "{index}",
                        class: option_class(&quiz, correct_answer, index),
                        r#type: "button",
                        disabled: locked,
                        onclick: move |_| {
                            shell.send(ShellMsg::AnswerQuiz {
                                quiz: quiz_id,
                                selected: index,
                            })
                        },
                        "{option}"
                    }
                }
            }
            if let Some((class, text)) = message {
                div { class: "{class}", "{text}" }
            }
        }
    }
}

fn option_class(quiz: &QuizVm, correct_answer: Option<usize>, index: usize) -> &'static str {
    match (quiz.selected, quiz.is_correct) {
        (Some(selected), Some(true)) if selected == index => "quiz-option selected correct",
        (Some(selected), Some(false)) if selected == index => "quiz-option selected incorrect",
        (Some(_), _) if correct_answer == Some(index) => "quiz-option correct",
        _ => "quiz-option",
    }
}

/// Fresh answers show the server explanation; restored ones only the verdict.
fn result_message(quiz: &QuizVm, feedback: Option<&QuizVerdict>) -> Option<(&'static str, String)> {
    if quiz.pending {
        return Some(("alert alert-info", "Checking…".to_string()));
    }
    let is_correct = quiz.is_correct?;
    let explanation = feedback
        .and_then(|verdict| verdict.explanation.as_deref())
        .unwrap_or_default();
    Some(match (is_correct, explanation.is_empty()) {
        (true, true) => ("alert alert-success", "Correct!".to_string()),
        (true, false) => ("alert alert-success", format!("Correct! {explanation}")),
        (false, true) => ("alert alert-danger", "Incorrect. Try again!".to_string()),
        (false, false) => ("alert alert-danger", format!("Incorrect. {explanation}")),
    })
}

#[component]
fn ExercisePanel(lesson: LessonId, exercise: ExerciseVm, report: Option<ExerciseReport>) -> Element {
    let shell = use_shell();
    let mut code = use_signal(|| exercise.code.clone());
    let mut solution_note = use_signal(|| None::<&'static str>);
    let grading = (shell.state.grading)();
    let solution = exercise.solution.clone();

    rsx! {
        section { class: "exercise",
            h2 { "Exercise" }
            if exercise.completed {
                p { class: "badge badge-done", "Exercise completed" }
            }
            textarea {
                class: "exercise-code",
                rows: "14",
                value: "{code}",
                oninput: move |evt| {
                    let value = evt.value();
                    code.set(value.clone());
                    shell.send(ShellMsg::EditCode { lesson, code: value });
                },
            }
            div { class: "exercise-actions",
                button {
                    class: "btn btn-primary",
                    r#type: "button",
                    disabled: grading,
                    onclick: move |_| shell.send(ShellMsg::SubmitExercise { code: code() }),
                    if grading { "Running tests…" } else { "Run tests" }
                }
                button {
                    class: "btn",
                    r#type: "button",
                    onclick: move |_| match solution.clone() {
                        Some(text) => {
                            code.set(text);
                            solution_note.set(Some("Solution loaded."));
                        }
                        None => solution_note.set(Some("No solution available for this exercise.")),
                    },
                    "Show solution"
                }
            }
            if let Some(note) = solution_note() {
                div { class: "alert alert-info", "{note}" }
            }
            if let Some(report) = report {
                TestResults { report }
            }
        }
    }
}

#[component]
fn TestResults(report: ExerciseReport) -> Element {
    if report.all_passed {
        return rsx! {
            div { class: "alert alert-success", "All tests passed! Great job!" }
        };
    }
    rsx! {
        div { class: "test-results",
            div { class: "alert alert-danger",
                "{report.passed_count()} of {report.results.len()} tests passed"
            }
            for (index, result) in report.results.iter().enumerate() {
                div {
                    key: "{index}",
                    class: if result.passed { "test-result passed" } else { "test-result failed" },
                    strong { "{result.test}: " }
                    if result.passed { "Passed" } else { "Failed" }
                    if let Some(error) = result.error.as_deref() {
                        div { class: "test-detail", "Error: {error}" }
                    }
                    if !result.passed {
                        if let Some(expected) = result.expected.as_deref() {
                            div { class: "test-detail",
                                "Expected: {expected} · Got: {result.actual.as_deref().unwrap_or_default()}"
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn LessonFooter(
    lesson: LessonId,
    module: ModuleId,
    completed: bool,
    can_prev: bool,
    can_next: bool,
) -> Element {
    let shell = use_shell();

    rsx! {
        footer { class: "lesson-footer",
            button {
                class: "btn",
                r#type: "button",
                disabled: !can_prev,
                onclick: move |_| shell.dispatch(Command::Step(Direction::Prev)),
                "← Previous"
            }
            if completed {
                span { class: "badge badge-done", "Completed" }
            } else {
                button {
                    class: "btn btn-success",
                    r#type: "button",
                    onclick: move |_| shell.dispatch(Command::CompleteLesson(lesson)),
                    "Mark as complete"
                }
            }
            if can_next {
                button {
                    class: "btn",
                    r#type: "button",
                    onclick: move |_| shell.dispatch(Command::Step(Direction::Next)),
                    "Next →"
                }
            } else {
                button {
                    class: "btn",
                    r#type: "button",
                    onclick: move |_| shell.dispatch(Command::OpenModule(module)),
                    "Back to module"
                }
            }
        }
    }
}
