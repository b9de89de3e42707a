use std::sync::atomic::Ordering;

use course_core::model::{LessonId, QuizId, ViewKind};
use course_core::navigator::Direction;
use course_core::route::Route;
use services::Command;

use crate::shell::ShellMsg;
use crate::views::test_harness::{
    FakeApi, ViewHarness, setup_cold_view_harness, setup_view_harness,
    setup_view_harness_with_api,
};

impl ViewHarness {
    fn send(&mut self, msg: ShellMsg) {
        let shell = self.handles.shell();
        self.dom.in_runtime(|| shell.send(msg));
    }
}

#[tokio::test(flavor = "current_thread")]
async fn home_lists_modules_with_progress() {
    let mut harness = setup_view_harness("").await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("1 of 3 lessons completed"));
    assert!(html.contains("Basics"));
    assert!(html.contains("Project setup."));
    assert!(html.contains("0/2 lessons"));
    assert!(html.contains("30 min"));
    assert!(html.contains("Review"));
    assert!(html.contains("Start learning"));
}

#[tokio::test(flavor = "current_thread")]
async fn unknown_fragment_lands_on_home() {
    let mut harness = setup_view_harness("#/nope/at/all").await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Start learning"));
    let session = harness.session.lock().await;
    assert_eq!(session.player().state().view(), ViewKind::Home);
}

#[tokio::test(flavor = "current_thread")]
async fn module_overview_lists_lessons() {
    let mut harness = setup_view_harness("#/module/basics").await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("0 of 2 lessons completed"));
    assert!(html.contains("Setup"));
    assert!(html.contains("Models"));
    assert!(html.contains("Start module"));
}

#[tokio::test(flavor = "current_thread")]
async fn lesson_renders_markdown_and_quiz() {
    let mut harness = setup_view_harness("#/module/basics/lesson/setup").await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("<h2>Installing</h2>"));
    assert!(html.contains("<code>pip install django</code>"));
    assert!(html.contains("Lesson 1 of 2"));
    assert!(html.contains("Which command starts a project?"));
    assert!(html.contains("startproject"));
    assert!(html.contains("Mark as complete"));
    assert!(html.contains("Next →"));
}

#[tokio::test(flavor = "current_thread")]
async fn answering_a_quiz_shows_the_verdict() {
    let mut harness = setup_view_harness("#/module/basics/lesson/setup").await;
    harness.rebuild();
    harness.settle().await;

    harness.send(ShellMsg::AnswerQuiz {
        quiz: QuizId::new(5),
        selected: 1,
    });
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Correct! startproject creates the layout."));
}

#[tokio::test(flavor = "current_thread")]
async fn completing_a_lesson_swaps_the_button_for_a_badge() {
    let mut harness = setup_view_harness("#/module/basics/lesson/setup").await;
    harness.rebuild();
    harness.settle().await;

    harness.send(ShellMsg::Dispatch(Command::CompleteLesson(LessonId::new(10))));
    harness.settle().await;

    let html = harness.render();
    assert!(!html.contains("Mark as complete"));
    assert!(html.contains("Lesson marked as complete."));
    let session = harness.session.lock().await;
    assert!(
        session
            .player()
            .reconciler()
            .lesson_completed(LessonId::new(10))
    );
}

#[tokio::test(flavor = "current_thread")]
async fn exercise_shows_starter_code_and_results() {
    let mut harness = setup_view_harness("#/module/basics/lesson/models").await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("class Post: pass"));
    assert!(html.contains("Run tests"));
    assert!(html.contains("Lesson 2 of 2"));

    harness.send(ShellMsg::SubmitExercise {
        code: "class Post(models.Model): pass".into(),
    });
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("All tests passed! Great job!"));
}

#[tokio::test(flavor = "current_thread")]
async fn dashboard_prefers_server_summary() {
    let mut harness = setup_view_harness("#/progress").await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Synced with the server."));
    assert!(html.contains("42%"));
    assert!(html.contains("5/12"));
    assert!(html.contains("3h 15m"));
}

#[tokio::test(flavor = "current_thread")]
async fn dashboard_falls_back_to_local_progress() {
    let api = FakeApi::new();
    let mut harness = setup_view_harness_with_api("#/progress", api.clone()).await;
    api.offline.store(true, Ordering::SeqCst);
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Server unavailable, showing progress saved on this device."));
    assert!(html.contains("1/3"));
    assert!(html.contains("33%"));
}

#[tokio::test(flavor = "current_thread")]
async fn settings_toggle_the_theme() {
    let mut harness = setup_view_harness("#/settings").await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Theme: Light"));
    assert!(html.contains("Export progress"));
    assert!(html.contains("Reset progress"));

    harness.send(ShellMsg::Dispatch(Command::SetDarkMode(true)));
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Theme: Dark"));
    assert!(html.contains("theme-dark"));
}

#[tokio::test(flavor = "current_thread")]
async fn cold_start_opens_the_deep_link_once_the_catalog_arrives() {
    let mut harness =
        setup_cold_view_harness("#/module/basics/lesson/setup", FakeApi::new()).await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Lesson 1 of 2"));
    assert!(html.contains("Which command starts a project?"));
}

#[tokio::test(flavor = "current_thread")]
async fn cold_start_offline_stays_home_and_says_so() {
    let api = FakeApi::new();
    api.offline.store(true, Ordering::SeqCst);
    let mut harness = setup_cold_view_harness("#/module/basics", api).await;
    harness.rebuild();
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Loading course…"));
    assert!(html.contains("Could not reach the course server."));
}

#[tokio::test(flavor = "current_thread")]
async fn stalled_quiz_request_leaves_navigation_responsive() {
    let api = FakeApi::new();
    let mut harness =
        setup_view_harness_with_api("#/module/basics/lesson/setup", api.clone()).await;
    harness.rebuild();
    harness.settle().await;

    api.stalled.store(true, Ordering::SeqCst);
    harness.send(ShellMsg::AnswerQuiz {
        quiz: QuizId::new(5),
        selected: 1,
    });
    harness.settle().await;
    assert!(harness.render().contains("Checking…"));

    harness.send(ShellMsg::Dispatch(Command::Step(Direction::Next)));
    harness.settle().await;
    assert!(harness.render().contains("Lesson 2 of 2"));

    harness.send(ShellMsg::Dispatch(Command::VisibilityChanged(false)));
    harness.settle().await;
    let session = harness.session.lock().await;
    assert!(!session.player().tracker().is_tracking());
    assert!(session.player().quiz_answers().is_pending(QuizId::new(5)));
}

#[tokio::test(flavor = "current_thread")]
async fn dashboard_can_be_left_while_the_summary_stalls() {
    let api = FakeApi::new();
    api.stalled.store(true, Ordering::SeqCst);
    let mut harness = setup_view_harness_with_api("#/progress", api).await;
    harness.rebuild();
    harness.settle().await;
    assert!(harness.render().contains("Loading..."));

    harness.send(ShellMsg::Dispatch(Command::NavigateTo(Route::Home)));
    harness.settle().await;

    let html = harness.render();
    assert!(html.contains("Start learning"));
    assert!(!html.contains("Loading..."));
}
