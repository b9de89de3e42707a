use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use serde_json::{Value, json};

use course_core::model::{LessonId, Module, QuizId};
use course_core::time::fixed_clock;
use services::{
    ApiError, CourseApi, Event, ExerciseReport, ModuleProgress, PlayerConfig, PlayerSession,
    ProgressSummary, QuizVerdict, SharedSession, TestResult,
};
use storage::repository::Storage;

use crate::app::{Layout, ShellProvider};
use crate::context::{UiApp, build_app_context};
use crate::shell::{Shell, use_shell};

//
// ─── FAKE SERVER ───────────────────────────────────────────────────────────────
//

pub struct FakeApi {
    modules: Vec<Module>,
    pub offline: AtomicBool,
    /// Quiz and summary requests never answer while set.
    pub stalled: AtomicBool,
    pub imports: StdMutex<Vec<Value>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        let modules = serde_json::from_value(json!([
            {"id": 1, "slug": "basics", "title": "Basics", "description": "Project setup.",
             "estimated_minutes": 30, "lessons": [
                {"id": 10, "slug": "setup", "title": "Setup",
                 "content": "## Installing\n\nRun `pip install django`.",
                 "quizzes": [
                    {"id": 5, "question": "Which command starts a project?",
                     "options": ["runserver", "startproject"]}
                 ]},
                {"id": 11, "slug": "models", "title": "Models", "content": "Models map tables.",
                 "has_exercise": true, "exercise_starter_code": "class Post: pass",
                 "exercise_solution": "class Post(models.Model): pass"}
            ]},
            {"id": 2, "slug": "views", "title": "Views", "lessons": [
                {"id": 20, "slug": "urls", "title": "URLs", "content": "Routing.",
                 "is_completed": true}
            ]}
        ]))
        .expect("fake catalog");
        Arc::new(Self {
            modules,
            offline: AtomicBool::new(false),
            stalled: AtomicBool::new(false),
            imports: StdMutex::new(Vec::new()),
        })
    }

    fn check_online(&self) -> Result<(), ApiError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ApiError::Decode("offline".into()));
        }
        Ok(())
    }

    async fn stall_if_asked(&self) {
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl CourseApi for FakeApi {
    async fn list_modules(&self) -> Result<Vec<Module>, ApiError> {
        self.check_online()?;
        Ok(self.modules.clone())
    }

    async fn complete_lesson(&self, _lesson: LessonId) -> Result<(), ApiError> {
        self.check_online()
    }

    async fn track_time(&self, _lesson: LessonId, _seconds: u64) -> Result<(), ApiError> {
        self.check_online()
    }

    async fn submit_quiz(
        &self,
        _quiz: QuizId,
        selected_answer: usize,
    ) -> Result<QuizVerdict, ApiError> {
        self.stall_if_asked().await;
        self.check_online()?;
        Ok(QuizVerdict {
            is_correct: selected_answer == 1,
            correct_answer: Some(1),
            explanation: Some("startproject creates the layout.".into()),
        })
    }

    async fn submit_exercise(
        &self,
        _lesson: LessonId,
        code: &str,
    ) -> Result<ExerciseReport, ApiError> {
        self.check_online()?;
        let passed = code.contains("models.Model");
        Ok(ExerciseReport {
            all_passed: passed,
            results: vec![TestResult {
                test: "Post is a model".into(),
                passed,
                error: None,
                expected: Some("models.Model".into()),
                actual: Some("object".into()),
            }],
        })
    }

    async fn progress_summary(&self) -> Result<ProgressSummary, ApiError> {
        self.stall_if_asked().await;
        self.check_online()?;
        Ok(ProgressSummary {
            progress_percentage: 42,
            completed_lessons: 5,
            total_lessons: 12,
            total_time_seconds: 3 * 3600 + 15 * 60,
            modules_progress: vec![ModuleProgress {
                title: "Basics".into(),
                progress_percentage: 80,
            }],
        })
    }

    async fn export_progress(&self) -> Result<Value, ApiError> {
        self.check_online()?;
        Ok(json!({"progress": []}))
    }

    async fn import_progress(&self, blob: &Value) -> Result<(), ApiError> {
        self.check_online()?;
        self.imports
            .lock()
            .expect("imports lock")
            .push(blob.clone());
        Ok(())
    }
}

//
// ─── APP WIRING ────────────────────────────────────────────────────────────────
//

struct TestApp {
    session: SharedSession,
    export_dir: PathBuf,
    startup_events: Vec<Event>,
}

impl UiApp for TestApp {
    fn session(&self) -> SharedSession {
        self.session.clone()
    }

    fn export_dir(&self) -> PathBuf {
        self.export_dir.clone()
    }

    fn startup_events(&self) -> Vec<Event> {
        self.startup_events.clone()
    }
}

#[derive(Clone, Default)]
pub struct HarnessHandles {
    shell: Rc<RefCell<Option<Shell>>>,
}

impl HarnessHandles {
    pub fn shell(&self) -> Shell {
        self.shell.borrow().expect("shell registered")
    }
}

#[derive(Props, Clone)]
struct HarnessProps {
    app: Arc<TestApp>,
    handles: HarnessHandles,
}

impl PartialEq for HarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn AppHarness(props: HarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    rsx! {
        ShellProvider {
            Layout {}
            ShellCapture { handles: props.handles.clone() }
        }
    }
}

/// Sits under the shell provider so the test can post messages.
#[component]
fn ShellCapture(handles: HarnessHandles) -> Element {
    let shell = use_shell();
    use_hook(move || {
        *handles.shell.borrow_mut() = Some(shell);
    });
    rsx! {}
}

impl PartialEq for HarnessHandles {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub session: SharedSession,
    pub api: Arc<FakeApi>,
    pub handles: HarnessHandles,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Let the shell coroutine and resources catch up.
    pub async fn settle(&mut self) {
        for _ in 0..6 {
            self.drive_async().await;
        }
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub async fn setup_view_harness(fragment: &str) -> ViewHarness {
    setup_view_harness_with_api(fragment, FakeApi::new()).await
}

/// Session with the catalog already loaded.
pub async fn setup_view_harness_with_api(fragment: &str, api: Arc<FakeApi>) -> ViewHarness {
    let (session, startup_events) = PlayerSession::start(
        &Storage::in_memory(),
        api.clone(),
        &PlayerConfig::default(),
        fixed_clock(),
        fragment,
    )
    .await;
    mount(session, startup_events, api)
}

/// Session as the desktop app opens it: the shell fetches the catalog.
pub async fn setup_cold_view_harness(fragment: &str, api: Arc<FakeApi>) -> ViewHarness {
    let (session, startup_events) = PlayerSession::restore(
        &Storage::in_memory(),
        api.clone(),
        &PlayerConfig::default(),
        fixed_clock(),
        fragment,
    )
    .await;
    mount(session, startup_events, api)
}

fn mount(session: PlayerSession, startup_events: Vec<Event>, api: Arc<FakeApi>) -> ViewHarness {
    let session = SharedSession::new(session);
    let handles = HarnessHandles::default();

    let app = Arc::new(TestApp {
        session: session.clone(),
        export_dir: std::env::temp_dir(),
        startup_events,
    });

    let dom = VirtualDom::new_with_props(
        AppHarness,
        HarnessProps {
            app,
            handles: handles.clone(),
        },
    );

    ViewHarness {
        dom,
        session,
        api,
        handles,
    }
}
