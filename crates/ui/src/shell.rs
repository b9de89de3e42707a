//! The desktop shell around `PlayerSession`.
//!
//! Views never touch the session directly. They post `ShellMsg`s to one
//! coroutine owned by the root component. Player updates are applied in
//! order; anything that talks to the server runs on its own task in the root
//! scope, next to the tracker ticker, outbox delivery, and the page watcher.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;

use dioxus::document::eval;
use dioxus::prelude::*;
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::{debug, info, warn};

use course_core::model::{LessonId, ModuleId, QuizId};
use services::backup::export_file_name;
use services::{
    BackupError, Command, Event, ExerciseReport, Notification, QuizVerdict,
};

use crate::context::AppContext;
use crate::vm::{NavHistory, ShellVm};

const TOAST_LIFETIME: Duration = Duration::from_secs(5);
const CODE_SAVE_DEBOUNCE: Duration = Duration::from_secs(1);

const PAGE_WATCH_SCRIPT: &str = r#"
const report = () => dioxus.send({
    visible: document.visibilityState === "visible",
    focused: document.hasFocus(),
});
document.addEventListener("visibilitychange", report);
window.addEventListener("focus", report);
window.addEventListener("blur", report);
window.addEventListener("pagehide", () => dioxus.send({ visible: false, focused: false }));
report();
"#;

/// What a view can ask of the shell.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellMsg {
    Dispatch(Command),
    Back,
    Forward,
    AnswerQuiz { quiz: QuizId, selected: usize },
    EditCode { lesson: LessonId, code: String },
    SubmitExercise { code: String },
    ExportProgress,
    ImportProgress(PathBuf),
    DismissToast(u64),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub notification: Notification,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
struct PageSignal {
    visible: bool,
    focused: bool,
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Copy)]
pub struct ShellState {
    pub vm: Signal<ShellVm>,
    pub history: Signal<NavHistory>,
    pub toasts: Signal<Vec<Toast>>,
    pub expanded: Signal<BTreeSet<ModuleId>>,
    pub quiz_feedback: Signal<BTreeMap<QuizId, QuizVerdict>>,
    pub exercise_reports: Signal<BTreeMap<LessonId, ExerciseReport>>,
    pub grading: Signal<bool>,
    ticker: Signal<Option<Task>>,
    code_save: Signal<Option<Task>>,
    toast_seq: Signal<u64>,
}

pub fn use_shell_state(ctx: &AppContext) -> ShellState {
    let initial = use_hook(|| ctx.snapshot());
    let history_start = initial.fragment.clone();
    let expanded_start: BTreeSet<ModuleId> = initial.module.into_iter().collect();
    ShellState {
        vm: use_signal(|| initial),
        history: use_signal(|| NavHistory::new(history_start)),
        toasts: use_signal(Vec::new),
        expanded: use_signal(|| expanded_start),
        quiz_feedback: use_signal(BTreeMap::new),
        exercise_reports: use_signal(BTreeMap::new),
        grading: use_signal(|| false),
        ticker: use_signal(|| None),
        code_save: use_signal(|| None),
        toast_seq: use_signal(|| 0),
    }
}

/// Handle given to every view.
#[derive(Clone, Copy)]
pub struct Shell {
    pub state: ShellState,
    tx: Coroutine<ShellMsg>,
}

impl Shell {
    #[must_use]
    pub fn new(state: ShellState, tx: Coroutine<ShellMsg>) -> Self {
        Self { state, tx }
    }

    pub fn send(&self, msg: ShellMsg) {
        self.tx.send(msg);
    }

    pub fn dispatch(&self, command: Command) {
        self.send(ShellMsg::Dispatch(command));
    }

    pub fn toggle_module(&self, module: ModuleId) {
        let mut expanded = self.state.expanded;
        let mut open = expanded.write();
        if !open.remove(&module) {
            open.insert(module);
        }
    }
}

#[must_use]
pub fn use_shell() -> Shell {
    use_context::<Shell>()
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

#[derive(Clone)]
pub struct Controller {
    ctx: AppContext,
    state: ShellState,
}

impl Controller {
    #[must_use]
    pub fn new(ctx: AppContext, state: ShellState) -> Self {
        Self { ctx, state }
    }

    /// Body of the shell coroutine.
    pub async fn run(self, mut rx: UnboundedReceiver<ShellMsg>) {
        let startup = self.ctx.take_startup_events();
        self.refresh().await;
        self.apply(startup);
        self.watch_page();
        self.load_catalog();
        self.flush_in_background();
        while let Some(msg) = rx.next().await {
            self.handle(msg).await;
        }
    }

    /// Run a server round trip off the message loop.
    fn in_background<F, Fut>(&self, request: F)
    where
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = ()> + 'static,
    {
        spawn(request(self.clone()));
    }

    async fn handle(&self, msg: ShellMsg) {
        match msg {
            ShellMsg::Dispatch(command) => self.dispatch(command).await,
            ShellMsg::Back => {
                let mut history = self.state.history;
                let target = history.write().back();
                if let Some(fragment) = target {
                    self.dispatch(Command::HashChanged(fragment)).await;
                }
            }
            ShellMsg::Forward => {
                let mut history = self.state.history;
                let target = history.write().forward();
                if let Some(fragment) = target {
                    self.dispatch(Command::HashChanged(fragment)).await;
                }
            }
            ShellMsg::AnswerQuiz { quiz, selected } => {
                self.in_background(move |this| async move { this.answer_quiz(quiz, selected).await });
            }
            ShellMsg::EditCode { lesson, code } => self.schedule_code_save(lesson, code),
            ShellMsg::SubmitExercise { code } => {
                self.in_background(move |this| async move { this.submit_exercise(code).await });
            }
            ShellMsg::ExportProgress => {
                self.in_background(move |this| async move { this.export_progress().await });
            }
            ShellMsg::ImportProgress(path) => {
                self.in_background(move |this| async move { this.import_progress(path).await });
            }
            ShellMsg::DismissToast(id) => self.dismiss(id),
        }
    }

    async fn dispatch(&self, command: Command) {
        let session = self.ctx.session();
        let (events, vm, has_writes) = {
            let mut session = session.lock().await;
            let events = session.dispatch(command).await;
            let player = session.player();
            (
                events,
                ShellVm::from_player(player),
                !player.pending_writes().is_empty(),
            )
        };
        self.set_vm(vm);
        self.apply(events);
        if has_writes {
            self.flush_in_background();
        }
    }

    async fn refresh(&self) {
        let session = self.ctx.session();
        let vm = ShellVm::from_player(session.lock().await.player());
        self.set_vm(vm);
    }

    fn set_vm(&self, vm: ShellVm) {
        let mut current = self.state.vm;
        if *current.peek() != vm {
            current.set(vm);
        }
    }

    fn apply(&self, events: Vec<Event>) {
        let mut history = self.state.history;
        let mut expanded = self.state.expanded;
        let mut feedback = self.state.quiz_feedback;
        let mut reports = self.state.exercise_reports;
        for event in events {
            match event {
                Event::UrlChanged(update) => {
                    debug!(fragment = %update.fragment, title = %update.title, "location updated");
                    history.write().push(&update.fragment);
                }
                Event::ModuleExpanded(module) => {
                    expanded.write().insert(module);
                }
                Event::TrackingStarted {
                    generation,
                    interval_secs,
                    ..
                } => self.start_ticker(generation, interval_secs),
                Event::TrackingStopped { .. } => self.stop_ticker(),
                Event::LessonCompleted(_) => {
                    self.notify(Notification::success("Lesson marked as complete."));
                }
                Event::QuizAnswered { quiz, verdict, .. } => {
                    feedback.write().insert(quiz, verdict);
                }
                Event::ExerciseGraded { lesson, report } => {
                    reports.write().insert(lesson, report);
                }
                Event::Notify(notification) => self.notify(notification),
                _ => {}
            }
        }
    }

    // ─── BACKGROUND TASKS ───

    fn start_ticker(&self, generation: u64, interval_secs: u64) {
        self.stop_ticker();
        let this = self.clone();
        let task = spawn(async move {
            let period = Duration::from_secs(interval_secs.max(1));
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                interval.tick().await;
                this.dispatch(Command::TrackerTick { generation }).await;
            }
        });
        let mut ticker = self.state.ticker;
        ticker.set(Some(task));
    }

    fn stop_ticker(&self) {
        let mut ticker = self.state.ticker;
        let running = ticker.write().take();
        if let Some(task) = running {
            task.cancel();
        }
    }

    fn flush_in_background(&self) {
        self.in_background(|this| async move {
            let events = this.ctx.session().flush_writes().await;
            if !events.is_empty() {
                this.refresh().await;
                this.apply(events);
            }
        });
    }

    fn load_catalog(&self) {
        self.in_background(|this| async move {
            match this.ctx.session().refresh_catalog().await {
                Ok(events) => {
                    this.refresh().await;
                    this.apply(events);
                }
                Err(err) => {
                    warn!(error = %err, "could not load the course catalog");
                    this.notify(Notification::error(
                        "Could not reach the course server. Showing progress saved on this device.",
                    ));
                }
            }
        });
    }

    fn watch_page(&self) {
        let this = self.clone();
        spawn(async move {
            let mut watcher = eval(PAGE_WATCH_SCRIPT);
            let mut last: Option<PageSignal> = None;
            while let Ok(signal) = watcher.recv::<PageSignal>().await {
                if last.is_none_or(|prev| prev.visible != signal.visible) {
                    this.dispatch(Command::VisibilityChanged(signal.visible))
                        .await;
                }
                if last.is_none_or(|prev| prev.focused != signal.focused) {
                    this.dispatch(Command::FocusChanged(signal.focused)).await;
                }
                last = Some(signal);
            }
            debug!("page watcher closed");
        });
    }

    fn schedule_code_save(&self, lesson: LessonId, code: String) {
        let mut pending = self.state.code_save;
        if let Some(task) = pending.write().take() {
            task.cancel();
        }
        let this = self.clone();
        let task = spawn(async move {
            tokio::time::sleep(CODE_SAVE_DEBOUNCE).await;
            this.dispatch(Command::ExerciseCodeEdited { lesson, code })
                .await;
        });
        pending.set(Some(task));
    }

    // ─── NOTIFICATIONS ───

    fn notify(&self, notification: Notification) {
        let mut seq = self.state.toast_seq;
        let id = *seq.peek() + 1;
        seq.set(id);
        let mut toasts = self.state.toasts;
        toasts.write().push(Toast { id, notification });

        let this = self.clone();
        spawn(async move {
            tokio::time::sleep(TOAST_LIFETIME).await;
            this.dismiss(id);
        });
    }

    fn dismiss(&self, id: u64) {
        let mut toasts = self.state.toasts;
        toasts.write().retain(|toast| toast.id != id);
    }

    // ─── USER-TRIGGERED REQUESTS ───

    async fn answer_quiz(&self, quiz: QuizId, selected: usize) {
        let session = self.ctx.session();
        if let Err(err) = session.begin_quiz(quiz).await {
            debug!(%quiz, error = %err, "quiz answer ignored");
            return;
        }
        // show the answer as being checked while the request is out
        self.refresh().await;

        let outcome = session.score_quiz(quiz, selected).await;
        self.refresh().await;
        match outcome {
            Ok(events) => self.apply(events),
            Err(err) => {
                self.notify(Notification::error(format!(
                    "Could not submit your answer: {err}"
                )));
            }
        }
    }

    async fn submit_exercise(&self, code: String) {
        let mut grading = self.state.grading;
        grading.set(true);
        let outcome = self.ctx.session().submit_exercise(code).await;
        grading.set(false);
        self.refresh().await;
        match outcome {
            Ok(events) => self.apply(events),
            Err(err) => {
                self.notify(Notification::error(format!("Error running tests: {err}")));
            }
        }
    }

    async fn export_progress(&self) {
        let session = self.ctx.session();
        let document = session.export_progress().await;
        let now = session.lock().await.player().clock().now();
        let text = match document {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "export failed");
                self.notify(Notification::error(format!("Export failed: {err}")));
                return;
            }
        };
        let path = self.ctx.export_dir().join(export_file_name(now));
        match tokio::fs::write(&path, text).await {
            Ok(()) => {
                info!(path = %path.display(), "progress exported");
                self.notify(Notification::success(format!(
                    "Progress exported to {}",
                    path.display()
                )));
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not write export file");
                self.notify(Notification::error(format!(
                    "Could not write {}: {err}",
                    path.display()
                )));
            }
        }
    }

    async fn import_progress(&self, path: PathBuf) {
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not read import file");
                self.notify(Notification::error(format!(
                    "Could not read {}: {err}",
                    path.display()
                )));
                return;
            }
        };

        let outcome = self.ctx.session().import_progress(&text).await;
        self.refresh().await;
        match outcome {
            Ok(events) => self.apply(events),
            Err(BackupError::Malformed(reason)) => {
                debug!(%reason, "rejected import file");
                self.notify(Notification::error(
                    "That file is not a valid progress backup.",
                ));
            }
            Err(err) => {
                self.notify(Notification::error(format!(
                    "Local progress merged, but the server import failed: {err}"
                )));
            }
        }
    }
}
