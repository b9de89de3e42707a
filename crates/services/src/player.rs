//! The course player: one state object driven through one dispatch point.
//!
//! `dispatch` runs each command to completion before the next. It awaits the
//! local store only; server writes go to the outbox and request/response calls
//! are made by `PlayerSession`, whose results come back in as commands.

use tracing::{debug, info, warn};

use course_core::model::{
    Catalog, ExerciseCodes, Lesson, LessonId, Module, ModuleId, NavigationState, ProgressMap,
    QuizId, QuizResult, ViewKind,
};
use course_core::navigator::{Direction, LessonTarget, Navigator};
use course_core::reconcile::Reconciler;
use course_core::route::{Route, route};
use course_core::tracker::{Flush, StartOutcome, TimeTracker};
use course_core::{Clock, Error, NotFound};
use storage::local_store::{LocalSnapshot, LocalStore};

use crate::api::{ExerciseReport, QuizVerdict};
use crate::config::DEFAULT_SITE_TITLE;
use crate::dashboard::ProgressOverview;
use crate::error::QuizError;
use crate::exercise;
use crate::outbox::{Outbox, PendingWrite};
use crate::quiz::QuizAnswers;
use crate::router::{UrlRouter, UrlUpdate};

//
// ─── COMMANDS & EVENTS ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// In-app navigation (links, breadcrumbs, sidebar).
    NavigateTo(Route),
    /// The host reports a fragment change (startup, back/forward, typed URL).
    HashChanged(String),
    StartCourse,
    StartModule(ModuleId),
    ContinueModule(ModuleId),
    OpenModule(ModuleId),
    GotoLesson(LessonId),
    Step(Direction),
    CompleteLesson(LessonId),
    VisibilityChanged(bool),
    FocusChanged(bool),
    TrackerTick { generation: u64 },
    CatalogLoaded(Catalog),
    QuizScored {
        quiz: QuizId,
        selected_answer: usize,
        verdict: QuizVerdict,
    },
    ExerciseCodeEdited { lesson: LessonId, code: String },
    ExerciseGraded {
        lesson: LessonId,
        report: ExerciseReport,
    },
    SetDarkMode(bool),
    ResetProgress,
    ImportLocalProgress(ProgressMap),
    /// Stop tracking and flush before the window goes away.
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// Non-blocking toast shown by the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    UrlChanged(UrlUpdate),
    ViewChanged(NavigationState),
    /// The sidebar should expand this module.
    ModuleExpanded(ModuleId),
    TrackingStarted {
        lesson: LessonId,
        generation: u64,
        interval_secs: u64,
    },
    TrackingStopped { lesson: LessonId },
    TimeFlushed(Flush),
    LessonCompleted(LessonId),
    /// Completion data changed in bulk (catalog reload, import, reset).
    ProgressChanged,
    QuizAnswered {
        quiz: QuizId,
        result: QuizResult,
        verdict: QuizVerdict,
    },
    ExerciseGraded {
        lesson: LessonId,
        report: ExerciseReport,
    },
    ThemeChanged(bool),
    Notify(Notification),
}

//
// ─── PLAYER ────────────────────────────────────────────────────────────────────
//

pub struct CoursePlayer {
    clock: Clock,
    store: LocalStore,
    catalog: Catalog,
    catalog_loaded: bool,
    pending_fragment: Option<String>,
    state: NavigationState,
    router: UrlRouter,
    tracker: TimeTracker,
    progress: ProgressMap,
    quizzes: QuizAnswers,
    exercise_codes: ExerciseCodes,
    dark_mode: bool,
    visible: bool,
    focused: bool,
    expanded_module: Option<ModuleId>,
    outbox: Outbox,
}

impl CoursePlayer {
    #[must_use]
    pub fn new(store: LocalStore, snapshot: LocalSnapshot, clock: Clock) -> Self {
        Self {
            clock,
            store,
            catalog: Catalog::default(),
            catalog_loaded: false,
            pending_fragment: None,
            state: NavigationState::home(),
            router: UrlRouter::new(DEFAULT_SITE_TITLE),
            tracker: TimeTracker::new(),
            progress: snapshot.progress,
            quizzes: QuizAnswers::new(snapshot.quiz_results),
            exercise_codes: snapshot.exercise_codes,
            dark_mode: snapshot.dark_mode,
            visible: true,
            focused: true,
            expanded_module: None,
            outbox: Outbox::new(),
        }
    }

    /// Load the persisted snapshot and build a player around it.
    pub async fn restore(store: LocalStore, clock: Clock) -> Self {
        let snapshot = store.load_snapshot().await;
        Self::new(store, snapshot, clock)
    }

    #[must_use]
    pub fn with_site_title(mut self, site_title: impl Into<String>) -> Self {
        self.router = UrlRouter::new(site_title);
        self
    }

    #[must_use]
    pub fn with_flush_interval(mut self, secs: u64) -> Self {
        self.tracker = TimeTracker::new().with_flush_interval(secs);
        self
    }

    pub async fn dispatch(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        match command {
            Command::NavigateTo(target) => {
                let resolution = target.resolve(&self.catalog);
                self.enter(resolution.state, resolution.diagnostic, &mut events)
                    .await;
            }
            Command::HashChanged(fragment) => self.on_hash_changed(fragment, &mut events).await,
            Command::StartCourse => {
                let target = self.navigator().start_course();
                match target {
                    Some(target) => self.enter_target(target, &mut events).await,
                    None => warn!("course has no lessons to start"),
                }
            }
            Command::StartModule(module) => {
                let target = self.navigator().start(module);
                self.enter_found(target, &mut events).await;
            }
            Command::ContinueModule(module) => {
                let target = self.navigator().continue_or_start(module);
                self.enter_found(target, &mut events).await;
            }
            Command::OpenModule(module) => {
                if self.catalog.module(module).is_some() {
                    self.enter(NavigationState::module_overview(module), None, &mut events)
                        .await;
                } else {
                    warn!(error = %NotFound::Module(module), "cannot open module");
                }
            }
            Command::GotoLesson(lesson) => {
                let target = self.navigator().goto(lesson);
                self.enter_found(target, &mut events).await;
            }
            Command::Step(direction) => self.step(direction, &mut events).await,
            Command::CompleteLesson(lesson) => self.complete(lesson, &mut events).await,
            Command::VisibilityChanged(visible) => {
                self.visible = visible;
                self.sync_tracking(&mut events).await;
            }
            Command::FocusChanged(focused) => {
                self.focused = focused;
                self.sync_tracking(&mut events).await;
            }
            Command::TrackerTick { generation } => {
                if let Some(flush) = self.tracker.tick(generation, self.clock.now()) {
                    self.record_flush(flush, &mut events).await;
                }
            }
            Command::CatalogLoaded(catalog) => self.on_catalog(catalog, &mut events).await,
            Command::QuizScored {
                quiz,
                selected_answer,
                verdict,
            } => {
                if let Some(result) = self.quizzes.finish(quiz, selected_answer, &verdict) {
                    self.persist_quiz_results().await;
                    events.push(Event::QuizAnswered {
                        quiz,
                        result,
                        verdict,
                    });
                }
            }
            Command::ExerciseCodeEdited { lesson, code } => {
                self.exercise_codes.set(lesson, code);
                if let Err(err) = self.store.save_exercise_codes(&self.exercise_codes).await {
                    warn!(%lesson, error = %err, "failed to save exercise code");
                }
            }
            Command::ExerciseGraded { lesson, report } => {
                self.on_exercise_graded(lesson, report, &mut events).await;
            }
            Command::SetDarkMode(enabled) => {
                self.dark_mode = enabled;
                if let Err(err) = self.store.save_dark_mode(enabled).await {
                    warn!(error = %err, "failed to save theme flag");
                }
                events.push(Event::ThemeChanged(enabled));
            }
            Command::ResetProgress => {
                self.progress.clear();
                self.persist_progress().await;
                info!("local progress reset");
                events.push(Event::ProgressChanged);
                events.push(Event::Notify(Notification::info("Local progress has been reset.")));
            }
            Command::ImportLocalProgress(imported) => {
                self.progress.merge_from(&imported);
                self.persist_progress().await;
                events.push(Event::ProgressChanged);
            }
            Command::Shutdown => self.stop_tracking(&mut events).await,
        }
        events
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn state(&self) -> NavigationState {
        self.state
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn is_catalog_loaded(&self) -> bool {
        self.catalog_loaded
    }

    #[must_use]
    pub fn fragment(&self) -> &str {
        self.router.fragment()
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.router.title()
    }

    #[must_use]
    pub fn site_title(&self) -> &str {
        self.router.site_title()
    }

    #[must_use]
    pub fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(&self.catalog, &self.progress)
    }

    #[must_use]
    pub fn navigator(&self) -> Navigator<'_> {
        Navigator::new(&self.catalog, &self.progress)
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressMap {
        &self.progress
    }

    #[must_use]
    pub fn quiz_answers(&self) -> &QuizAnswers {
        &self.quizzes
    }

    #[must_use]
    pub fn quiz_result(&self, quiz: QuizId) -> Option<&QuizResult> {
        self.quizzes.result(quiz)
    }

    #[must_use]
    pub fn current_module(&self) -> Option<&Module> {
        self.state.module().and_then(|id| self.catalog.module(id))
    }

    #[must_use]
    pub fn current_lesson(&self) -> Option<(&Module, &Lesson)> {
        let lesson = self.state.active_lesson()?;
        self.catalog.find_lesson(lesson)
    }

    #[must_use]
    pub fn exercise_code(&self, lesson: &Lesson) -> String {
        exercise::editor_code(lesson, &self.exercise_codes)
    }

    /// Whether the prev/next control is enabled for the current view.
    #[must_use]
    pub fn can_step(&self, direction: Direction) -> bool {
        match self.state.view() {
            ViewKind::Lesson => self
                .state
                .lesson_id()
                .is_some_and(|lesson| self.navigator().can_step(lesson, direction)),
            ViewKind::ModuleOverview => {
                direction == Direction::Next
                    && self
                        .current_module()
                        .is_some_and(|module| module.first_lesson().is_some())
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    #[must_use]
    pub fn tracker(&self) -> &TimeTracker {
        &self.tracker
    }

    #[must_use]
    pub fn local_overview(&self) -> ProgressOverview {
        ProgressOverview::from_local(&self.reconciler())
    }

    #[must_use]
    pub fn pending_writes(&self) -> &Outbox {
        &self.outbox
    }

    /// Hand queued server writes to the caller for delivery.
    pub fn take_writes(&mut self) -> Vec<PendingWrite> {
        self.outbox.drain()
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// Reserve a quiz for scoring before the request goes out.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the quiz is unknown, answered, or in flight.
    pub fn begin_quiz(&mut self, quiz: QuizId) -> Result<(), QuizError> {
        self.quizzes.begin(quiz, &self.catalog)
    }

    pub fn abort_quiz(&mut self, quiz: QuizId) {
        self.quizzes.abort(quiz);
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    async fn on_hash_changed(&mut self, fragment: String, events: &mut Vec<Event>) {
        if !self.catalog_loaded {
            // routed once the catalog arrives
            self.router.observe(&fragment);
            self.pending_fragment = Some(fragment);
            return;
        }
        if self.router.is_echo(&fragment) {
            debug!(%fragment, "ignoring echo of our own fragment");
            return;
        }
        self.router.observe(&fragment);
        let resolution = route(&fragment, &self.catalog);
        self.enter(resolution.state, resolution.diagnostic, events)
            .await;
    }

    async fn on_catalog(&mut self, catalog: Catalog, events: &mut Vec<Event>) {
        info!(
            modules = catalog.modules().len(),
            lessons = catalog.lesson_count(),
            "catalog loaded"
        );
        self.catalog = catalog;
        self.catalog_loaded = true;
        let fragment = self
            .pending_fragment
            .take()
            .unwrap_or_else(|| self.router.fragment().to_string());
        let resolution = route(&fragment, &self.catalog);
        self.enter(resolution.state, resolution.diagnostic, events)
            .await;
        events.push(Event::ProgressChanged);
    }

    async fn enter_found(
        &mut self,
        target: Result<LessonTarget, NotFound>,
        events: &mut Vec<Event>,
    ) {
        match target {
            Ok(target) => self.enter_target(target, events).await,
            Err(err) => warn!(error = %err, "navigation target unavailable, staying put"),
        }
    }

    async fn enter_target(&mut self, target: LessonTarget, events: &mut Vec<Event>) {
        let next = NavigationState::lesson(target.module, target.lesson);
        self.enter(next, None, events).await;
    }

    async fn step(&mut self, direction: Direction, events: &mut Vec<Event>) {
        match self.state.view() {
            ViewKind::Lesson => {
                let Some(from) = self.state.lesson_id() else {
                    return;
                };
                let target = self.navigator().step(from, direction);
                match target {
                    Some(target) => self.enter_target(target, events).await,
                    None => debug!(lesson = %from, ?direction, "already at the course boundary"),
                }
            }
            ViewKind::ModuleOverview if direction == Direction::Next => {
                if let Some(module) = self.state.module() {
                    let target = self.navigator().start(module);
                    self.enter_found(target, events).await;
                }
            }
            _ => {}
        }
    }

    /// Single place where the navigation state changes.
    async fn enter(
        &mut self,
        next: NavigationState,
        diagnostic: Option<Error>,
        events: &mut Vec<Event>,
    ) {
        if let Some(err) = diagnostic {
            warn!(error = %err, "route fell back to the nearest valid view");
        }
        if next != self.state {
            self.state = next;
            events.push(Event::ViewChanged(next));
        }
        if next.is_lesson() {
            if let Some(module) = next.module() {
                if self.expanded_module != Some(module) {
                    self.expanded_module = Some(module);
                    events.push(Event::ModuleExpanded(module));
                }
            }
        }
        self.sync_tracking(events).await;
        if let Some(update) = self.router.push(&self.state, &self.catalog) {
            events.push(Event::UrlChanged(update));
        }
    }

    /// Track the active lesson only while the window is visible and focused.
    async fn sync_tracking(&mut self, events: &mut Vec<Event>) {
        let wanted = self
            .state
            .active_lesson()
            .filter(|_| self.visible && self.focused);
        let Some(lesson) = wanted else {
            self.stop_tracking(events).await;
            return;
        };

        let previous_lesson = self.tracker.lesson();
        match self.tracker.start(lesson, self.clock.now()) {
            StartOutcome::AlreadyTracking => {}
            StartOutcome::Started {
                generation,
                previous,
            } => {
                if let Some(stopped) = previous_lesson {
                    events.push(Event::TrackingStopped { lesson: stopped });
                }
                if let Some(flush) = previous {
                    self.record_flush(flush, events).await;
                }
                debug!(%lesson, generation, "tracking started");
                events.push(Event::TrackingStarted {
                    lesson,
                    generation,
                    interval_secs: self.tracker.flush_interval_secs(),
                });
            }
        }
    }

    async fn stop_tracking(&mut self, events: &mut Vec<Event>) {
        let Some(lesson) = self.tracker.lesson() else {
            return;
        };
        let flush = self.tracker.stop(self.clock.now());
        debug!(%lesson, "tracking stopped");
        events.push(Event::TrackingStopped { lesson });
        if let Some(flush) = flush {
            self.record_flush(flush, events).await;
        }
    }

    async fn record_flush(&mut self, flush: Flush, events: &mut Vec<Event>) {
        self.progress.add_time(flush.lesson, flush.seconds);
        self.persist_progress().await;
        self.outbox.push(PendingWrite::TrackTime {
            lesson: flush.lesson,
            seconds: flush.seconds,
        });
        events.push(Event::TimeFlushed(flush));
    }

    /// Optimistic: the local flag is set at once and never rolled back.
    async fn complete(&mut self, lesson: LessonId, events: &mut Vec<Event>) {
        let Some((_, found)) = self.catalog.find_lesson(lesson) else {
            warn!(error = %NotFound::Lesson(lesson), "cannot complete lesson");
            return;
        };
        let server_knows = found.is_completed;
        if self.progress.mark_completed(lesson) {
            self.persist_progress().await;
            events.push(Event::LessonCompleted(lesson));
        }
        if !server_knows {
            self.outbox.push(PendingWrite::Complete(lesson));
        }
    }

    async fn on_exercise_graded(
        &mut self,
        lesson: LessonId,
        report: ExerciseReport,
        events: &mut Vec<Event>,
    ) {
        let notification = if report.all_passed {
            self.progress.mark_exercise_completed(lesson);
            self.persist_progress().await;
            Notification::success("All tests passed.")
        } else {
            Notification::error(format!(
                "{} of {} tests passed.",
                report.passed_count(),
                report.results.len()
            ))
        };
        events.push(Event::ExerciseGraded { lesson, report });
        events.push(Event::Notify(notification));
    }

    async fn persist_progress(&self) {
        if let Err(err) = self.store.save_progress(&self.progress).await {
            warn!(error = %err, "failed to persist local progress");
        }
    }

    async fn persist_quiz_results(&self) {
        if let Err(err) = self.store.save_quiz_results(self.quizzes.results()).await {
            warn!(error = %err, "failed to persist quiz results");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::time::fixed_clock;
    use serde_json::json;
    use storage::repository::Storage;

    fn catalog() -> Catalog {
        serde_json::from_value(json!([
            {"id": 1, "slug": "basics", "title": "Basics", "lessons": [
                {"id": 10, "slug": "setup", "title": "Setup"},
                {"id": 11, "slug": "models", "title": "Models"}
            ]},
            {"id": 2, "slug": "views", "title": "Views", "lessons": [
                {"id": 20, "slug": "urls", "title": "URLs"}
            ]}
        ]))
        .unwrap()
    }

    async fn loaded_player(fragment: &str) -> (CoursePlayer, Vec<Event>) {
        let storage = Storage::in_memory();
        let mut player = CoursePlayer::restore(storage.local_store(), fixed_clock())
            .await
            .with_site_title("Course");
        player.dispatch(Command::HashChanged(fragment.into())).await;
        let events = player.dispatch(Command::CatalogLoaded(catalog())).await;
        (player, events)
    }

    fn started(events: &[Event]) -> usize {
        events
            .iter()
            .filter(|event| matches!(event, Event::TrackingStarted { .. }))
            .count()
    }

    #[tokio::test]
    async fn deep_link_waits_for_catalog() {
        let (player, events) = loaded_player("#/module/basics/lesson/models").await;
        assert_eq!(
            player.state(),
            NavigationState::lesson(ModuleId::new(1), LessonId::new(11))
        );
        assert_eq!(started(&events), 1);
        assert!(events.contains(&Event::ModuleExpanded(ModuleId::new(1))));
        assert_eq!(player.title(), "Models - Basics");
        // the host already shows this fragment; only the title is pushed
        assert!(events.contains(&Event::UrlChanged(UrlUpdate {
            fragment: "/module/basics/lesson/models".into(),
            title: "Models - Basics".into(),
        })));
    }

    #[tokio::test]
    async fn rerouting_same_fragment_is_idempotent() {
        let (mut player, _) = loaded_player("#/module/basics/lesson/setup").await;
        let events = player
            .dispatch(Command::NavigateTo(Route::Lesson {
                module: "basics".into(),
                lesson: "setup".into(),
            }))
            .await;
        assert!(events.is_empty());
        let echo = player
            .dispatch(Command::HashChanged("#/module/basics/lesson/setup".into()))
            .await;
        assert!(echo.is_empty());
    }

    #[tokio::test]
    async fn unknown_lesson_falls_back_to_overview() {
        let (player, events) = loaded_player("#/module/basics/lesson/nope").await;
        assert_eq!(player.state(), NavigationState::module_overview(ModuleId::new(1)));
        assert!(events.contains(&Event::UrlChanged(UrlUpdate {
            fragment: "/module/basics".into(),
            title: "Basics - Course".into(),
        })));
        assert_eq!(started(&events), 0);
    }

    #[tokio::test]
    async fn hiding_flushes_and_showing_restarts() {
        let (mut player, _) = loaded_player("#/module/basics/lesson/setup").await;
        player.clock_mut().advance_secs(12);
        let hidden = player.dispatch(Command::VisibilityChanged(false)).await;
        assert!(hidden.contains(&Event::TimeFlushed(Flush {
            lesson: LessonId::new(10),
            seconds: 12
        })));
        assert!(!player.tracker().is_tracking());

        player.clock_mut().advance_secs(100);
        let shown = player.dispatch(Command::VisibilityChanged(true)).await;
        assert_eq!(started(&shown), 1);
        assert!(!shown.iter().any(|e| matches!(e, Event::TimeFlushed(_))));
        assert_eq!(player.progress().get(LessonId::new(10)).unwrap().time_spent(), 12);
    }

    #[tokio::test]
    async fn completion_is_optimistic_and_queued() {
        let (mut player, _) = loaded_player("").await;
        let events = player.dispatch(Command::CompleteLesson(LessonId::new(10))).await;
        assert!(events.contains(&Event::LessonCompleted(LessonId::new(10))));
        assert!(player.reconciler().lesson_completed(LessonId::new(10)));
        assert_eq!(
            player.take_writes(),
            vec![PendingWrite::Complete(LessonId::new(10))]
        );
    }

    #[tokio::test]
    async fn step_from_overview_opens_first_lesson() {
        let (mut player, _) = loaded_player("#/module/views").await;
        assert!(player.can_step(Direction::Next));
        assert!(!player.can_step(Direction::Prev));
        player.dispatch(Command::Step(Direction::Next)).await;
        assert_eq!(player.state().active_lesson(), Some(LessonId::new(20)));
    }

    #[tokio::test]
    async fn theme_flag_persists() {
        let storage = Storage::in_memory();
        let mut player = CoursePlayer::restore(storage.local_store(), fixed_clock()).await;
        let events = player.dispatch(Command::SetDarkMode(true)).await;
        assert_eq!(events, vec![Event::ThemeChanged(true)]);

        let reloaded = CoursePlayer::restore(storage.local_store(), fixed_clock()).await;
        assert!(reloaded.dark_mode());
    }
}
