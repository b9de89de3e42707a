use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use course_core::Clock;
use course_core::model::{Catalog, LessonId, Module, QuizId};
use storage::repository::Storage;

use crate::api::{CourseApi, ExerciseReport, ProgressSummary, QuizVerdict};
use crate::backup::{export_document, parse_import};
use crate::config::PlayerConfig;
use crate::dashboard::ProgressOverview;
use crate::error::{ApiError, BackupError, ExerciseError, QuizError, SessionError};
use crate::outbox::{PendingWrite, deliver};
use crate::player::{Command, CoursePlayer, Event, Notification};

/// A `CoursePlayer` wired to a `CourseApi`.
///
/// Performs the request/response calls the player itself never waits on and
/// feeds their results back in as commands.
pub struct PlayerSession {
    player: CoursePlayer,
    api: Arc<dyn CourseApi>,
}

impl PlayerSession {
    #[must_use]
    pub fn new(player: CoursePlayer, api: Arc<dyn CourseApi>) -> Self {
        Self { player, api }
    }

    /// Restore local state and route the initial fragment. Nothing is fetched;
    /// a deep link waits in the player until the catalog arrives.
    pub async fn restore(
        storage: &Storage,
        api: Arc<dyn CourseApi>,
        config: &PlayerConfig,
        clock: Clock,
        initial_fragment: &str,
    ) -> (Self, Vec<Event>) {
        let player = CoursePlayer::restore(storage.local_store(), clock)
            .await
            .with_site_title(config.site_title.clone())
            .with_flush_interval(config.flush_interval_secs);
        let mut session = Self::new(player, api);
        let events = session
            .player
            .dispatch(Command::HashChanged(initial_fragment.to_string()))
            .await;
        (session, events)
    }

    /// `restore`, then load the catalog.
    ///
    /// A catalog failure is logged and leaves the session on Home with an
    /// empty course; `refresh_catalog` can be retried later.
    pub async fn start(
        storage: &Storage,
        api: Arc<dyn CourseApi>,
        config: &PlayerConfig,
        clock: Clock,
        initial_fragment: &str,
    ) -> (Self, Vec<Event>) {
        let (mut session, mut events) =
            Self::restore(storage, api, config, clock, initial_fragment).await;
        match session.refresh_catalog().await {
            Ok(more) => events.extend(more),
            Err(err) => warn!(error = %err, "could not load the course catalog"),
        }
        (session, events)
    }

    /// Like `restore`, backed by a `SQLite` local store.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the database cannot be opened or migrated.
    pub async fn open_sqlite(
        db_url: &str,
        api: Arc<dyn CourseApi>,
        config: &PlayerConfig,
        clock: Clock,
        initial_fragment: &str,
    ) -> Result<(Self, Vec<Event>), SessionError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::restore(&storage, api, config, clock, initial_fragment).await)
    }

    #[must_use]
    pub fn player(&self) -> &CoursePlayer {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut CoursePlayer {
        &mut self.player
    }

    #[must_use]
    pub fn api(&self) -> Arc<dyn CourseApi> {
        Arc::clone(&self.api)
    }

    pub async fn dispatch(&mut self, command: Command) -> Vec<Event> {
        self.player.dispatch(command).await
    }

    //
    // ─── REQUEST STEPS ─────────────────────────────────────────────────────────
    //
    // Each server round trip is split into the part that reads or updates the
    // player and the request itself, so `SharedSession` can run the request
    // with its lock released.

    /// Fold a fetched module list into the player.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the fetch failed; the current catalog is
    /// kept.
    pub async fn apply_catalog(
        &mut self,
        fetched: Result<Vec<Module>, ApiError>,
    ) -> Result<Vec<Event>, SessionError> {
        let modules = fetched?;
        Ok(self
            .player
            .dispatch(Command::CatalogLoaded(Catalog::new(modules)))
            .await)
    }

    /// Store a verdict for a quiz reserved with `CoursePlayer::begin_quiz`, or
    /// release the reservation if the request failed.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Api` when the request failed. Nothing is stored.
    pub async fn apply_quiz_verdict(
        &mut self,
        quiz: QuizId,
        selected_answer: usize,
        verdict: Result<QuizVerdict, ApiError>,
    ) -> Result<Vec<Event>, QuizError> {
        match verdict {
            Ok(verdict) => Ok(self
                .player
                .dispatch(Command::QuizScored {
                    quiz,
                    selected_answer,
                    verdict,
                })
                .await),
            Err(err) => {
                self.player.abort_quiz(quiz);
                warn!(%quiz, error = %err, "quiz submission failed");
                Err(err.into())
            }
        }
    }

    /// Save `code` for the open exercise lesson and return that lesson.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` if no lesson with an exercise is open.
    pub async fn prepare_exercise(
        &mut self,
        code: &str,
    ) -> Result<(LessonId, Vec<Event>), ExerciseError> {
        let (_, lesson) = self.player.current_lesson().ok_or(ExerciseError::NoLesson)?;
        if !lesson.has_exercise {
            return Err(ExerciseError::NoExercise(lesson.id));
        }
        let lesson = lesson.id;
        let events = self
            .player
            .dispatch(Command::ExerciseCodeEdited {
                lesson,
                code: code.to_string(),
            })
            .await;
        Ok((lesson, events))
    }

    /// # Errors
    ///
    /// Returns `ExerciseError::Api` when the grading request failed.
    pub async fn apply_exercise_report(
        &mut self,
        lesson: LessonId,
        report: Result<ExerciseReport, ApiError>,
    ) -> Result<Vec<Event>, ExerciseError> {
        let report =
            report.inspect_err(|err| warn!(%lesson, error = %err, "exercise grading failed"))?;
        Ok(self
            .player
            .dispatch(Command::ExerciseGraded { lesson, report })
            .await)
    }

    /// Server summary when it arrived, otherwise the local computation.
    #[must_use]
    pub fn overview_from(&self, summary: Result<ProgressSummary, ApiError>) -> ProgressOverview {
        match summary {
            Ok(summary) => ProgressOverview::from_server(summary),
            Err(err) => {
                warn!(error = %err, "progress summary unavailable, using local data");
                self.player.local_overview()
            }
        }
    }

    /// Pretty JSON of the server export plus the local progress map.
    ///
    /// # Errors
    ///
    /// Returns `BackupError` if the server export could not be fetched.
    pub fn export_from(&self, server: Result<Value, ApiError>) -> Result<String, BackupError> {
        export_document(server?, self.player.progress())
    }

    /// Merge the local part of a backup. Returns the document to post to the
    /// server, if it carries server progress.
    ///
    /// # Errors
    ///
    /// Returns `BackupError::Malformed` for bad JSON; nothing changes.
    pub async fn merge_import(
        &mut self,
        text: &str,
    ) -> Result<(Option<Value>, Vec<Event>), BackupError> {
        let plan = parse_import(text)?;
        let mut events = Vec::new();
        if let Some(local) = plan.local_progress {
            events.extend(
                self.player
                    .dispatch(Command::ImportLocalProgress(local))
                    .await,
            );
        }
        Ok((plan.server_blob, events))
    }

    //
    // ─── ROUND TRIPS ───────────────────────────────────────────────────────────
    //

    /// Fetch the module list and fold the server flags in.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the list cannot be fetched; the current
    /// catalog is kept.
    pub async fn refresh_catalog(&mut self) -> Result<Vec<Event>, SessionError> {
        let fetched = self.api.list_modules().await;
        self.apply_catalog(fetched).await
    }

    /// Deliver queued best-effort writes. Refreshes the catalog when a
    /// completion reached the server.
    pub async fn flush_writes(&mut self) -> Vec<Event> {
        let writes = self.player.take_writes();
        if !deliver_and_check(self.api.as_ref(), writes).await {
            return Vec::new();
        }
        match self.refresh_catalog().await {
            Ok(events) => events,
            Err(err) => {
                warn!(error = %err, "catalog refresh after completion failed");
                Vec::new()
            }
        }
    }

    /// Score an answer on the server and store it once.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the quiz cannot be answered now or the request
    /// fails. A failed request stores nothing.
    pub async fn answer_quiz(
        &mut self,
        quiz: QuizId,
        selected_answer: usize,
    ) -> Result<Vec<Event>, QuizError> {
        self.player.begin_quiz(quiz)?;
        let verdict = self.api.submit_quiz(quiz, selected_answer).await;
        self.apply_quiz_verdict(quiz, selected_answer, verdict).await
    }

    /// Save and grade the exercise of the open lesson.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` if no lesson with an exercise is open or the
    /// grading request fails. The code is saved either way.
    pub async fn submit_exercise(&mut self, code: String) -> Result<Vec<Event>, ExerciseError> {
        let (lesson, mut events) = self.prepare_exercise(&code).await?;
        let report = self.api.submit_exercise(lesson, &code).await;
        events.extend(self.apply_exercise_report(lesson, report).await?);
        Ok(events)
    }

    pub async fn progress_overview(&self) -> ProgressOverview {
        let summary = self.api.progress_summary().await;
        self.overview_from(summary)
    }

    /// # Errors
    ///
    /// Returns `BackupError` if the server export cannot be fetched.
    pub async fn export_progress(&self) -> Result<String, BackupError> {
        let server = self.api.export_progress().await;
        self.export_from(server)
    }

    /// Merge a backup document into local progress and post its server part.
    ///
    /// # Errors
    ///
    /// Returns `BackupError::Malformed` (nothing changes) for bad JSON, or
    /// `BackupError::Api` if the server import fails after the local merge.
    pub async fn import_progress(&mut self, text: &str) -> Result<Vec<Event>, BackupError> {
        let (server_blob, mut events) = self.merge_import(text).await?;
        if let Some(blob) = server_blob {
            self.api.import_progress(&blob).await?;
        }
        match self.refresh_catalog().await {
            Ok(more) => events.extend(more),
            Err(err) => warn!(error = %err, "catalog refresh after import failed"),
        }
        events.push(imported());
        Ok(events)
    }

    /// Stop tracking, flush time, and deliver what is still queued.
    pub async fn shutdown(&mut self) -> Vec<Event> {
        let mut events = self.player.dispatch(Command::Shutdown).await;
        events.extend(self.flush_writes().await);
        events
    }
}

/// Deliver `writes`; true when a completion reached the server and the
/// catalog should be refreshed.
pub(crate) async fn deliver_and_check(api: &dyn CourseApi, writes: Vec<PendingWrite>) -> bool {
    if writes.is_empty() {
        return false;
    }
    let report = deliver(api, writes).await;
    debug!(
        delivered = report.delivered,
        failed = report.failed,
        "outbox drained"
    );
    report.completions_delivered > 0
}

pub(crate) fn imported() -> Event {
    Event::Notify(Notification::success("Progress imported."))
}
