//! A `PlayerSession` shared by the shell and its background tasks.
//!
//! The lock guards player state only. Every server request runs with it
//! released, so navigation, tracker ticks, and visibility changes go through
//! while a request is still out.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::warn;

use course_core::model::QuizId;

use crate::api::CourseApi;
use crate::dashboard::ProgressOverview;
use crate::error::{BackupError, ExerciseError, QuizError, SessionError};
use crate::player::{Command, Event};
use crate::session::{PlayerSession, deliver_and_check, imported};

#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<PlayerSession>>,
    api: Arc<dyn CourseApi>,
}

impl SharedSession {
    #[must_use]
    pub fn new(session: PlayerSession) -> Self {
        let api = session.api();
        Self {
            inner: Arc::new(Mutex::new(session)),
            api,
        }
    }

    /// Hold only for player reads and updates, never across a request.
    pub async fn lock(&self) -> MutexGuard<'_, PlayerSession> {
        self.inner.lock().await
    }

    #[must_use]
    pub fn try_lock(&self) -> Option<MutexGuard<'_, PlayerSession>> {
        self.inner.try_lock().ok()
    }

    pub async fn dispatch(&self, command: Command) -> Vec<Event> {
        self.inner.lock().await.dispatch(command).await
    }

    /// # Errors
    ///
    /// Returns `SessionError::Api` if the list cannot be fetched.
    pub async fn refresh_catalog(&self) -> Result<Vec<Event>, SessionError> {
        let fetched = self.api.list_modules().await;
        self.inner.lock().await.apply_catalog(fetched).await
    }

    /// Deliver queued writes; refreshes the catalog after a delivered
    /// completion.
    pub async fn flush_writes(&self) -> Vec<Event> {
        let writes = self.inner.lock().await.player_mut().take_writes();
        if !deliver_and_check(self.api.as_ref(), writes).await {
            return Vec::new();
        }
        self.refresh_catalog().await.unwrap_or_else(|err| {
            warn!(error = %err, "catalog refresh after completion failed");
            Vec::new()
        })
    }

    /// Reserve `quiz` so the view can show it as being checked.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the quiz is unknown, answered, or in flight.
    pub async fn begin_quiz(&self, quiz: QuizId) -> Result<(), QuizError> {
        self.inner.lock().await.player_mut().begin_quiz(quiz)
    }

    /// Send a reserved answer and store the verdict.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Api` if the request fails; the reservation is
    /// released and nothing is stored.
    pub async fn score_quiz(
        &self,
        quiz: QuizId,
        selected_answer: usize,
    ) -> Result<Vec<Event>, QuizError> {
        let verdict = self.api.submit_quiz(quiz, selected_answer).await;
        self.inner
            .lock()
            .await
            .apply_quiz_verdict(quiz, selected_answer, verdict)
            .await
    }

    /// # Errors
    ///
    /// See `begin_quiz` and `score_quiz`.
    pub async fn answer_quiz(
        &self,
        quiz: QuizId,
        selected_answer: usize,
    ) -> Result<Vec<Event>, QuizError> {
        self.begin_quiz(quiz).await?;
        self.score_quiz(quiz, selected_answer).await
    }

    /// # Errors
    ///
    /// Returns `ExerciseError` if no exercise lesson is open or grading
    /// fails. The code is saved either way.
    pub async fn submit_exercise(&self, code: String) -> Result<Vec<Event>, ExerciseError> {
        let (lesson, mut events) = self.inner.lock().await.prepare_exercise(&code).await?;
        let report = self.api.submit_exercise(lesson, &code).await;
        events.extend(
            self.inner
                .lock()
                .await
                .apply_exercise_report(lesson, report)
                .await?,
        );
        Ok(events)
    }

    pub async fn progress_overview(&self) -> ProgressOverview {
        let summary = self.api.progress_summary().await;
        self.inner.lock().await.overview_from(summary)
    }

    /// # Errors
    ///
    /// Returns `BackupError` if the server export cannot be fetched.
    pub async fn export_progress(&self) -> Result<String, BackupError> {
        let server = self.api.export_progress().await;
        self.inner.lock().await.export_from(server)
    }

    /// # Errors
    ///
    /// Returns `BackupError::Malformed` (nothing changes) for bad JSON, or
    /// `BackupError::Api` if the server import fails after the local merge.
    pub async fn import_progress(&self, text: &str) -> Result<Vec<Event>, BackupError> {
        let (server_blob, mut events) = self.inner.lock().await.merge_import(text).await?;
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
}
