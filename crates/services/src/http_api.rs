use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{COOKIE, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use course_core::model::{LessonId, Module, QuizId};

use crate::api::{CourseApi, ExerciseReport, ProgressSummary, QuizVerdict};
use crate::config::ApiConfig;
use crate::error::ApiError;

const CSRF_HEADER: &str = "X-CSRFToken";

/// `CourseApi` over HTTP with JSON bodies.
#[derive(Clone)]
pub struct HttpCourseApi {
    client: Client,
    config: ApiConfig,
}

impl HttpCourseApi {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn with_session(&self, request: RequestBuilder) -> RequestBuilder {
        match self
            .config
            .session_cookie
            .as_deref()
            .and_then(|cookie| HeaderValue::from_str(cookie).ok())
        {
            Some(cookie) => request.header(COOKIE, cookie),
            None => request,
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs.max(1))
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.with_session(self.client.get(self.url(path)))
            .timeout(self.timeout())
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let request = self
            .with_session(self.client.post(self.url(path)))
            .timeout(self.timeout());
        match self.config.csrf_token.as_deref() {
            Some(token) => request.header(CSRF_HEADER, token),
            None => request,
        }
    }

    async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!(%status, url = %response.url(), "course api returned an error status");
            return Err(ApiError::HttpStatus(status));
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::send(request).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        Self::send_json(self.post(path).json(body)).await
    }
}

#[derive(Debug, Serialize)]
struct TrackTimeRequest {
    time_spent_seconds: u64,
}

#[derive(Debug, Serialize)]
struct QuizRequest {
    quiz: QuizId,
    selected_answer: usize,
}

#[derive(Debug, Serialize)]
struct ExerciseRequest<'a> {
    lesson_id: LessonId,
    code: &'a str,
}

#[async_trait]
impl CourseApi for HttpCourseApi {
    async fn list_modules(&self) -> Result<Vec<Module>, ApiError> {
        Self::send_json(self.get("/api/modules/")).await
    }

    async fn complete_lesson(&self, lesson: LessonId) -> Result<(), ApiError> {
        Self::send(self.post(&format!("/api/lessons/{lesson}/complete/"))).await?;
        Ok(())
    }

    async fn track_time(&self, lesson: LessonId, seconds: u64) -> Result<(), ApiError> {
        let request = self
            .post(&format!("/api/lessons/{lesson}/track_time/"))
            .json(&TrackTimeRequest {
                time_spent_seconds: seconds,
            });
        match Self::send(request).await {
            Err(ApiError::HttpStatus(StatusCode::FORBIDDEN)) => Err(ApiError::AuthRequired),
            other => other.map(|_| ()),
        }
    }

    async fn submit_quiz(
        &self,
        quiz: QuizId,
        selected_answer: usize,
    ) -> Result<QuizVerdict, ApiError> {
        self.post_json(
            "/api/submit-quiz/",
            &QuizRequest {
                quiz,
                selected_answer,
            },
        )
        .await
    }

    async fn submit_exercise(
        &self,
        lesson: LessonId,
        code: &str,
    ) -> Result<ExerciseReport, ApiError> {
        self.post_json(
            "/api/submit-exercise/",
            &ExerciseRequest {
                lesson_id: lesson,
                code,
            },
        )
        .await
    }

    async fn progress_summary(&self) -> Result<ProgressSummary, ApiError> {
        Self::send_json(self.get("/api/progress/summary/")).await
    }

    async fn export_progress(&self) -> Result<Value, ApiError> {
        Self::send_json(self.get("/api/export-progress/")).await
    }

    async fn import_progress(&self, blob: &Value) -> Result<(), ApiError> {
        Self::send(self.post("/api/import-progress/").json(blob)).await?;
        Ok(())
    }
}
