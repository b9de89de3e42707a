//! Best-effort server writes queued by the player.
//!
//! The player never waits on the network for completion or time tracking: it
//! records the write here and moves on. Delivery failures are logged and
//! dropped; the local record already holds the truth for this client.

use std::collections::VecDeque;

use course_core::model::LessonId;
use tracing::{debug, warn};

use crate::api::CourseApi;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingWrite {
    Complete(LessonId),
    TrackTime { lesson: LessonId, seconds: u64 },
}

#[derive(Debug, Clone, Default)]
pub struct Outbox {
    queue: VecDeque<PendingWrite>,
}

impl Outbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: PendingWrite) {
        self.queue.push_back(write);
    }

    pub fn drain(&mut self) -> Vec<PendingWrite> {
        self.queue.drain(..).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingWrite> {
        self.queue.iter()
    }
}

/// Tally of one delivery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
    pub completions_delivered: usize,
}

/// Send every write in order. Never fails; each failure is logged.
pub async fn deliver(api: &dyn CourseApi, writes: Vec<PendingWrite>) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for write in writes {
        let result = match write {
            PendingWrite::Complete(lesson) => api.complete_lesson(lesson).await,
            PendingWrite::TrackTime { lesson, seconds } => api.track_time(lesson, seconds).await,
        };
        match result {
            Ok(()) => {
                report.delivered += 1;
                if matches!(write, PendingWrite::Complete(_)) {
                    report.completions_delivered += 1;
                }
            }
            Err(ApiError::AuthRequired) => {
                report.failed += 1;
                debug!(?write, "server refused write without a session, kept locally");
            }
            Err(err) => {
                report.failed += 1;
                warn!(?write, error = %err, "best-effort server write failed");
            }
        }
    }
    report
}
