//! Active-viewing time tracking for a single lesson.
//!
//! `Idle -> Tracking` on entering a lesson (or regaining visibility/focus),
//! `Tracking -> Idle` on leaving, hiding, or blurring. Periodic ticks flush
//! the unflushed part of the span without resetting the start instant, so the
//! sum of every flush for a span equals the span itself.

use chrono::{DateTime, Utc};

use crate::model::LessonId;
use crate::time::whole_seconds_between;

/// Default period between partial flushes while tracking.
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerPhase {
    Idle,
    Tracking,
}

/// Seconds to add to a lesson's record (and report to the server).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flush {
    pub lesson: LessonId,
    pub seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Same lesson was already being tracked; nothing changed.
    AlreadyTracking,
    /// A new span began. `previous` holds the flush of a different lesson's
    /// span that had to be closed first.
    Started {
        generation: u64,
        previous: Option<Flush>,
    },
}

#[derive(Debug, Clone)]
pub struct TimeTracker {
    lesson: Option<LessonId>,
    started_at: Option<DateTime<Utc>>,
    flushed_secs: u64,
    generation: u64,
    flush_interval_secs: u64,
}

impl Default for TimeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lesson: None,
            started_at: None,
            flushed_secs: 0,
            generation: 0,
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
        }
    }

    #[must_use]
    pub fn with_flush_interval(mut self, secs: u64) -> Self {
        self.flush_interval_secs = secs.max(1);
        self
    }

    #[must_use]
    pub fn flush_interval_secs(&self) -> u64 {
        self.flush_interval_secs
    }

    #[must_use]
    pub fn phase(&self) -> TrackerPhase {
        if self.started_at.is_some() {
            TrackerPhase::Tracking
        } else {
            TrackerPhase::Idle
        }
    }

    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.phase() == TrackerPhase::Tracking
    }

    /// Lesson of the open span, if any.
    #[must_use]
    pub fn lesson(&self) -> Option<LessonId> {
        self.lesson
    }

    /// Identifies the current span; scheduled ticks carry it so stale ones are ignored.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Seconds in the open span not yet flushed.
    #[must_use]
    pub fn pending_secs(&self, now: DateTime<Utc>) -> u64 {
        self.started_at.map_or(0, |start| {
            whole_seconds_between(start, now).saturating_sub(self.flushed_secs)
        })
    }

    /// Begin tracking `lesson`. Idempotent for the lesson already tracked.
    pub fn start(&mut self, lesson: LessonId, now: DateTime<Utc>) -> StartOutcome {
        if self.is_tracking() && self.lesson == Some(lesson) {
            return StartOutcome::AlreadyTracking;
        }
        let previous = self.stop(now);
        self.generation += 1;
        self.lesson = Some(lesson);
        self.started_at = Some(now);
        self.flushed_secs = 0;
        StartOutcome::Started {
            generation: self.generation,
            previous,
        }
    }

    /// Close the open span. Returns the unflushed seconds, if any.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<Flush> {
        if !self.is_tracking() {
            return None;
        }
        let flush = self.take_pending(now);
        self.generation += 1;
        self.lesson = None;
        self.started_at = None;
        self.flushed_secs = 0;
        flush
    }

    /// Periodic partial flush. Ticks from an older span are ignored.
    pub fn tick(&mut self, generation: u64, now: DateTime<Utc>) -> Option<Flush> {
        if generation != self.generation || !self.is_tracking() {
            return None;
        }
        self.take_pending(now)
    }

    fn take_pending(&mut self, now: DateTime<Utc>) -> Option<Flush> {
        let lesson = self.lesson?;
        let seconds = self.pending_secs(now);
        if seconds == 0 {
            return None;
        }
        self.flushed_secs += seconds;
        Some(Flush { lesson, seconds })
    }
}
