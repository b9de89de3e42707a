#![forbid(unsafe_code)]

pub mod api;
pub mod backup;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod exercise;
pub mod http_api;
pub mod outbox;
pub mod player;
pub mod quiz;
pub mod router;
pub mod session;
pub mod shared;

pub use course_core::Clock;

pub use api::{CourseApi, ExerciseReport, ModuleProgress, ProgressSummary, QuizVerdict, TestResult};
pub use config::{ApiConfig, PlayerConfig};
pub use dashboard::{ProgressOverview, SummarySource};
pub use error::{ApiError, BackupError, ExerciseError, QuizError, SessionError};
pub use http_api::HttpCourseApi;
pub use outbox::{DeliveryReport, PendingWrite};
pub use player::{Command, CoursePlayer, Event, Notification, NotificationLevel};
pub use router::UrlUpdate;
pub use session::PlayerSession;
pub use shared::SharedSession;
