use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};

use services::{Event, SharedSession};

use crate::vm::ShellVm;

pub trait UiApp: Send + Sync {
    fn session(&self) -> SharedSession;

    /// Where exported backups are written.
    fn export_dir(&self) -> PathBuf;

    /// Events produced while the session started, before any view existed.
    fn startup_events(&self) -> Vec<Event>;
}

#[derive(Clone)]
pub struct AppContext {
    session: SharedSession,
    export_dir: PathBuf,
    startup_events_once: Arc<StdMutex<Option<Vec<Event>>>>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            session: app.session(),
            export_dir: app.export_dir(),
            startup_events_once: Arc::new(StdMutex::new(Some(app.startup_events()))),
        }
    }

    #[must_use]
    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    #[must_use]
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone()
    }

    /// Startup events, handed out once.
    #[must_use]
    pub fn take_startup_events(&self) -> Vec<Event> {
        self.startup_events_once
            .lock()
            .ok()
            .and_then(|mut events| events.take())
            .unwrap_or_default()
    }

    /// Current view-model without waiting; empty if the session is busy.
    #[must_use]
    pub fn snapshot(&self) -> ShellVm {
        self.session
            .try_lock()
            .map(|session| ShellVm::from_player(session.player()))
            .unwrap_or_default()
    }
}

// This context is provided by the application composition root (`crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
