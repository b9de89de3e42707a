//! Hash-fragment routes and their resolution against the loaded catalog.
//!
//! Grammar (a leading `#` and empty `/` segments are ignored):
//!
//! ```text
//! ""                             -> Home
//! "settings"                     -> Settings
//! "progress"                     -> ProgressDashboard
//! "module/{slug}"                -> ModuleOverview
//! "module/{slug}/lesson/{slug}"  -> Lesson
//! ```

use std::fmt;

use crate::error::{Error, NotFound, RouteError};
use crate::model::{Catalog, NavigationState, ViewKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Settings,
    Progress,
    Module { module: String },
    Lesson { module: String, lesson: String },
}

impl Route {
    /// Parse a fragment into a route shape. Slugs are not checked here.
    ///
    /// # Errors
    ///
    /// Returns `RouteError::Malformed` if the fragment matches no known shape.
    pub fn parse(fragment: &str) -> Result<Self, RouteError> {
        let trimmed = fragment.strip_prefix('#').unwrap_or(fragment);
        let parts: Vec<&str> = trimmed.split('/').filter(|part| !part.is_empty()).collect();

        match parts.as_slice() {
            [] => Ok(Route::Home),
            ["settings"] => Ok(Route::Settings),
            ["progress"] => Ok(Route::Progress),
            ["module", module] => Ok(Route::Module {
                module: (*module).to_string(),
            }),
            ["module", module, "lesson", lesson] => Ok(Route::Lesson {
                module: (*module).to_string(),
                lesson: (*lesson).to_string(),
            }),
            _ => Err(RouteError::Malformed(fragment.to_string())),
        }
    }

    /// Fragment text without the leading `#`; Home is the empty fragment.
    #[must_use]
    pub fn to_fragment(&self) -> String {
        match self {
            Route::Home => String::new(),
            Route::Settings => "/settings".to_string(),
            Route::Progress => "/progress".to_string(),
            Route::Module { module } => format!("/module/{module}"),
            Route::Lesson { module, lesson } => format!("/module/{module}/lesson/{lesson}"),
        }
    }

    /// Build the route that addresses a navigation state.
    ///
    /// Ids that no longer exist in the catalog degrade to the nearest ancestor.
    #[must_use]
    pub fn for_state(state: &NavigationState, catalog: &Catalog) -> Self {
        let module = state.module().and_then(|id| catalog.module(id));
        match state.view() {
            ViewKind::Home => Route::Home,
            ViewKind::Settings => Route::Settings,
            ViewKind::ProgressDashboard => Route::Progress,
            ViewKind::ModuleOverview => match module {
                Some(module) => Route::Module {
                    module: module.slug.clone(),
                },
                None => Route::Home,
            },
            ViewKind::Lesson => {
                let Some(module) = module else {
                    return Route::Home;
                };
                match state.lesson_id().and_then(|id| module.lesson(id)) {
                    Some(lesson) => Route::Lesson {
                        module: module.slug.clone(),
                        lesson: lesson.slug.clone(),
                    },
                    None => Route::Module {
                        module: module.slug.clone(),
                    },
                }
            }
        }
    }

    /// Resolve slugs against the catalog, falling back to the nearest valid view.
    #[must_use]
    pub fn resolve(&self, catalog: &Catalog) -> Resolution {
        match self {
            Route::Home => Resolution::ok(NavigationState::home()),
            Route::Settings => Resolution::ok(NavigationState::settings()),
            Route::Progress => Resolution::ok(NavigationState::progress_dashboard()),
            Route::Module { module } => match catalog.module_by_slug(module) {
                Some(found) => Resolution::ok(NavigationState::module_overview(found.id)),
                None => Resolution::fallback(
                    NavigationState::home(),
                    NotFound::ModuleSlug(module.clone()),
                ),
            },
            Route::Lesson { module, lesson } => {
                let Some(found) = catalog.module_by_slug(module) else {
                    return Resolution::fallback(
                        NavigationState::home(),
                        NotFound::ModuleSlug(module.clone()),
                    );
                };
                match found.lesson_by_slug(lesson) {
                    Some(target) => Resolution::ok(NavigationState::lesson(found.id, target.id)),
                    None => Resolution::fallback(
                        NavigationState::module_overview(found.id),
                        NotFound::LessonSlug {
                            module: module.clone(),
                            lesson: lesson.clone(),
                        },
                    ),
                }
            }
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_fragment())
    }
}

/// Outcome of routing: the state to show plus a diagnostic when a fallback happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub state: NavigationState,
    pub diagnostic: Option<Error>,
}

impl Resolution {
    fn ok(state: NavigationState) -> Self {
        Self {
            state,
            diagnostic: None,
        }
    }

    fn fallback(state: NavigationState, err: impl Into<Error>) -> Self {
        Self {
            state,
            diagnostic: Some(err.into()),
        }
    }
}

/// Parse and resolve a fragment in one step. Never fails: malformed fragments
/// resolve to Home with a diagnostic.
#[must_use]
pub fn route(fragment: &str, catalog: &Catalog) -> Resolution {
    match Route::parse(fragment) {
        Ok(parsed) => parsed.resolve(catalog),
        Err(err) => Resolution::fallback(NavigationState::home(), err),
    }
}

/// Fragment for a navigation state.
#[must_use]
pub fn to_fragment(state: &NavigationState, catalog: &Catalog) -> String {
    Route::for_state(state, catalog).to_fragment()
}

/// Deterministic document title for a view.
#[must_use]
pub fn document_title(state: &NavigationState, catalog: &Catalog, site_title: &str) -> String {
    let module = state.module().and_then(|id| catalog.module(id));
    match state.view() {
        ViewKind::Home => site_title.to_string(),
        ViewKind::Settings => format!("Settings - {site_title}"),
        ViewKind::ProgressDashboard => format!("Progress - {site_title}"),
        ViewKind::ModuleOverview => match module {
            Some(module) => format!("{} - {site_title}", module.title),
            None => site_title.to_string(),
        },
        ViewKind::Lesson => {
            let lesson = module.and_then(|m| state.lesson_id().and_then(|id| m.lesson(id)));
            match (module, lesson) {
                (Some(module), Some(lesson)) => format!("{} - {}", lesson.title, module.title),
                (Some(module), None) => format!("{} - {site_title}", module.title),
                _ => site_title.to_string(),
            }
        }
    }
}
