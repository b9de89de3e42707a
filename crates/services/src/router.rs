use course_core::model::{Catalog, NavigationState};
use course_core::route::{document_title, to_fragment};

/// Sole writer of the location fragment and the document title.
#[derive(Debug, Clone)]
pub struct UrlRouter {
    site_title: String,
    fragment: String,
    title: String,
}

/// A fragment/title pair to push to the host window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlUpdate {
    pub fragment: String,
    pub title: String,
}

impl UrlRouter {
    #[must_use]
    pub fn new(site_title: impl Into<String>) -> Self {
        let site_title = site_title.into();
        Self {
            title: site_title.clone(),
            site_title,
            fragment: String::new(),
        }
    }

    #[must_use]
    pub fn site_title(&self) -> &str {
        &self.site_title
    }

    #[must_use]
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether an incoming hash change is just the echo of our own last push.
    #[must_use]
    pub fn is_echo(&self, fragment: &str) -> bool {
        normalize(fragment) == self.fragment
    }

    /// Remember a fragment the host already shows, without pushing it back.
    pub fn observe(&mut self, fragment: &str) {
        self.fragment = normalize(fragment);
    }

    /// Compute the fragment and title for `state`. Returns an update only when
    /// either differs from what was last pushed.
    pub fn push(&mut self, state: &NavigationState, catalog: &Catalog) -> Option<UrlUpdate> {
        let fragment = to_fragment(state, catalog);
        let title = document_title(state, catalog, &self.site_title);
        if fragment == self.fragment && title == self.title {
            return None;
        }
        self.fragment.clone_from(&fragment);
        self.title.clone_from(&title);
        Some(UrlUpdate { fragment, title })
    }
}

/// Canonical spelling: no leading `#`, no empty segments, leading `/` unless Home.
fn normalize(fragment: &str) -> String {
    let trimmed = fragment.strip_prefix('#').unwrap_or(fragment);
    let parts: Vec<&str> = trimmed.split('/').filter(|part| !part.is_empty()).collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!("/{}", parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::{LessonId, ModuleId};
    use serde_json::json;

    fn catalog() -> Catalog {
        serde_json::from_value(json!([
            {"id": 1, "slug": "basics", "title": "Basics", "lessons": [
                {"id": 10, "slug": "setup", "title": "Setup"}
            ]}
        ]))
        .unwrap()
    }

    #[test]
    fn push_reports_only_changes() {
        let catalog = catalog();
        let mut router = UrlRouter::new("Course");
        let lesson = NavigationState::lesson(ModuleId::new(1), LessonId::new(10));

        let update = router.push(&lesson, &catalog).unwrap();
        assert_eq!(update.fragment, "/module/basics/lesson/setup");
        assert_eq!(update.title, "Setup - Basics");
        assert!(router.push(&lesson, &catalog).is_none());
        assert!(router.push(&NavigationState::home(), &catalog).is_some());
        assert_eq!(router.title(), "Course");
    }

    #[test]
    fn echo_detection_ignores_spelling() {
        let catalog = catalog();
        let mut router = UrlRouter::new("Course");
        router.push(&NavigationState::module_overview(ModuleId::new(1)), &catalog);
        assert!(router.is_echo("#/module/basics"));
        assert!(router.is_echo("module/basics/"));
        assert!(!router.is_echo("#/settings"));
    }

    #[test]
    fn home_is_the_empty_fragment() {
        let router = UrlRouter::new("Course");
        assert!(router.is_echo("#"));
        assert!(router.is_echo(""));
        assert!(router.is_echo("#/"));
    }
}
