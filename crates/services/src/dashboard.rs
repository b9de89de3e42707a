use course_core::reconcile::Reconciler;

use crate::api::{ModuleProgress, ProgressSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarySource {
    Server,
    Local,
}

/// What the progress dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressOverview {
    pub source: SummarySource,
    pub progress_percentage: u8,
    pub completed_lessons: usize,
    pub total_lessons: usize,
    pub total_time_seconds: u64,
    pub modules: Vec<ModuleProgress>,
}

impl ProgressOverview {
    #[must_use]
    pub fn from_server(summary: ProgressSummary) -> Self {
        Self {
            source: SummarySource::Server,
            progress_percentage: summary.progress_percentage.min(100),
            completed_lessons: summary.completed_lessons,
            total_lessons: summary.total_lessons,
            total_time_seconds: summary.total_time_seconds,
            modules: summary.modules_progress,
        }
    }

    /// Fallback computed from the catalog and the local records.
    #[must_use]
    pub fn from_local(reconciler: &Reconciler<'_>) -> Self {
        let local = reconciler.local_summary();
        let modules = reconciler
            .catalog()
            .modules()
            .iter()
            .map(|module| ModuleProgress {
                title: module.title.clone(),
                progress_percentage: reconciler.module_progress_percent(module),
            })
            .collect();
        Self {
            source: SummarySource::Local,
            progress_percentage: local.progress_percentage,
            completed_lessons: local.completed_lessons,
            total_lessons: local.total_lessons,
            total_time_seconds: local.total_time_seconds,
            modules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::{Catalog, LessonId, ProgressMap};
    use serde_json::json;

    #[test]
    fn local_fallback_uses_reconciled_numbers() {
        let catalog: Catalog = serde_json::from_value(json!([
            {"id": 1, "slug": "basics", "title": "Basics", "lessons": [
                {"id": 10, "slug": "a", "title": "A", "is_completed": true},
                {"id": 11, "slug": "b", "title": "B"}
            ]},
            {"id": 2, "slug": "views", "title": "Views", "lessons": [
                {"id": 20, "slug": "c", "title": "C"}
            ]}
        ]))
        .unwrap();
        let mut local = ProgressMap::new();
        local.mark_completed(LessonId::new(11));
        local.add_time(LessonId::new(20), 125);

        let overview = ProgressOverview::from_local(&Reconciler::new(&catalog, &local));
        assert_eq!(overview.source, SummarySource::Local);
        assert_eq!(overview.completed_lessons, 2);
        assert_eq!(overview.progress_percentage, 67);
        assert_eq!(overview.total_time_seconds, 125);
        assert_eq!(overview.modules[0].progress_percentage, 100);
        assert_eq!(overview.modules[1].progress_percentage, 0);
    }
}
