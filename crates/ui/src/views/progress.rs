use dioxus::prelude::*;

use services::{ProgressOverview, SummarySource};

use crate::context::AppContext;
use crate::shell::use_shell;
use crate::views::chrome::ProgressBar;
use crate::vm::format_duration;

#[component]
pub fn ProgressView() -> Element {
    let ctx = use_context::<AppContext>();
    let shell = use_shell();

    let overview = use_resource(move || {
        // re-fetch whenever local completion moves
        let _completed = shell.state.vm.read().completed_lessons;
        let session = ctx.session();
        async move { session.progress_overview().await }
    });

    let data = overview.read().clone();

    rsx! {
        div { class: "page progress-page",
            h1 { "Your progress" }
            match data {
                None => rsx! {
                    p { "Loading..." }
                },
                Some(data) => rsx! {
                    Dashboard { overview: data }
                },
            }
        }
    }
}

#[component]
fn Dashboard(overview: ProgressOverview) -> Element {
    let time = format_duration(overview.total_time_seconds);
    let source = match overview.source {
        SummarySource::Server => "Synced with the server.",
        SummarySource::Local => "Server unavailable, showing progress saved on this device.",
    };

    rsx! {
        p { class: "muted dashboard-source", "{source}" }
        div { class: "stat-grid",
            div { class: "stat",
                span { class: "stat-value", "{overview.progress_percentage}%" }
                span { class: "stat-label", "Overall" }
            }
            div { class: "stat",
                span { class: "stat-value", "{overview.completed_lessons}/{overview.total_lessons}" }
                span { class: "stat-label", "Lessons completed" }
            }
            div { class: "stat",
                span { class: "stat-value", "{time}" }
                span { class: "stat-label", "Time spent" }
            }
        }
        h2 { "Modules" }
        if overview.modules.is_empty() {
            p { class: "muted", "No modules yet." }
        }
        ul { class: "module-progress-list",
            for (index, module) in overview.modules.iter().enumerate() {
                li { key: "{index}",
                    span { class: "module-progress-title", "{module.title}" }
                    ProgressBar { percent: module.progress_percentage }
                }
            }
        }
    }
}
