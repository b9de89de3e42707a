use dioxus::prelude::*;

use course_core::model::ModuleId;
use services::Command;

use crate::shell::use_shell;
use crate::views::chrome::ProgressBar;
use crate::vm::{ModuleAction, ModuleCardVm};

#[component]
pub fn HomeView() -> Element {
    let shell = use_shell();
    let vm = shell.state.vm.read().clone();
    let has_lessons = vm.total_lessons > 0;

    rsx! {
        div { class: "page home-page",
            section { class: "hero",
                h1 { "{vm.site_title}" }
                p { class: "muted",
                    "{vm.completed_lessons} of {vm.total_lessons} lessons completed"
                }
                ProgressBar { percent: vm.overall_percent }
                button {
                    class: "btn btn-primary",
                    r#type: "button",
                    disabled: !has_lessons,
                    onclick: move |_| shell.dispatch(Command::StartCourse),
                    "Start learning"
                }
            }

            if !vm.catalog_loaded {
                p { class: "muted", "Loading course…" }
            } else if vm.modules.is_empty() {
                p { class: "muted", "No modules available yet." }
            } else {
                div { class: "module-grid",
                    for card in vm.modules {
                        ModuleCard { key: "{card.id}", card: card.clone() }
                    }
                }
            }
        }
    }
}

#[component]
fn ModuleCard(card: ModuleCardVm) -> Element {
    let shell = use_shell();
    let module = card.id;
    let action = card.action;
    let has_lessons = card.total > 0;

    rsx! {
        div { class: "module-card",
            h3 {
                button {
                    class: "link-btn",
                    r#type: "button",
                    onclick: move |_| shell.dispatch(Command::OpenModule(module)),
                    "{card.title}"
                }
            }
            if !card.description.is_empty() {
                p { class: "muted", "{card.description}" }
            }
            p { class: "module-meta",
                "{card.completed}/{card.total} lessons"
                if card.estimated_minutes > 0 {
                    " · {card.estimated_minutes} min"
                }
            }
            ProgressBar { percent: card.percent }
            button {
                class: "btn",
                r#type: "button",
                disabled: !has_lessons,
                onclick: move |_| shell.dispatch(module_command(action, module)),
                "{action.label()}"
            }
        }
    }
}

/// Start opens the first lesson; Continue and Review resume at the first
/// incomplete one (the first lesson once everything is done).
pub(crate) fn module_command(action: ModuleAction, module: ModuleId) -> Command {
    match action {
        ModuleAction::Start => Command::StartModule(module),
        ModuleAction::Continue | ModuleAction::Review => Command::ContinueModule(module),
    }
}
