use dioxus::prelude::*;

use course_core::route::Route;
use services::Command;

use crate::shell::use_shell;
use crate::views::chrome::ProgressBar;
use crate::views::home::module_command;

#[component]
pub fn ModuleOverviewView() -> Element {
    let shell = use_shell();
    let vm = shell.state.vm.read().clone();
    let Some(card) = vm.current_module_card().cloned() else {
        return rsx! {
            div { class: "page",
                p { class: "muted", "This module is not available." }
            }
        };
    };
    let module = card.id;
    let action = card.action;
    let has_lessons = card.total > 0;

    rsx! {
        div { class: "page module-page",
            nav { class: "breadcrumbs",
                button {
                    class: "link-btn",
                    r#type: "button",
                    onclick: move |_| shell.dispatch(Command::NavigateTo(Route::Home)),
                    "Modules"
                }
                span { " / {card.title}" }
            }
            h1 { "{card.title}" }
            if !card.description.is_empty() {
                p { "{card.description}" }
            }
            p { class: "module-meta",
                "{card.completed} of {card.total} lessons completed"
                if card.estimated_minutes > 0 {
                    " · about {card.estimated_minutes} min"
                }
            }
            ProgressBar { percent: card.percent }

            ol { class: "lesson-list",
                for row in card.lessons {
                    li { key: "{row.id}", class: "lesson-row",
                        button {
                            class: "link-btn",
                            r#type: "button",
                            onclick: move |_| shell.dispatch(Command::GotoLesson(row.id)),
                            "{row.title}"
                        }
                        if row.completed {
                            span { class: "badge badge-done", "Completed" }
                        }
                    }
                }
            }

            div { class: "module-navigation",
                button {
                    class: "btn btn-primary",
                    r#type: "button",
                    disabled: !has_lessons,
                    onclick: move |_| shell.dispatch(module_command(action, module)),
                    "{action.label()} module"
                }
            }
        }
    }
}
