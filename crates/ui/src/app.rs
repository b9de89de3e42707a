use dioxus::prelude::*;

use course_core::model::ViewKind;

use crate::context::AppContext;
use crate::shell::{Controller, Shell, use_shell, use_shell_state};
use crate::views::{
    HomeView, LessonView, ModuleOverviewView, ProgressView, SettingsView, Sidebar, Toasts,
    TopBar,
};

#[component]
pub fn App() -> Element {
    rsx! {
        document::Stylesheet { href: asset!("/assets/style.css") }
        ShellProvider { Layout {} }
    }
}

/// Owns the shell coroutine and hands `Shell` to everything below it.
#[component]
pub(crate) fn ShellProvider(children: Element) -> Element {
    let ctx = use_context::<AppContext>();
    let state = use_shell_state(&ctx);
    let controller = Controller::new(ctx, state);
    let tx = use_coroutine(move |rx| controller.clone().run(rx));
    use_context_provider(|| Shell::new(state, tx));

    children
}

#[component]
pub(crate) fn Layout() -> Element {
    let shell = use_shell();
    let vm = shell.state.vm.read().clone();
    let root_class = if vm.dark_mode {
        "app-root theme-dark"
    } else {
        "app-root"
    };

    rsx! {
        // Window title follows the active view.
        document::Title { "{vm.title}" }

        div { class: "{root_class}",
            TopBar {}
            div { class: "layout",
                Sidebar {}
                main { class: "content",
                    ErrorBoundary {
                        handle_error: |errors: ErrorContext| rsx! {
                            div { class: "fatal",
                                h1 { "Something went wrong" }
                                pre { "{errors:?}" }
                            }
                        },
                        ActiveView { view: vm.view }
                    }
                }
            }
            Toasts {}
        }
    }
}

#[component]
fn ActiveView(view: ViewKind) -> Element {
    match view {
        ViewKind::Home => rsx! { HomeView {} },
        ViewKind::ModuleOverview => rsx! { ModuleOverviewView {} },
        ViewKind::Lesson => rsx! { LessonView {} },
        ViewKind::ProgressDashboard => rsx! { ProgressView {} },
        ViewKind::Settings => rsx! { SettingsView {} },
    }
}
