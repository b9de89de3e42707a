use dioxus::prelude::*;

use course_core::route::Route;
use services::{Command, NotificationLevel};

use crate::shell::{ShellMsg, use_shell};
use crate::vm::{ModuleCardVm, display_fragment};

#[component]
pub fn ProgressBar(percent: u8) -> Element {
    rsx! {
        div { class: "progress-bar",
            div { class: "progress-fill", style: "width: {percent}%" }
        }
        span { class: "progress-label", "{percent}%" }
    }
}

#[component]
pub fn TopBar() -> Element {
    let shell = use_shell();
    let vm = shell.state.vm.read().clone();
    let history = shell.state.history.read().clone();
    let site_title = vm.site_title.clone();

    rsx! {
        header { class: "topbar",
            div { class: "topbar-nav",
                button {
                    class: "icon-btn",
                    r#type: "button",
                    title: "Back",
                    disabled: !history.can_go_back(),
                    onclick: move |_| shell.send(ShellMsg::Back),
                    "←"
                }
                button {
                    class: "icon-btn",
                    r#type: "button",
                    title: "Forward",
                    disabled: !history.can_go_forward(),
                    onclick: move |_| shell.send(ShellMsg::Forward),
                    "→"
                }
                AddressBar { key: "{vm.fragment}", fragment: vm.fragment.clone() }
            }
            button {
                class: "brand",
                r#type: "button",
                onclick: move |_| shell.dispatch(Command::NavigateTo(Route::Home)),
                "{site_title}"
            }
            nav { class: "topbar-links",
                button {
                    class: "link-btn",
                    r#type: "button",
                    onclick: move |_| shell.dispatch(Command::NavigateTo(Route::Progress)),
                    "Progress"
                }
                button {
                    class: "link-btn",
                    r#type: "button",
                    onclick: move |_| shell.dispatch(Command::NavigateTo(Route::Settings)),
                    "Settings"
                }
            }
        }
    }
}

/// Editable location field. Remounted (via `key`) whenever the fragment moves.
#[component]
fn AddressBar(fragment: String) -> Element {
    let shell = use_shell();
    let mut typed = use_signal(|| display_fragment(&fragment));

    rsx! {
        div { class: "address-bar",
            input {
                class: "address-input",
                r#type: "text",
                value: "{typed}",
                oninput: move |evt| typed.set(evt.value()),
            }
            button {
                class: "icon-btn",
                r#type: "button",
                onclick: move |_| shell.dispatch(Command::HashChanged(typed())),
                "Go"
            }
        }
    }
}

#[component]
pub fn Sidebar() -> Element {
    let shell = use_shell();
    let vm = shell.state.vm.read().clone();
    let expanded = shell.state.expanded.read().clone();

    rsx! {
        aside { class: "sidebar",
            h3 { class: "sidebar-title", "Modules" }
            if !vm.catalog_loaded {
                p { class: "muted", "Loading…" }
            }
            ul { class: "sidebar-modules",
                for card in vm.modules {
                    SidebarModule {
                        key: "{card.id}",
                        open: expanded.contains(&card.id),
                        card: card.clone(),
                    }
                }
            }
        }
    }
}

#[component]
fn SidebarModule(card: ModuleCardVm, open: bool) -> Element {
    let shell = use_shell();
    let module = card.id;
    let chevron = if open { "▾" } else { "▸" };

    rsx! {
        li { class: "sidebar-module",
            div { class: "sidebar-module-header",
                button {
                    class: "icon-btn",
                    r#type: "button",
                    onclick: move |_| shell.toggle_module(module),
                    "{chevron}"
                }
                button {
                    class: "link-btn sidebar-module-title",
                    r#type: "button",
                    onclick: move |_| shell.dispatch(Command::OpenModule(module)),
                    "{card.title}"
                }
                span { class: "muted", "{card.completed}/{card.total}" }
            }
            if open {
                ul { class: "sidebar-lessons",
                    for row in card.lessons {
                        li {
                            key: "{row.id}",
                            class: lesson_row_class(row.active),
                            button {
                                class: "link-btn",
                                r#type: "button",
                                onclick: move |_| shell.dispatch(Command::GotoLesson(row.id)),
                                if row.completed {
                                    span { class: "check", "✓ " }
                                }
                                "{row.title}"
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
pub fn Toasts() -> Element {
    let shell = use_shell();
    let toasts = shell.state.toasts.read().clone();

    rsx! {
        div { class: "toasts",
            for toast in toasts {
                div {
                    key: "{toast.id}",
                    class: toast_class(toast.notification.level),
                    span { "{toast.notification.message}" }
                    button {
                        class: "icon-btn",
                        r#type: "button",
                        onclick: move |_| shell.send(ShellMsg::DismissToast(toast.id)),
                        "×"
                    }
                }
            }
        }
    }
}

fn lesson_row_class(active: bool) -> &'static str {
    if active {
        "sidebar-lesson active"
    } else {
        "sidebar-lesson"
    }
}

fn toast_class(level: NotificationLevel) -> &'static str {
    match level {
        NotificationLevel::Info => "toast toast-info",
        NotificationLevel::Success => "toast toast-success",
        NotificationLevel::Error => "toast toast-error",
    }
}
