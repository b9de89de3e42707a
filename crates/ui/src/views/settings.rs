use std::path::PathBuf;

use dioxus::prelude::*;

use services::Command;

use crate::shell::{ShellMsg, use_shell};

#[component]
pub fn SettingsView() -> Element {
    let shell = use_shell();
    let dark_mode = shell.state.vm.read().dark_mode;
    let mut import_path = use_signal(String::new);
    let mut confirm_reset = use_signal(|| false);

    let theme_label = if dark_mode { "Dark" } else { "Light" };
    let toggle_label = if dark_mode {
        "Switch to light mode"
    } else {
        "Switch to dark mode"
    };

    rsx! {
        div { class: "page settings-page",
            h1 { "Settings" }

            section { class: "settings-section",
                h2 { "Appearance" }
                p { "Theme: {theme_label}" }
                button {
                    class: "btn",
                    r#type: "button",
                    onclick: move |_| shell.dispatch(Command::SetDarkMode(!dark_mode)),
                    "{toggle_label}"
                }
            }

            section { class: "settings-section",
                h2 { "Backup" }
                p { class: "muted",
                    "Export writes your server progress and the progress saved on this device to a JSON file."
                }
                button {
                    class: "btn",
                    r#type: "button",
                    onclick: move |_| shell.send(ShellMsg::ExportProgress),
                    "Export progress"
                }
                div { class: "import-row",
                    input {
                        class: "text-input",
                        r#type: "text",
                        placeholder: "Path to a course-progress JSON file",
                        value: "{import_path}",
                        oninput: move |evt| import_path.set(evt.value()),
                    }
                    button {
                        class: "btn",
                        r#type: "button",
                        disabled: import_path.read().trim().is_empty(),
                        onclick: move |_| {
                            let path = PathBuf::from(import_path.read().trim());
                            shell.send(ShellMsg::ImportProgress(path));
                        },
                        "Import progress"
                    }
                }
            }

            section { class: "settings-section danger-zone",
                h2 { "Reset" }
                p { class: "muted",
                    "Clears the progress saved on this device. Lessons the server already counts as completed stay completed."
                }
                if confirm_reset() {
                    p { "Reset all local progress?" }
                    button {
                        class: "btn btn-danger",
                        r#type: "button",
                        onclick: move |_| {
                            confirm_reset.set(false);
                            shell.dispatch(Command::ResetProgress);
                        },
                        "Yes, reset"
                    }
                    button {
                        class: "btn",
                        r#type: "button",
                        onclick: move |_| confirm_reset.set(false),
                        "Cancel"
                    }
                } else {
                    button {
                        class: "btn btn-danger",
                        r#type: "button",
                        onclick: move |_| confirm_reset.set(true),
                        "Reset progress"
                    }
                }
            }
        }
    }
}
