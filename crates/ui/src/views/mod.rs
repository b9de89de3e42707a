mod chrome;
mod home;
mod lesson;
mod module_overview;
mod progress;
mod settings;

pub use chrome::{ProgressBar, Sidebar, Toasts, TopBar};
pub use home::HomeView;
pub use lesson::LessonView;
pub use module_overview::ModuleOverviewView;
pub use progress::ProgressView;
pub use settings::SettingsView;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;
