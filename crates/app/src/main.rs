use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use services::{Clock, CourseApi, Event, HttpCourseApi, PlayerConfig, PlayerSession, SharedSession};
use ui::{App, UiApp, build_app_context};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidApiUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidApiUrl { raw } => write!(f, "invalid --api value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct DesktopApp {
    session: SharedSession,
    export_dir: PathBuf,
    startup_events: Vec<Event>,
}

impl UiApp for DesktopApp {
    fn session(&self) -> SharedSession {
        self.session.clone()
    }

    fn export_dir(&self) -> PathBuf {
        self.export_dir.clone()
    }

    fn startup_events(&self) -> Vec<Event> {
        self.startup_events.clone()
    }
}

struct Args {
    db_url: String,
    api_base_url: Option<String>,
    route: String,
    export_dir: Option<PathBuf>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- [--db <sqlite_url>] [--api <base_url>] [--route <fragment>] [--export-dir <dir>]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:course.sqlite3");
    eprintln!("  --api http://127.0.0.1:8000");
    eprintln!("  --route \"\" (home)");
    eprintln!("  --export-dir current directory");
    eprintln!();
    eprintln!("Environment (.env is loaded when present):");
    eprintln!("  COURSE_DB_URL, COURSE_API_BASE_URL, COURSE_CSRF_TOKEN, COURSE_SESSION_COOKIE,");
    eprintln!("  COURSE_SITE_TITLE, COURSE_FLUSH_SECS, COURSE_API_TIMEOUT_SECS, RUST_LOG");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("COURSE_DB_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| normalize_sqlite_url("course.sqlite3".into()), normalize_sqlite_url);
        let mut api_base_url = None;
        let mut route = String::new();
        let mut export_dir = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--api" => {
                    let value = require_value(args, "--api")?;
                    if !(value.starts_with("http://") || value.starts_with("https://")) {
                        return Err(ArgsError::InvalidApiUrl { raw: value });
                    }
                    api_base_url = Some(value);
                }
                "--route" => route = require_value(args, "--route")?,
                "--export-dir" => {
                    export_dir = Some(PathBuf::from(require_value(args, "--export-dir")?));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            api_base_url,
            route,
            export_dir,
        })
    }
}

fn is_memory_url(raw: &str) -> bool {
    raw == "sqlite::memory:" || raw.contains("mode=memory")
}

fn normalize_sqlite_url(raw: String) -> String {
    if is_memory_url(&raw) || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if is_memory_url(db_url) {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut config = PlayerConfig::from_env();
    if let Some(base_url) = parsed.api_base_url {
        config.api.base_url = base_url;
    }
    let export_dir = match parsed.export_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    // Open + migrate SQLite in the binary glue; the player only sees a LocalStore.
    // The catalog is fetched by the shell once the window is up.
    prepare_sqlite_file(&parsed.db_url)?;
    let api: Arc<dyn CourseApi> = Arc::new(HttpCourseApi::new(config.api.clone()));
    let (session, startup_events) = PlayerSession::open_sqlite(
        &parsed.db_url,
        api,
        &config,
        Clock::default_clock(),
        &parsed.route,
    )
    .await?;
    info!(
        db = %parsed.db_url,
        api = %config.api.base_url,
        route = %parsed.route,
        "course player ready"
    );

    let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
        session: SharedSession::new(session),
        export_dir,
        startup_events,
    });
    let context = build_app_context(&app);

    // Some dev setups default tao windows to always-on-top; turn it off.
    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title(config.site_title.as_str())
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter()
            .map(|s| (*s).to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn relative_paths_become_absolute_urls() {
        let url = normalize_sqlite_url("sqlite:data/course.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/course.sqlite3"));
    }

    #[test]
    fn memory_urls_pass_through() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        let shared = "sqlite:file:mem?mode=memory&cache=shared";
        assert_eq!(normalize_sqlite_url(shared.into()), shared);
        assert!(prepare_sqlite_file(shared).is_ok());
    }

    #[test]
    fn parses_flags() {
        let parsed = Args::parse(&mut args(&[
            "--db",
            "sqlite::memory:",
            "--api",
            "https://learn.example.org",
            "--route",
            "#/module/basics",
        ]))
        .expect("parse");
        assert_eq!(parsed.db_url, "sqlite::memory:");
        assert_eq!(parsed.api_base_url.as_deref(), Some("https://learn.example.org"));
        assert_eq!(parsed.route, "#/module/basics");
        assert!(parsed.export_dir.is_none());
    }

    #[test]
    fn rejects_bad_flags() {
        assert!(matches!(
            Args::parse(&mut args(&["--api", "ftp://nope"])),
            Err(ArgsError::InvalidApiUrl { .. })
        ));
        assert!(matches!(
            Args::parse(&mut args(&["--db"])),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
        assert!(matches!(
            Args::parse(&mut args(&["--verbose"])),
            Err(ArgsError::UnknownArg(_))
        ));
    }
}
