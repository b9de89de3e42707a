use std::env;

use course_core::tracker::DEFAULT_FLUSH_INTERVAL_SECS;
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_SITE_TITLE: &str = "Course Player";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 20;

/// Where the course server lives and how to authenticate against it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub csrf_token: Option<String>,
    pub session_cookie: Option<String>,
    /// Upper bound for one request, connect to last byte.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            csrf_token: None,
            session_cookie: None,
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerConfig {
    pub api: ApiConfig,
    pub site_title: String,
    pub flush_interval_secs: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            site_title: DEFAULT_SITE_TITLE.to_string(),
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
        }
    }
}

impl PlayerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any variable source; blank values count as unset.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let positive_secs = |key: &str, default: u64| match var(key) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    warn!(key, value = %raw, "invalid duration, using default");
                    default
                }
            },
            None => default,
        };
        let flush_interval_secs = positive_secs("COURSE_FLUSH_SECS", DEFAULT_FLUSH_INTERVAL_SECS);
        let timeout_secs = positive_secs("COURSE_API_TIMEOUT_SECS", DEFAULT_API_TIMEOUT_SECS);

        Self {
            api: ApiConfig {
                base_url: var("COURSE_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_API_BASE_URL.into()),
                csrf_token: var("COURSE_CSRF_TOKEN"),
                session_cookie: var("COURSE_SESSION_COOKIE"),
                timeout_secs,
            },
            site_title: var("COURSE_SITE_TITLE").unwrap_or_else(|| DEFAULT_SITE_TITLE.into()),
            flush_interval_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(PlayerConfig::from_lookup(lookup(&[])), PlayerConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = PlayerConfig::from_lookup(lookup(&[
            ("COURSE_API_BASE_URL", "https://learn.example.org"),
            ("COURSE_CSRF_TOKEN", "tok"),
            ("COURSE_SESSION_COOKIE", "sessionid=abc"),
            ("COURSE_SITE_TITLE", "Django Course"),
            ("COURSE_FLUSH_SECS", "10"),
            ("COURSE_API_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.api.base_url, "https://learn.example.org");
        assert_eq!(config.api.csrf_token.as_deref(), Some("tok"));
        assert_eq!(config.api.session_cookie.as_deref(), Some("sessionid=abc"));
        assert_eq!(config.site_title, "Django Course");
        assert_eq!(config.flush_interval_secs, 10);
        assert_eq!(config.api.timeout_secs, 5);
    }

    #[test]
    fn blank_and_invalid_values_fall_back() {
        let config = PlayerConfig::from_lookup(lookup(&[
            ("COURSE_CSRF_TOKEN", "  "),
            ("COURSE_FLUSH_SECS", "0"),
            ("COURSE_API_TIMEOUT_SECS", "soon"),
        ]));
        assert_eq!(config.api.csrf_token, None);
        assert_eq!(config.flush_interval_secs, DEFAULT_FLUSH_INTERVAL_SECS);
        assert_eq!(config.api.timeout_secs, DEFAULT_API_TIMEOUT_SECS);
    }
}
