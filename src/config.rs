//! Service configuration from the environment.

use std::env;
use std::path::PathBuf;

use tracing::warn;

pub const DEFAULT_PORT: u16 = 7540;
pub const DEFAULT_DB_FILE: &str = "scheduler.db";
pub const DEFAULT_WEB_DIR: &str = "web";

/// Load `.env` (silently ignored if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `TODO_PORT`
    pub port: u16,
    /// `TODO_DBFILE`
    pub db_file: PathBuf,
    /// `TODO_PASSWORD`; `None` leaves every endpoint open.
    pub password: Option<String>,
    /// `TODO_WEBDIR`, static assets served at `/`.
    pub web_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            db_file: PathBuf::from(DEFAULT_DB_FILE),
            password: None,
            web_dir: PathBuf::from(DEFAULT_WEB_DIR),
        }
    }
}

impl Config {
    /// Build config from process environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let port = match get("TODO_PORT") {
            None => defaults.port,
            Some(raw) => match raw.parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => {
                    warn!("invalid TODO_PORT {raw:?}, using {DEFAULT_PORT}");
                    DEFAULT_PORT
                }
            },
        };

        Self {
            port,
            db_file: get("TODO_DBFILE").map(PathBuf::from).unwrap_or(defaults.db_file),
            password: get("TODO_PASSWORD"),
            web_dir: get("TODO_WEBDIR").map(PathBuf::from).unwrap_or(defaults.web_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config(&[]), Config::default());
    }

    #[test]
    fn reads_every_variable() {
        let cfg = config(&[
            ("TODO_PORT", "8080"),
            ("TODO_DBFILE", "/tmp/tasks.db"),
            ("TODO_PASSWORD", "hunter2"),
            ("TODO_WEBDIR", "public"),
        ]);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.db_file, PathBuf::from("/tmp/tasks.db"));
        assert_eq!(cfg.password.as_deref(), Some("hunter2"));
        assert_eq!(cfg.web_dir, PathBuf::from("public"));
    }

    #[test]
    fn invalid_port_falls_back() {
        assert_eq!(config(&[("TODO_PORT", "abc")]).port, DEFAULT_PORT);
        assert_eq!(config(&[("TODO_PORT", "0")]).port, DEFAULT_PORT);
        assert_eq!(config(&[("TODO_PORT", "70000")]).port, DEFAULT_PORT);
    }

    #[test]
    fn blank_password_disables_auth() {
        assert_eq!(config(&[("TODO_PASSWORD", "  ")]).password, None);
    }
}
