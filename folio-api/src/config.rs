use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_BIND: &str = "0.0.0.0:3131";

/// Service settings, read from `FOLIO_API_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// `FOLIO_API_BIND`
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// `FOLIO_API_DB_PATH`, otherwise `folio.db` in the per-user data directory
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_bind_addr() -> String {
    DEFAULT_BIND.to_string()
}

fn default_db_path() -> PathBuf {
    data_dir(|key| std::env::var(key).ok()).join("folio.db")
}

/// `%APPDATA%\folio` on Windows, `~/.folio` elsewhere.
fn data_dir(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(lookup("APPDATA").unwrap_or_else(|| ".".to_string())).join("folio")
    } else {
        PathBuf::from(lookup("HOME").unwrap_or_else(|| ".".to_string())).join(".folio")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            db_path: default_db_path(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bind_addr = lookup("FOLIO_API_BIND")
            .filter(|addr| !addr.is_empty())
            .unwrap_or_else(default_bind_addr);
        let db_path = lookup("FOLIO_API_DB_PATH")
            .filter(|path| !path.is_empty())
            .map_or_else(|| data_dir(&lookup).join("folio.db"), PathBuf::from);

        Self { bind_addr, db_path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_home_data_dir() {
        let config = Config::from_lookup(|key| match key {
            "HOME" | "APPDATA" => Some("/home/alice".to_string()),
            _ => None,
        });

        assert_eq!(config.bind_addr, "0.0.0.0:3131");
        assert!(config.db_path.starts_with("/home/alice"));
        assert!(config.db_path.ends_with("folio.db"));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(|key| match key {
            "FOLIO_API_BIND" => Some("127.0.0.1:8080".to_string()),
            "FOLIO_API_DB_PATH" => Some("/var/lib/folio/test.db".to_string()),
            _ => None,
        });

        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.db_path, PathBuf::from("/var/lib/folio/test.db"));
    }

    #[test]
    fn test_empty_values_fall_back() {
        let config = Config::from_lookup(|key| match key {
            "FOLIO_API_BIND" | "FOLIO_API_DB_PATH" => Some(String::new()),
            "HOME" | "APPDATA" => Some("/root".to_string()),
            _ => None,
        });

        assert_eq!(config.bind_addr, "0.0.0.0:3131");
        assert!(config.db_path.ends_with("folio.db"));
    }
}
