//! Runtime configuration
//!
//! Read once at startup from `NUTRILOG_*` environment variables.

use std::path::PathBuf;

use thiserror::Error;

pub const DATABASE_PATH_VAR: &str = "NUTRILOG_DATABASE_PATH";
pub const USER_ID_VAR: &str = "NUTRILOG_USER_ID";
pub const LOG_VAR: &str = "NUTRILOG_LOG";

/// Default tracing directive for this crate
pub const DEFAULT_LOG_DIRECTIVE: &str = "nutrilog=info";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidUserId { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    /// The user every request acts as
    pub user_id: i64,
    pub log_directive: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup(DATABASE_PATH_VAR)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let user_id = match lookup(USER_ID_VAR) {
            Some(raw) => parse_user_id(&raw)?,
            None => 1,
        };

        let log_directive = lookup(LOG_VAR)
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_DIRECTIVE.to_string());

        Ok(Self {
            database_path,
            user_id,
            log_directive,
        })
    }
}

fn parse_user_id(raw: &str) -> Result<i64, ConfigError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ConfigError::InvalidUserId {
            var: USER_ID_VAR,
            value: raw.to_string(),
        }),
    }
}

/// `<project>/data/nutrilog.db`, resolved from the executable location
fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(root) = path.parent().and_then(|p| p.parent()) {
            path = root.to_path_buf();
        }
    }

    path.push("data");
    path.push("nutrilog.db");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.user_id, 1);
        assert_eq!(cfg.log_directive, DEFAULT_LOG_DIRECTIVE);
        assert!(cfg.database_path.ends_with("data/nutrilog.db"));
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            (DATABASE_PATH_VAR, "/tmp/n.db"),
            (USER_ID_VAR, " 7 "),
            (LOG_VAR, "nutrilog=debug"),
        ])
        .unwrap();
        assert_eq!(cfg.database_path, PathBuf::from("/tmp/n.db"));
        assert_eq!(cfg.user_id, 7);
        assert_eq!(cfg.log_directive, "nutrilog=debug");
    }

    #[test]
    fn test_invalid_user_id() {
        for bad in ["0", "-3", "abc", ""] {
            assert!(matches!(
                config(&[(USER_ID_VAR, bad)]),
                Err(ConfigError::InvalidUserId { .. })
            ));
        }
    }
}
