//! Runtime configuration resolved from the environment.
//!
//! | Variable              | Default                         |
//! |-----------------------|---------------------------------|
//! | `DAYLIST_DB_PATH`     | `<temp_dir>/daylist.sqlite3`    |
//! | `DAYLIST_LOG_DIR`     | `<temp_dir>/daylist-logs`       |
//! | `DAYLIST_LOG_LEVEL`   | `default_log_level()`           |
//! | `DAYLIST_STORAGE_KEY` | `tasks`                         |
//!
//! Blank values fall back to the default.

use crate::logging::default_log_level;
use crate::repo::task_repo::DEFAULT_STORAGE_KEY;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "DAYLIST_DB_PATH";
pub const ENV_LOG_DIR: &str = "DAYLIST_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "DAYLIST_LOG_LEVEL";
pub const ENV_STORAGE_KEY: &str = "DAYLIST_STORAGE_KEY";

const DEFAULT_DB_FILE_NAME: &str = "daylist.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "daylist-logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite file backing the key-value store.
    pub db_path: PathBuf,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
    pub log_level: String,
    /// Key the task collection is stored under.
    pub storage_key: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let temp_dir = std::env::temp_dir();
        Self {
            db_path: temp_dir.join(DEFAULT_DB_FILE_NAME),
            log_dir: temp_dir.join(DEFAULT_LOG_DIR_NAME),
            log_level: default_log_level().to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl CoreConfig {
    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|trimmed| !trimmed.is_empty())
        };
        let defaults = Self::default();

        Self {
            db_path: value(ENV_DB_PATH).map_or(defaults.db_path, PathBuf::from),
            log_dir: value(ENV_LOG_DIR).map_or(defaults.log_dir, PathBuf::from),
            log_level: value(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            storage_key: value(ENV_STORAGE_KEY).unwrap_or(defaults.storage_key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, ENV_DB_PATH, ENV_LOG_LEVEL, ENV_STORAGE_KEY};
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn missing_values_use_defaults() {
        let config = CoreConfig::from_lookup(|_| None);
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.storage_key, "tasks");
    }

    #[test]
    fn set_values_override_and_blank_values_fall_back() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DB_PATH, " /data/daylist.db "),
            (ENV_LOG_LEVEL, "   "),
            (ENV_STORAGE_KEY, "today"),
        ]);
        let config = CoreConfig::from_lookup(|name| env.get(name).map(|v| (*v).to_string()));

        assert_eq!(config.db_path, PathBuf::from("/data/daylist.db"));
        assert_eq!(config.log_level, CoreConfig::default().log_level);
        assert_eq!(config.storage_key, "today");
    }
}
