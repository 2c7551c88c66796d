//! Default paths for examclock components
//!
//! Paths are user-writable by default (no root required):
//! - Socket: `$XDG_RUNTIME_DIR/examclock/examclockd.sock` or `/tmp/examclock-$USER/examclockd.sock`
//! - Data: `$XDG_DATA_HOME/examclock` or `~/.local/share/examclock`
//! - Config: `$XDG_CONFIG_HOME/examclock/config.toml` or `~/.config/examclock/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the socket path
pub const EXAMCLOCK_SOCKET_ENV: &str = "EXAMCLOCK_SOCKET";

/// Environment variable for overriding the data directory
pub const EXAMCLOCK_DATA_DIR_ENV: &str = "EXAMCLOCK_DATA_DIR";

/// Environment variable for overriding the config file
pub const EXAMCLOCK_CONFIG_ENV: &str = "EXAMCLOCK_CONFIG";

const SOCKET_FILENAME: &str = "examclockd.sock";
const CONFIG_FILENAME: &str = "config.toml";
const DATABASE_FILENAME: &str = "examclock.db";
const REPORTS_DIR: &str = "logs";

const APP_DIR: &str = "examclock";

/// Get the default socket path.
///
/// Order of precedence:
/// 1. `$EXAMCLOCK_SOCKET` environment variable (if set)
/// 2. `$XDG_RUNTIME_DIR/examclock/examclockd.sock` (if XDG_RUNTIME_DIR is set)
/// 3. `/tmp/examclock-$USER/examclockd.sock` (fallback)
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(EXAMCLOCK_SOCKET_ENV) {
        return PathBuf::from(path);
    }

    socket_path_without_env()
}

/// Get the socket path without checking the EXAMCLOCK_SOCKET env var.
/// Used for config defaults where the env var is checked separately by clap.
pub fn socket_path_without_env() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(APP_DIR).join(SOCKET_FILENAME);
    }

    let username = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/{}-{}", APP_DIR, username)).join(SOCKET_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$EXAMCLOCK_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/examclock` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/examclock` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(EXAMCLOCK_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking the EXAMCLOCK_DATA_DIR env var.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Get the default configuration file path.
///
/// Order of precedence:
/// 1. `$EXAMCLOCK_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/examclock/config.toml`
/// 3. `~/.config/examclock/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(EXAMCLOCK_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Path of the SQLite database inside a data directory
pub fn database_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join(DATABASE_FILENAME)
}

/// Directory where rendered session logs are written
pub fn reports_dir(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join(REPORTS_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_path_contains_app_dir() {
        let path = socket_path_without_env();
        assert!(path.to_string_lossy().contains("examclock"));
        assert!(path.to_string_lossy().ends_with(".sock"));
    }

    #[test]
    fn data_dir_contains_app_dir() {
        let path = data_dir_without_env();
        assert!(path.to_string_lossy().contains("examclock"));
    }

    #[test]
    fn database_and_reports_live_under_data_dir() {
        let data = PathBuf::from("/var/lib/examclock");
        assert_eq!(database_path(&data), data.join("examclock.db"));
        assert_eq!(reports_dir(&data), data.join("logs"));
    }
}
