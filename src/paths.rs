//! XDG directory helpers for config/data locations.

use std::path::PathBuf;

/// Base directory for persistent data (done-set file, logs).
///
/// Uses `JAPA_DATA_DIR` if set, otherwise `$XDG_DATA_HOME/japa` or
/// `~/.local/share/japa`.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = env_dir("JAPA_DATA_DIR") {
        return dir;
    }

    env_dir("XDG_DATA_HOME")
        .unwrap_or_else(|| home().join(".local").join("share"))
        .join("japa")
}

/// Base directory for configuration files.
///
/// Uses `JAPA_CONFIG_DIR` if set, otherwise `$XDG_CONFIG_HOME/japa` or
/// `~/.config/japa`.
pub fn config_dir() -> PathBuf {
    if let Some(dir) = env_dir("JAPA_CONFIG_DIR") {
        return dir;
    }

    env_dir("XDG_CONFIG_HOME")
        .unwrap_or_else(|| home().join(".config"))
        .join("japa")
}

/// Default directory for rolling log files.
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

fn env_dir(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"))
}
