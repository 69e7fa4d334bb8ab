use std::fs;
use std::path::{Path, PathBuf};

use super::merge::{apply_env_overrides, merge_layers};
use super::{Config, ConfigError, ConfigLayer};

pub fn config_path() -> PathBuf {
    crate::paths::config_dir().join("config.toml")
}

pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join("japa.toml")
}

pub fn load_user_config() -> Result<Option<ConfigLayer>, ConfigError> {
    read_layer(&config_path())
}

pub fn load_local_config(dir: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    read_layer(&local_config_path(dir))
}

fn read_layer(path: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

pub fn load() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().ok();
    load_from(cwd.as_deref())
}

pub fn load_from(local_dir: Option<&Path>) -> Result<Config, ConfigError> {
    let user = load_user_config()?;
    let local = match local_dir {
        Some(dir) => load_local_config(dir)?,
        None => None,
    };
    let mut config = merge_layers(user, local);
    apply_env_overrides(&mut config);
    Ok(config)
}

pub fn write_config(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| ConfigError::Write {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
    }
    let contents = toml::to_string_pretty(cfg)?;
    atomic_write(path, contents.as_bytes())
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<(), ConfigError> {
    let write_error = |reason: String| ConfigError::Write {
        path: path.to_path_buf(),
        reason,
    };
    let dir = path
        .parent()
        .ok_or_else(|| write_error("config path missing parent directory".to_string()))?;
    let temp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| write_error(format!("failed to create temp file: {e}")))?;
    fs::write(temp.path(), data)
        .map_err(|e| write_error(format!("failed to write temp file: {e}")))?;
    temp.persist(path)
        .map_err(|e| write_error(format!("failed to persist: {}", e.error)))?;
    Ok(())
}
