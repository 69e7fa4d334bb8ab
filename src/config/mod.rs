//! Config loading and persistence.
//!
//! Layers, lowest first: defaults, user config, `japa.toml` in the working
//! directory, environment overrides.

mod load;
mod merge;
mod schema;

use std::path::PathBuf;

use thiserror::Error;

pub use load::{
    config_path, load, load_from, load_local_config, load_user_config, local_config_path,
    write_config,
};
pub use merge::{apply_env_overrides, merge_layers};
pub use schema::{
    ClientConfig, ClientConfigOverride, Config, ConfigLayer, FileLoggingConfig,
    FileLoggingConfigOverride, LogFormat, LogRotation, LoggingConfig, LoggingConfigOverride,
    ServerOverride, ServerSection, SessionOverride, SessionSection, StoreConfig,
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("failed to write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
}
