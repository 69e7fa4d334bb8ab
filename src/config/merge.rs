use std::net::SocketAddr;
use std::path::PathBuf;

use super::{Config, ConfigLayer};

pub fn merge_layers(user: Option<ConfigLayer>, local: Option<ConfigLayer>) -> Config {
    let mut config = Config::default();
    if let Some(layer) = user {
        layer.apply_to(&mut config);
    }
    if let Some(layer) = local {
        layer.apply_to(&mut config);
    }
    config
}

fn env_value(key: &str) -> Option<String> {
    let raw = std::env::var(key).ok()?;
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Runs before telemetry is up, so rejected values go straight to stderr.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(raw) = env_value("JAPA_LISTEN_ADDR") {
        match raw.parse::<SocketAddr>() {
            Ok(addr) => config.server.listen_addr = addr,
            Err(err) => eprintln!("invalid JAPA_LISTEN_ADDR {raw:?}, ignoring: {err}"),
        }
    }

    if let Some(raw) = env_value("JAPA_BASE_URL") {
        config.client.base_url = raw;
    }

    if let Some(raw) = env_value("JAPA_STORE_PATH") {
        config.store.path = Some(PathBuf::from(raw));
    }

    if let Some(raw) = env_value("JAPA_DEBOUNCE_MS") {
        match raw.parse::<u64>() {
            Ok(value) => config.session.debounce_ms = value,
            Err(err) => eprintln!("invalid JAPA_DEBOUNCE_MS {raw:?}, ignoring: {err}"),
        }
    }
}
