// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Environment variable that overrides `[auth].jwt_secret`.
pub const JWT_SECRET_ENV: &str = "RUNBOX_JWT_SECRET";

/// Load a configuration file from a given path and return the raw config.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load, apply environment overrides, and validate.
///
/// When `allow_missing` is set and nothing exists at `path`, built-in
/// defaults are used instead (the JWT secret must then come from the
/// environment).
pub fn load_and_validate(path: impl AsRef<Path>, allow_missing: bool) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw = if allow_missing && !path.exists() {
        info!(path = ?path, "no config file found; using defaults");
        RawConfigFile::default()
    } else {
        load_from_path(path)?
    };

    let raw = apply_secret_override(raw, std::env::var(JWT_SECRET_ENV).ok());
    ConfigFile::try_from(raw)
}

/// Replace the configured JWT secret with `env_value` when one is given.
pub fn apply_secret_override(mut raw: RawConfigFile, env_value: Option<String>) -> RawConfigFile {
    if let Some(secret) = env_value.filter(|s| !s.trim().is_empty()) {
        raw.auth.jwt_secret = Some(secret);
    }
    raw
}

/// Config path used when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Runbox.toml")
}
