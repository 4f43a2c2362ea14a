// src/config/mod.rs

//! Configuration loading and validation for runbox.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and apply env overrides (`loader.rs`).
//! - Validate it into the runtime [`ConfigFile`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{apply_secret_override, default_config_path, load_and_validate, load_from_path};
pub use model::{
    AuthSection, ConfigFile, ExecOptions, ExecSection, Interpreters, ProjectsSection,
    RawConfigFile, ServerSection,
};
pub use validate::{parse_duration, validate_config};
