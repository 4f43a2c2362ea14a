// src/config/model.rs

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::config::validate::validate_config;
use crate::errors::RunboxError;

/// Configuration exactly as read from a TOML file.
///
/// ```toml
/// [server]
/// listen = "127.0.0.1:5000"
///
/// [auth]
/// jwt_secret = "change-me"
///
/// [projects]
/// root = "user_data"
///
/// [exec]
/// grace_period = "3s"
/// drain_timeout = "2s"
/// event_buffer = 256
///
/// [interpreters]
/// python = "python3"
/// ```
///
/// All sections are optional and have reasonable defaults, except that a JWT
/// secret must come from either `[auth]` or `RUNBOX_JWT_SECRET`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub auth: AuthSection,

    #[serde(default)]
    pub projects: ProjectsSection,

    #[serde(default)]
    pub exec: ExecSection,

    #[serde(default)]
    pub interpreters: Interpreters,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Socket address the HTTP server binds to.
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_listen() -> String {
    "127.0.0.1:5000".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// `[auth]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthSection {
    /// HS256 secret used to verify bearer tokens.
    #[serde(default)]
    pub jwt_secret: Option<String>,
}

/// `[projects]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectsSection {
    /// Directory holding `<owner>/<project>` trees.
    #[serde(default = "default_projects_root")]
    pub root: PathBuf,
}

fn default_projects_root() -> PathBuf {
    PathBuf::from("user_data")
}

impl Default for ProjectsSection {
    fn default() -> Self {
        Self {
            root: default_projects_root(),
        }
    }
}

/// `[exec]` section. Durations use the `"250ms"`, `"3s"`, `"1m"` syntax.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecSection {
    /// How long a cancelled process gets after SIGTERM before SIGKILL.
    #[serde(default = "default_grace_period")]
    pub grace_period: String,

    /// How long to wait for stdout/stderr to reach EOF after the process
    /// exits before giving up on the remaining output.
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout: String,

    /// Capacity of each process's event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_grace_period() -> String {
    "3s".to_string()
}

fn default_drain_timeout() -> String {
    "2s".to_string()
}

fn default_event_buffer() -> usize {
    256
}

impl Default for ExecSection {
    fn default() -> Self {
        Self {
            grace_period: default_grace_period(),
            drain_timeout: default_drain_timeout(),
            event_buffer: default_event_buffer(),
        }
    }
}

/// `[interpreters]` section: which binary runs each supported language.
///
/// The set of languages is fixed; only the binaries are configurable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Interpreters {
    #[serde(default = "default_javascript")]
    pub javascript: String,

    #[serde(default = "default_python")]
    pub python: String,
}

fn default_javascript() -> String {
    "node".to_string()
}

fn default_python() -> String {
    "python".to_string()
}

impl Default for Interpreters {
    fn default() -> Self {
        Self {
            javascript: default_javascript(),
            python: default_python(),
        }
    }
}

/// Process-execution tunables used by the process backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOptions {
    pub grace_period: Duration,
    pub drain_timeout: Duration,
    pub event_buffer: usize,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(3),
            drain_timeout: Duration::from_secs(2),
            event_buffer: default_event_buffer(),
        }
    }
}

/// Validated configuration used by the rest of the application.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub listen: SocketAddr,
    pub jwt_secret: String,
    pub projects_root: PathBuf,
    pub exec: ExecOptions,
    pub interpreters: Interpreters,
}

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RunboxError;

    fn try_from(raw: RawConfigFile) -> Result<Self, Self::Error> {
        validate_config(raw)
    }
}
