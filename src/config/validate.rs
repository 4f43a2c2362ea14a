// src/config/validate.rs

use std::net::SocketAddr;
use std::time::Duration;

use crate::config::model::{ConfigFile, ExecOptions, ExecSection, Interpreters, RawConfigFile};
use crate::errors::{Result, RunboxError};

/// Turn a raw TOML config into a [`ConfigFile`].
///
/// This checks:
/// - `server.listen` parses as a socket address
/// - a non-empty JWT secret is present
/// - both durations in `[exec]` parse, and `event_buffer >= 1`
/// - no interpreter binary is blank
pub fn validate_config(raw: RawConfigFile) -> Result<ConfigFile> {
    let listen = parse_listen(&raw.server.listen)?;
    let jwt_secret = require_secret(raw.auth.jwt_secret)?;
    let exec = validate_exec(&raw.exec)?;
    validate_interpreters(&raw.interpreters)?;

    Ok(ConfigFile {
        listen,
        jwt_secret,
        projects_root: raw.projects.root,
        exec,
        interpreters: raw.interpreters,
    })
}

fn parse_listen(s: &str) -> Result<SocketAddr> {
    s.trim().parse().map_err(|e| {
        RunboxError::ConfigError(format!("[server].listen '{s}' is not a socket address: {e}"))
    })
}

fn require_secret(secret: Option<String>) -> Result<String> {
    match secret {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(RunboxError::ConfigError(
            "[auth].jwt_secret must be set (or provide RUNBOX_JWT_SECRET)".to_string(),
        )),
    }
}

fn validate_exec(exec: &ExecSection) -> Result<ExecOptions> {
    let grace_period = parse_duration(&exec.grace_period).map_err(|e| {
        RunboxError::ConfigError(format!("invalid [exec].grace_period: {e}"))
    })?;
    let drain_timeout = parse_duration(&exec.drain_timeout).map_err(|e| {
        RunboxError::ConfigError(format!("invalid [exec].drain_timeout: {e}"))
    })?;

    if exec.event_buffer == 0 {
        return Err(RunboxError::ConfigError(
            "[exec].event_buffer must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(ExecOptions {
        grace_period,
        drain_timeout,
        event_buffer: exec.event_buffer,
    })
}

fn validate_interpreters(interpreters: &Interpreters) -> Result<()> {
    for (language, binary) in [
        ("javascript", &interpreters.javascript),
        ("python", &interpreters.python),
    ] {
        if binary.trim().is_empty() {
            return Err(RunboxError::ConfigError(format!(
                "[interpreters].{language} must not be empty"
            )));
        }
    }
    Ok(())
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
