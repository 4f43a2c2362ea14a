use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of an authenticated user, as produced by the identity service.
pub type OwnerId = String;

/// Opaque, collision-resistant execution token handed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(Uuid);

impl ExecutionId {
    pub fn new() -> Self {
        ExecutionId(Uuid::new_v4())
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ExecutionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(ExecutionId)
            .map_err(|e| format!("invalid execution id '{s}': {e}"))
    }
}

/// What kind of request started a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionKind {
    /// A single source file run through an interpreter.
    RunFile,
    /// A freeform command line run through the shell.
    RunCommand,
}

/// Lifecycle of a session.
///
/// `Pending -> Running -> {Completed, Failed, Terminated}`; nothing leaves a
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionState {
    Pending,
    Running,
    Completed,
    Failed,
    Terminated,
}

impl ExecutionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionState::Completed | ExecutionState::Failed | ExecutionState::Terminated
        )
    }
}

/// Which of the two child streams a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Project subdirectory a command run executes in.
///
/// - `Frontend`: the project's `client/` directory (must exist).
/// - `Backend`: `server/` when present, otherwise the project root.
/// - `Root`: the project root (default). `both` is accepted as an alias,
///   since older clients send it as their default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandRole {
    Frontend,
    Backend,
    #[default]
    Root,
}

impl FromStr for CommandRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "frontend" => Ok(CommandRole::Frontend),
            "backend" => Ok(CommandRole::Backend),
            "root" | "both" => Ok(CommandRole::Root),
            other => Err(format!(
                "invalid command type: {other} (expected \"frontend\", \"backend\" or \"root\")"
            )),
        }
    }
}

/// Languages a single file can be run as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JavaScript,
    Python,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "javascript" => Ok(Language::JavaScript),
            "python" => Ok(Language::Python),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::JavaScript => f.write_str("javascript"),
            Language::Python => f.write_str("python"),
        }
    }
}
