// src/exec/launcher.rs

//! Resolve run requests into concrete launch specs and start them.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::config::Interpreters;
use crate::errors::{Result, RunboxError};
use crate::exec::backend::{LaunchSpec, LaunchedProcess, ProcessBackend};
use crate::types::Language;

/// Turns validated requests into running processes.
#[derive(Clone)]
pub struct ProcessLauncher {
    backend: Arc<dyn ProcessBackend>,
    interpreters: Interpreters,
}

impl std::fmt::Debug for ProcessLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessLauncher")
            .field("interpreters", &self.interpreters)
            .finish_non_exhaustive()
    }
}

impl ProcessLauncher {
    pub fn new(backend: Arc<dyn ProcessBackend>, interpreters: Interpreters) -> Self {
        Self {
            backend,
            interpreters,
        }
    }

    /// Run a single source file with the interpreter for `language`.
    ///
    /// The process runs in the file's containing directory.
    pub fn launch_file(&self, file_path: &Path, language: &str) -> Result<LaunchedProcess> {
        let spec = self.file_spec(file_path, language)?;
        self.backend.spawn(spec)
    }

    /// Run a freeform command line through the shell in `working_directory`.
    pub fn launch_command(
        &self,
        raw_command_line: &str,
        working_directory: &Path,
    ) -> Result<LaunchedProcess> {
        let spec = command_spec(raw_command_line, working_directory)?;
        self.backend.spawn(spec)
    }

    /// Build the spec for a file run without starting anything.
    pub fn file_spec(&self, file_path: &Path, language: &str) -> Result<LaunchSpec> {
        let language: Language = language
            .parse()
            .map_err(RunboxError::UnsupportedLanguage)?;

        let working_directory = file_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                RunboxError::InvalidInput(format!("{:?} has no parent directory", file_path))
            })?;

        let (program, env) = match language {
            Language::JavaScript => (
                self.interpreters.javascript.clone(),
                vec![("NODE_OPTIONS".to_string(), "--no-warnings".to_string())],
            ),
            Language::Python => (self.interpreters.python.clone(), Vec::new()),
        };

        debug!(%language, program = %program, file = ?file_path, "resolved file run");

        Ok(LaunchSpec {
            program,
            args: vec![file_path.to_string_lossy().into_owned()],
            working_directory,
            env,
            shell: false,
        })
    }
}

/// Build the spec for a command run without starting anything.
pub fn command_spec(raw_command_line: &str, working_directory: &Path) -> Result<LaunchSpec> {
    let (program, args) = split_command_line(raw_command_line)
        .ok_or_else(|| RunboxError::InvalidInput("command is required".to_string()))?;

    Ok(LaunchSpec {
        program,
        args,
        working_directory: working_directory.to_path_buf(),
        env: Vec::new(),
        shell: true,
    })
}

/// Split a command line on whitespace into a program and its arguments.
///
/// Quoting is left to the shell the command eventually runs under.
pub fn split_command_line(raw: &str) -> Option<(String, Vec<String>)> {
    let mut parts = raw.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}
