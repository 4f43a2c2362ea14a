// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The launcher talks to a `ProcessBackend` instead of spawning processes
//! directly. This makes it easy to swap in a fake backend in tests while
//! keeping the production implementation in [`supervisor`](super::supervisor).
//!
//! Every launched process is represented by:
//! - a [`ProcessHandle`] used to request termination, and
//! - an mpsc receiver of [`ProcessEvent`]s carrying output chunks in producer
//!   order followed by exactly one `Exited` event.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::ExecOptions;
use crate::errors::{Result, RunboxError};
use crate::types::OutputStream;

use super::supervisor::supervise;

/// Fully resolved description of a process to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_directory: PathBuf,
    pub env: Vec<(String, String)>,
    /// Run `program args...` through the platform shell.
    pub shell: bool,
}

impl LaunchSpec {
    /// The command line as the user would read it.
    pub fn display_command(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Events produced by a single running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// A chunk of decoded text from stdout or stderr.
    Output { stream: OutputStream, data: String },
    /// The process is gone and both streams are drained. Always last.
    Exited { code: i32, terminated: bool },
}

/// Handle used to ask a running process to stop.
///
/// Cloning is cheap; all clones address the same process.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    kill_tx: mpsc::Sender<()>,
    pid: Option<u32>,
}

impl ProcessHandle {
    pub fn new(kill_tx: mpsc::Sender<()>, pid: Option<u32>) -> Self {
        Self { kill_tx, pid }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Request termination. Returns `false` if the process already finished
    /// or a termination request is already pending.
    pub fn terminate(&self) -> bool {
        match self.kill_tx.try_send(()) {
            Ok(()) => true,
            Err(e) => {
                debug!(pid = ?self.pid, error = %e, "termination request not delivered");
                false
            }
        }
    }
}

/// A successfully started process.
#[derive(Debug)]
pub struct LaunchedProcess {
    pub spec: LaunchSpec,
    pub handle: ProcessHandle,
    pub events: mpsc::Receiver<ProcessEvent>,
}

/// Trait abstracting how processes are started.
///
/// Production code uses [`RealProcessBackend`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait ProcessBackend: Send + Sync {
    /// Start the process described by `spec`.
    ///
    /// Must fail synchronously with `SpawnFailure` if the OS cannot start it;
    /// a later non-zero exit is reported through `ProcessEvent::Exited`.
    fn spawn(&self, spec: LaunchSpec) -> Result<LaunchedProcess>;
}

/// Real backend used in production, built on `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct RealProcessBackend {
    options: ExecOptions,
}

impl RealProcessBackend {
    pub fn new(options: ExecOptions) -> Self {
        Self { options }
    }
}

impl ProcessBackend for RealProcessBackend {
    fn spawn(&self, spec: LaunchSpec) -> Result<LaunchedProcess> {
        let mut cmd = build_command(&spec);

        let child = cmd.spawn().map_err(|source| RunboxError::SpawnFailure {
            program: spec.program.clone(),
            source,
        })?;

        let pid = child.id();
        info!(
            pid = ?pid,
            cmd = %spec.display_command(),
            cwd = ?spec.working_directory,
            "process started"
        );

        let (events_tx, events_rx) = mpsc::channel(self.options.event_buffer);
        let (kill_tx, kill_rx) = mpsc::channel(1);

        tokio::spawn(supervise(child, kill_rx, events_tx, self.options));

        Ok(LaunchedProcess {
            spec,
            handle: ProcessHandle::new(kill_tx, pid),
            events: events_rx,
        })
    }
}

/// Build the `Command` for a spec: either a direct exec or a shell command
/// appropriate for the platform.
fn build_command(spec: &LaunchSpec) -> Command {
    let mut cmd = if !spec.shell {
        let mut c = Command::new(&spec.program);
        c.args(&spec.args);
        c
    } else if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(spec.display_command());
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(spec.display_command());
        c
    };

    cmd.current_dir(&spec.working_directory)
        .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Own process group, so termination reaches everything the shell started.
    #[cfg(unix)]
    cmd.process_group(0);

    cmd
}
