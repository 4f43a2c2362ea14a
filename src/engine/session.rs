// src/engine/session.rs

//! Execution sessions and their lifecycle.
//!
//! [`SessionStatus`] is the pure state machine; it has no locks, channels or
//! IO and can be tested on its own. [`ExecutionSession`] wraps it in a mutex
//! shared by the session's router and by cancellation, so that "process
//! exited" and "user cancelled" are serialized and only the first terminal
//! transition counts.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::exec::LaunchSpec;
use crate::types::{ExecutionId, ExecutionKind, ExecutionState, OwnerId};

/// Exit code reported for terminated sessions.
pub const TERMINATED_EXIT_CODE: i32 = -1;

/// Descriptive metadata sent with `execution_started`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLabel {
    pub filename: Option<String>,
    pub project: String,
}

/// Outcome announced in `execution_completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub exit_code: i32,
    pub terminated: bool,
}

impl Completion {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// State and exit code of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    state: ExecutionState,
    exit_code: Option<i32>,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStatus {
    pub fn new() -> Self {
        Self {
            state: ExecutionState::Pending,
            exit_code: None,
        }
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// `Pending -> Running`. Returns `false` from any other state.
    pub fn start(&mut self) -> bool {
        if self.state == ExecutionState::Pending {
            self.state = ExecutionState::Running;
            true
        } else {
            false
        }
    }

    /// Move a live session to `Terminated`.
    ///
    /// Returns `false` if the session had already reached a terminal state.
    pub fn terminate(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = ExecutionState::Terminated;
        self.exit_code = Some(TERMINATED_EXIT_CODE);
        true
    }

    /// Apply the process exit and return what should be announced.
    ///
    /// A session already terminated by request stays terminated regardless of
    /// the code the process actually exited with.
    pub fn finish(&mut self, code: i32, terminated: bool) -> Completion {
        if !self.state.is_terminal() {
            if terminated {
                self.terminate();
            } else {
                self.state = if code == 0 {
                    ExecutionState::Completed
                } else {
                    ExecutionState::Failed
                };
                self.exit_code = Some(code);
            }
        }

        match self.state {
            ExecutionState::Terminated => Completion {
                exit_code: TERMINATED_EXIT_CODE,
                terminated: true,
            },
            _ => Completion {
                exit_code: self.exit_code.unwrap_or(code),
                terminated: false,
            },
        }
    }
}

/// The record tracking one spawned process from launch to terminal state.
#[derive(Debug)]
pub struct ExecutionSession {
    pub id: ExecutionId,
    pub owner_id: OwnerId,
    pub kind: ExecutionKind,
    pub command: String,
    pub args: Vec<String>,
    pub working_directory: PathBuf,
    pub label: SessionLabel,
    pub started_at: SystemTime,
    status: Mutex<SessionStatus>,
}

impl ExecutionSession {
    pub fn new(
        id: ExecutionId,
        owner_id: OwnerId,
        kind: ExecutionKind,
        spec: &LaunchSpec,
        label: SessionLabel,
    ) -> Self {
        Self {
            id,
            owner_id,
            kind,
            command: spec.program.clone(),
            args: spec.args.clone(),
            working_directory: spec.working_directory.clone(),
            label,
            started_at: SystemTime::now(),
            status: Mutex::new(SessionStatus::new()),
        }
    }

    fn status(&self) -> MutexGuard<'_, SessionStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ExecutionState {
        self.status().state()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.status().exit_code()
    }

    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner_id == owner
    }

    pub fn mark_running(&self) -> bool {
        self.status().start()
    }

    /// Cancellation side of the state machine; see [`SessionStatus::terminate`].
    pub fn request_termination(&self) -> bool {
        self.status().terminate()
    }

    /// Run `f` only while the session is not terminal, holding the state lock
    /// so a concurrent termination cannot slip in between check and `f`.
    pub fn if_live(&self, f: impl FnOnce()) -> bool {
        let status = self.status();
        if status.state().is_terminal() {
            return false;
        }
        f();
        true
    }

    /// Apply the process exit and hand the resulting completion to
    /// `announce` while still holding the state lock.
    pub fn complete_with<R>(
        &self,
        code: i32,
        terminated: bool,
        announce: impl FnOnce(Completion) -> R,
    ) -> R {
        let mut status = self.status();
        let completion = status.finish(code, terminated);
        announce(completion)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let status = *self.status();
        SessionSnapshot {
            id: self.id,
            kind: self.kind,
            state: status.state(),
            exit_code: status.exit_code(),
            command: self.command.clone(),
            args: self.args.clone(),
            working_directory: self.working_directory.to_string_lossy().into_owned(),
            project: self.label.project.clone(),
            filename: self.label.filename.clone(),
            started_at_ms: self
                .started_at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
        }
    }
}

/// Point-in-time view of a session, safe to hand to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: ExecutionId,
    pub kind: ExecutionKind,
    pub state: ExecutionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub command: String,
    pub args: Vec<String>,
    pub working_directory: String,
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub started_at_ms: u64,
}
