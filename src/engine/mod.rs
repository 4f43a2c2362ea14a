// src/engine/mod.rs

//! Execution orchestration engine.
//!
//! This module ties together:
//! - the session state machine ([`session`])
//! - the registry of in-flight sessions ([`registry`])
//! - per-owner event rooms ([`hub`])
//! - one output router per process ([`router`])
//! - the façade handling run/stop requests ([`orchestrator`])

use serde::Serialize;

use crate::types::{ExecutionId, OutputStream};

/// Messages delivered to an owner's event channel.
///
/// Serialized with an `event` tag, e.g.
/// `{"event":"process_output","id":"…","type":"stdout","data":"hi\n"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
    ExecutionStarted {
        id: ExecutionId,
        #[serde(skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
        project: String,
    },
    /// Output of a single-file run.
    ProcessOutput {
        id: ExecutionId,
        #[serde(rename = "type")]
        stream: OutputStream,
        data: String,
    },
    /// Output of a freeform command run.
    TerminalOutput {
        id: ExecutionId,
        #[serde(rename = "type")]
        stream: OutputStream,
        data: String,
    },
    ExecutionCompleted {
        id: ExecutionId,
        #[serde(rename = "exitCode")]
        exit_code: i32,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        terminated: Option<bool>,
    },
}

impl ExecutionEvent {
    pub fn id(&self) -> ExecutionId {
        match self {
            ExecutionEvent::ExecutionStarted { id, .. }
            | ExecutionEvent::ProcessOutput { id, .. }
            | ExecutionEvent::TerminalOutput { id, .. }
            | ExecutionEvent::ExecutionCompleted { id, .. } => *id,
        }
    }

    pub fn is_output(&self) -> bool {
        matches!(
            self,
            ExecutionEvent::ProcessOutput { .. } | ExecutionEvent::TerminalOutput { .. }
        )
    }

    pub fn is_completion(&self) -> bool {
        matches!(self, ExecutionEvent::ExecutionCompleted { .. })
    }
}

pub mod hub;
pub mod orchestrator;
pub mod registry;
pub mod router;
pub mod session;

pub use hub::EventHub;
pub use orchestrator::{CommandRunRequest, CommandRunStarted, ExecutionOrchestrator, FileRunRequest};
pub use registry::{ExecutionRegistry, RegistryEntry};
pub use router::OutputRouter;
pub use session::{Completion, ExecutionSession, SessionLabel, SessionSnapshot, SessionStatus};
