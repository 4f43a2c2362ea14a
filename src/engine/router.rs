// src/engine/router.rs

//! Turns one process's event stream into addressed messages for its owner.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, trace, warn};

use crate::engine::hub::EventHub;
use crate::engine::registry::ExecutionRegistry;
use crate::engine::session::{Completion, ExecutionSession};
use crate::engine::ExecutionEvent;
use crate::exec::ProcessEvent;
use crate::types::{ExecutionKind, OutputStream};

/// Single consumer of a process's [`ProcessEvent`]s.
///
/// Publishes, for the session's owner only:
/// 1. one `execution_started`,
/// 2. `process_output` / `terminal_output` chunks in arrival order while the
///    session is live,
/// 3. exactly one `execution_completed`, after which the router stops.
///
/// The router is the only publisher for its session, so a natural exit and a
/// cancellation can never both announce a completion.
pub struct OutputRouter {
    session: Arc<ExecutionSession>,
    events: mpsc::Receiver<ProcessEvent>,
    hub: Arc<EventHub>,
    registry: Arc<ExecutionRegistry>,
}

impl OutputRouter {
    pub fn new(
        session: Arc<ExecutionSession>,
        events: mpsc::Receiver<ProcessEvent>,
        hub: Arc<EventHub>,
        registry: Arc<ExecutionRegistry>,
    ) -> Self {
        Self {
            session,
            events,
            hub,
            registry,
        }
    }

    /// Route events until the process has exited; returns what was announced.
    pub async fn run(mut self) -> Completion {
        self.hub.publish(
            &self.session.owner_id,
            ExecutionEvent::ExecutionStarted {
                id: self.session.id,
                filename: self.session.label.filename.clone(),
                project: self.session.label.project.clone(),
            },
        );

        let (code, terminated) = loop {
            match self.events.recv().await {
                Some(ProcessEvent::Output { stream, data }) => self.forward(stream, data),
                Some(ProcessEvent::Exited { code, terminated }) => break (code, terminated),
                None => {
                    warn!(
                        execution_id = %self.session.id,
                        "process event channel closed without an exit event"
                    );
                    break (-1, false);
                }
            }
        };

        self.finish(code, terminated)
    }

    fn forward(&self, stream: OutputStream, data: String) {
        let id = self.session.id;
        let event = match self.session.kind {
            ExecutionKind::RunFile => ExecutionEvent::ProcessOutput { id, stream, data },
            ExecutionKind::RunCommand => ExecutionEvent::TerminalOutput { id, stream, data },
        };

        let live = self.session.if_live(|| {
            self.hub.publish(&self.session.owner_id, event);
        });
        if !live {
            trace!(execution_id = %id, ?stream, "dropping output of finished session");
        }
    }

    fn finish(&self, code: i32, terminated: bool) -> Completion {
        let id = self.session.id;
        self.registry.remove(&id);

        let completion = self.session.complete_with(code, terminated, |completion| {
            self.hub.publish(
                &self.session.owner_id,
                ExecutionEvent::ExecutionCompleted {
                    id,
                    exit_code: completion.exit_code,
                    success: completion.success(),
                    terminated: completion.terminated.then_some(true),
                },
            );
            completion
        });

        info!(
            execution_id = %id,
            owner = %self.session.owner_id,
            exit_code = completion.exit_code,
            success = completion.success(),
            terminated = completion.terminated,
            state = ?self.session.state(),
            "execution completed"
        );

        completion
    }
}
