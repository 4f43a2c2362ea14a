// src/engine/orchestrator.rs

//! Request validation, authorization and lifecycle coordination.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::engine::hub::EventHub;
use crate::engine::registry::ExecutionRegistry;
use crate::engine::router::OutputRouter;
use crate::engine::session::{Completion, ExecutionSession, SessionLabel, SessionSnapshot};
use crate::errors::{Result, RunboxError};
use crate::exec::{LaunchedProcess, ProcessLauncher};
use crate::projects::{Project, ProjectDirectory};
use crate::types::{CommandRole, ExecutionId, ExecutionKind, OwnerId};

/// Run a single file of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRunRequest {
    pub owner: OwnerId,
    pub project: String,
    /// Path relative to the project root.
    pub file: String,
    pub language: String,
}

/// Run a freeform command inside a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRunRequest {
    pub owner: OwnerId,
    pub project: String,
    pub command: String,
    /// `frontend`, `backend` or `root`; `None` means `root`.
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRunStarted {
    pub id: ExecutionId,
    pub working_directory: PathBuf,
}

/// The façade behind the HTTP layer.
///
/// Owns the registry and shares the event hub with subscribers. Start
/// operations return as soon as the process is running; output and
/// completion arrive asynchronously through the hub.
#[derive(Debug)]
pub struct ExecutionOrchestrator {
    launcher: ProcessLauncher,
    projects: Arc<dyn ProjectDirectory>,
    registry: Arc<ExecutionRegistry>,
    hub: Arc<EventHub>,
    /// One router task per admitted run; finished ones are reaped on admit.
    routers: Mutex<JoinSet<Completion>>,
}

impl ExecutionOrchestrator {
    pub fn new(
        launcher: ProcessLauncher,
        projects: Arc<dyn ProjectDirectory>,
        hub: Arc<EventHub>,
    ) -> Self {
        Self {
            launcher,
            projects,
            registry: Arc::new(ExecutionRegistry::new()),
            hub,
            routers: Mutex::new(JoinSet::new()),
        }
    }

    fn routers(&self) -> MutexGuard<'_, JoinSet<Completion>> {
        self.routers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    pub fn registry(&self) -> &Arc<ExecutionRegistry> {
        &self.registry
    }

    /// Start running `req.file` and return its execution id immediately.
    ///
    /// Fails with `InvalidInput`, `NotFound`, `Forbidden`,
    /// `UnsupportedLanguage` or `SpawnFailure`; nothing is registered then.
    pub fn start_file_run(&self, req: FileRunRequest) -> Result<ExecutionId> {
        let project_name = required(&req.project, "Project name is required")?;
        let file = required(&req.file, "File is required")?;
        let language = required(&req.language, "Language is required")?;

        let project = self.projects.project(&req.owner, project_name)?;
        let file_path = self.projects.resolve_file(&project, file)?;
        debug!(owner = %req.owner, project = %project.name, file = ?file_path, "file run requested");

        let launched = self.launcher.launch_file(&file_path, language)?;
        let label = SessionLabel {
            filename: file_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            project: project.name,
        };

        self.admit(&req.owner, ExecutionKind::RunFile, label, launched)
    }

    /// Start a shell command in the directory implied by `req.role`.
    pub fn start_command_run(&self, req: CommandRunRequest) -> Result<CommandRunStarted> {
        let project_name = required(&req.project, "Project name and command are required")?;
        let command = required(&req.command, "Project name and command are required")?;
        let role = match req.role.as_deref().map(str::trim) {
            None | Some("") => CommandRole::default(),
            Some(raw) => raw.parse().map_err(RunboxError::InvalidInput)?,
        };

        let project = self.projects.project(&req.owner, project_name)?;
        let working_directory = self.command_directory(&project, role)?;
        debug!(
            owner = %req.owner,
            project = %project.name,
            ?role,
            cwd = ?working_directory,
            "command run requested"
        );

        let launched = self.launcher.launch_command(command, &working_directory)?;
        let label = SessionLabel {
            filename: None,
            project: project.name,
        };

        let id = self.admit(&req.owner, ExecutionKind::RunCommand, label, launched)?;
        Ok(CommandRunStarted {
            id,
            working_directory,
        })
    }

    /// Cancel `id` on behalf of `owner`.
    ///
    /// The session leaves the registry before this returns; the terminated
    /// `execution_completed` is published asynchronously by its router.
    pub fn stop_run(&self, owner: &str, id: ExecutionId) -> Result<()> {
        let entry = self.registry.take_owned(&id, owner)?;

        if !entry.session.request_termination() {
            debug!(execution_id = %id, "stop requested for a session that already finished");
            return Err(RunboxError::NotFound("Process not found".to_string()));
        }

        if !entry.handle.terminate() {
            debug!(execution_id = %id, "process exited before the termination signal");
        }

        info!(execution_id = %id, owner, "execution terminated by owner");
        Ok(())
    }

    /// Snapshot of one of `owner`'s in-flight sessions.
    pub fn describe_run(&self, owner: &str, id: ExecutionId) -> Result<SessionSnapshot> {
        let entry = self
            .registry
            .lookup(&id)
            .ok_or_else(|| RunboxError::NotFound("Process not found".to_string()))?;

        if !entry.session.is_owned_by(owner) {
            return Err(RunboxError::Forbidden(
                "Not authorized to view this process".to_string(),
            ));
        }

        Ok(entry.session.snapshot())
    }

    /// Snapshots of all of `owner`'s in-flight sessions, oldest first.
    pub fn list_runs(&self, owner: &str) -> Vec<SessionSnapshot> {
        let mut snapshots: Vec<SessionSnapshot> = self
            .registry
            .sessions_of(owner)
            .iter()
            .map(|session| session.snapshot())
            .collect();
        snapshots.sort_by_key(|s| s.started_at_ms);
        snapshots
    }

    /// Terminate every registered session and wait for their completions.
    ///
    /// Returns once every router has announced its completion, which happens
    /// only after the supervisor has finished stopping the process group, or
    /// after `limit`. Returns how many sessions were signalled.
    pub async fn shutdown(&self, limit: Duration) -> usize {
        let entries = self.registry.drain();
        let mut stopped = 0;
        for entry in entries {
            if entry.session.request_termination() {
                entry.handle.terminate();
                stopped += 1;
            }
        }
        info!(stopped, "terminating all running executions");

        let mut routers = std::mem::take(&mut *self.routers());
        let pending = routers.len();
        let finished = timeout(limit, async {
            while let Some(joined) = routers.join_next().await {
                if let Err(e) = joined {
                    warn!(error = %e, "output router failed during shutdown");
                }
            }
        })
        .await;

        match finished {
            Ok(()) => debug!(pending, "all executions completed"),
            Err(_) => warn!(
                ?limit,
                remaining = routers.len(),
                "executions still running at shutdown deadline"
            ),
        }
        stopped
    }

    fn command_directory(&self, project: &Project, role: CommandRole) -> Result<PathBuf> {
        match role {
            CommandRole::Frontend => self.projects.subdirectory(project, "client").ok_or_else(|| {
                RunboxError::NotFound(format!(
                    "Directory not found: {}. Make sure your project has the correct structure.",
                    project.path.join("client").display()
                ))
            }),
            CommandRole::Backend => Ok(self
                .projects
                .subdirectory(project, "server")
                .unwrap_or_else(|| project.path.clone())),
            CommandRole::Root => Ok(project.path.clone()),
        }
    }

    /// Register a freshly launched process and start routing its output.
    fn admit(
        &self,
        owner: &str,
        kind: ExecutionKind,
        label: SessionLabel,
        launched: LaunchedProcess,
    ) -> Result<ExecutionId> {
        let LaunchedProcess {
            spec,
            handle,
            events,
        } = launched;

        let session = Arc::new(ExecutionSession::new(
            ExecutionId::new(),
            owner.to_string(),
            kind,
            &spec,
            label,
        ));
        session.mark_running();

        if let Err(e) = self.registry.register(Arc::clone(&session), handle.clone()) {
            error!(execution_id = %session.id, error = %e, "could not register session; stopping process");
            handle.terminate();
            return Err(e);
        }

        info!(
            execution_id = %session.id,
            owner,
            ?kind,
            cmd = %spec.display_command(),
            cwd = ?spec.working_directory,
            "execution started"
        );

        let router = OutputRouter::new(
            Arc::clone(&session),
            events,
            Arc::clone(&self.hub),
            Arc::clone(&self.registry),
        );
        let mut routers = self.routers();
        while routers.try_join_next().is_some() {}
        routers.spawn(router.run());

        Ok(session.id)
    }
}

fn required<'a>(value: &'a str, message: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(RunboxError::InvalidInput(message.to_string()))
    } else {
        Ok(value)
    }
}
