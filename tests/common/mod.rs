#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use runbox::auth::JwtIdentity;
use runbox::engine::SessionLabel;
use runbox::exec::{LaunchSpec, ProcessHandle};
use runbox::fs::mock::MockFileSystem;
use runbox::projects::WorkspaceProjects;
use tokio::sync::mpsc;

pub const SECRET: &str = "test-secret";

/// Root of the in-memory project tree used by [`mock_projects`].
pub const MOCK_ROOT: &str = "/work";

pub fn token_for(owner: &str) -> String {
    JwtIdentity::new(SECRET)
        .issue(owner, Duration::from_secs(3600))
        .unwrap()
}

/// `/work/alice/demo` with `src/app.js` and `main.py`, and an empty
/// `/work/bob/other`.
pub fn mock_projects() -> (MockFileSystem, Arc<WorkspaceProjects>) {
    let fs = MockFileSystem::new();
    fs.add_file("/work/alice/demo/src/app.js");
    fs.add_file("/work/alice/demo/main.py");
    fs.add_dir("/work/bob/other");
    let projects = Arc::new(WorkspaceProjects::new(MOCK_ROOT, Arc::new(fs.clone())));
    (fs, projects)
}

pub fn demo_path(relative: &str) -> PathBuf {
    PathBuf::from("/work/alice/demo").join(relative)
}

pub fn command_spec(command: &str) -> LaunchSpec {
    LaunchSpec {
        program: command.to_string(),
        args: vec![],
        working_directory: PathBuf::from("/tmp"),
        env: vec![],
        shell: true,
    }
}

pub fn label() -> SessionLabel {
    SessionLabel {
        filename: None,
        project: "demo".to_string(),
    }
}

/// A handle plus the receiving end of its kill channel.
pub fn handle() -> (ProcessHandle, mpsc::Receiver<()>) {
    let (tx, rx) = mpsc::channel(1);
    (ProcessHandle::new(tx, None), rx)
}
