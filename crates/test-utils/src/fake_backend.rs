use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use runbox::errors::{Result, RunboxError};
use runbox::exec::{LaunchSpec, LaunchedProcess, ProcessBackend, ProcessEvent, ProcessHandle};
use runbox::types::OutputStream;
use tokio::sync::mpsc;

/// One thing a scripted process does.
#[derive(Debug, Clone)]
pub enum Step {
    Stdout(String),
    Stderr(String),
    Sleep(Duration),
    Exit(i32),
    /// Produce nothing until terminated.
    HangUntilKilled,
}

/// What a fake process does, in order. A script that runs out of steps
/// exits with code 0.
#[derive(Debug, Clone, Default)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout(mut self, data: &str) -> Self {
        self.steps.push(Step::Stdout(data.to_string()));
        self
    }

    pub fn stderr(mut self, data: &str) -> Self {
        self.steps.push(Step::Stderr(data.to_string()));
        self
    }

    pub fn sleep(mut self, duration: Duration) -> Self {
        self.steps.push(Step::Sleep(duration));
        self
    }

    pub fn exit(mut self, code: i32) -> Self {
        self.steps.push(Step::Exit(code));
        self
    }

    pub fn hang(mut self) -> Self {
        self.steps.push(Step::HangUntilKilled);
        self
    }
}

/// A fake backend that:
/// - records every spec it is asked to spawn
/// - plays queued [`Script`]s (or the default one) instead of real processes
/// - reports `terminated` exits when a handle asks it to stop.
#[derive(Clone, Default)]
pub struct FakeProcessBackend {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    default_script: Arc<Mutex<Script>>,
    spawned: Arc<Mutex<Vec<LaunchSpec>>>,
    fail_spawn: Arc<Mutex<bool>>,
}

impl FakeProcessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script for the next spawn; later spawns use later queued scripts.
    pub fn push_script(&self, script: Script) -> &Self {
        self.scripts.lock().unwrap().push_back(script);
        self
    }

    /// Script used once the queue is empty.
    pub fn set_default_script(&self, script: Script) {
        *self.default_script.lock().unwrap() = script;
    }

    /// Make every spawn fail as if the program did not exist.
    pub fn fail_spawns(&self, fail: bool) {
        *self.fail_spawn.lock().unwrap() = fail;
    }

    pub fn spawned(&self) -> Vec<LaunchSpec> {
        self.spawned.lock().unwrap().clone()
    }
}

impl ProcessBackend for FakeProcessBackend {
    fn spawn(&self, spec: LaunchSpec) -> Result<LaunchedProcess> {
        self.spawned.lock().unwrap().push(spec.clone());

        if *self.fail_spawn.lock().unwrap() {
            return Err(RunboxError::SpawnFailure {
                program: spec.program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such program"),
            });
        }

        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default_script.lock().unwrap().clone());

        let (events_tx, events_rx) = mpsc::channel(64);
        let (kill_tx, kill_rx) = mpsc::channel(1);
        tokio::spawn(play(script, events_tx, kill_rx));

        Ok(LaunchedProcess {
            spec,
            handle: ProcessHandle::new(kill_tx, None),
            events: events_rx,
        })
    }
}

async fn play(
    script: Script,
    events: mpsc::Sender<ProcessEvent>,
    mut kill_rx: mpsc::Receiver<()>,
) {
    for step in script.steps {
        if kill_rx.try_recv().is_ok() {
            let _ = events.send(terminated()).await;
            return;
        }

        match step {
            Step::Stdout(data) => {
                let _ = events
                    .send(ProcessEvent::Output {
                        stream: OutputStream::Stdout,
                        data,
                    })
                    .await;
            }
            Step::Stderr(data) => {
                let _ = events
                    .send(ProcessEvent::Output {
                        stream: OutputStream::Stderr,
                        data,
                    })
                    .await;
            }
            Step::Sleep(duration) => {
                tokio::select! {
                    _ = tokio::time::sleep(duration) => {}
                    _ = kill_rx.recv() => {
                        let _ = events.send(terminated()).await;
                        return;
                    }
                }
            }
            Step::Exit(code) => {
                let _ = events
                    .send(ProcessEvent::Exited {
                        code,
                        terminated: false,
                    })
                    .await;
                return;
            }
            Step::HangUntilKilled => {
                kill_rx.recv().await;
                let _ = events.send(terminated()).await;
                return;
            }
        }
    }

    let _ = events
        .send(ProcessEvent::Exited {
            code: 0,
            terminated: false,
        })
        .await;
}

fn terminated() -> ProcessEvent {
    ProcessEvent::Exited {
        code: -1,
        terminated: true,
    }
}
