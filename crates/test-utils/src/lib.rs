pub mod builders;
pub mod fake_backend;

use std::collections::HashSet;
use std::sync::{Arc, Once};
use std::time::Duration;

use runbox::config::Interpreters;
use runbox::engine::{EventHub, ExecutionEvent, ExecutionOrchestrator};
use runbox::exec::{ProcessBackend, ProcessLauncher};
use runbox::projects::ProjectDirectory;
use runbox::types::ExecutionId;
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Orchestrator over `backend` and `projects` with a fresh event hub.
pub fn orchestrator_with(
    backend: Arc<dyn ProcessBackend>,
    projects: Arc<dyn ProjectDirectory>,
    interpreters: Interpreters,
) -> Arc<ExecutionOrchestrator> {
    let launcher = ProcessLauncher::new(backend, interpreters);
    Arc::new(ExecutionOrchestrator::new(
        launcher,
        projects,
        Arc::new(EventHub::new()),
    ))
}

/// Receive events until `execution_completed` for `id`, returning every
/// event for `id` in arrival order (the completion included).
///
/// Panics after 5 seconds.
pub async fn events_until_completed(
    rx: &mut mpsc::UnboundedReceiver<ExecutionEvent>,
    id: ExecutionId,
) -> Vec<ExecutionEvent> {
    with_timeout(async {
        let mut seen = Vec::new();
        while let Some(event) = rx.recv().await {
            if event.id() != id {
                continue;
            }
            let done = event.is_completion();
            seen.push(event);
            if done {
                return seen;
            }
        }
        panic!("event stream closed before execution {id} completed");
    })
    .await
}

/// Receive events until every id in `ids` has completed; returns all events
/// seen, for any id, in arrival order.
///
/// Panics after 5 seconds.
pub async fn events_until_all_completed(
    rx: &mut mpsc::UnboundedReceiver<ExecutionEvent>,
    ids: &[ExecutionId],
) -> Vec<ExecutionEvent> {
    with_timeout(async {
        let mut remaining: HashSet<ExecutionId> = ids.iter().copied().collect();
        let mut seen = Vec::new();
        while !remaining.is_empty() {
            let Some(event) = rx.recv().await else {
                panic!("event stream closed with {} executions still running", remaining.len());
            };
            if event.is_completion() {
                remaining.remove(&event.id());
            }
            seen.push(event);
        }
        seen
    })
    .await
}

/// Drain whatever arrives within `window`.
pub async fn events_within(
    rx: &mut mpsc::UnboundedReceiver<ExecutionEvent>,
    window: Duration,
) -> Vec<ExecutionEvent> {
    let mut seen = Vec::new();
    let deadline = tokio::time::Instant::now() + window;
    while let Ok(Some(event)) = tokio::time::timeout_at(deadline, rx.recv()).await {
        seen.push(event);
    }
    seen
}

/// Concatenated `data` of the output events of one stream.
pub fn output_text(events: &[ExecutionEvent], stream: runbox::types::OutputStream) -> String {
    events
        .iter()
        .filter_map(|event| match event {
            ExecutionEvent::ProcessOutput { stream: s, data, .. }
            | ExecutionEvent::TerminalOutput { stream: s, data, .. }
                if *s == stream =>
            {
                Some(data.as_str())
            }
            _ => None,
        })
        .collect()
}
