mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use runbox::auth::JwtIdentity;
use runbox::config::Interpreters;
use runbox::engine::FileRunRequest;
use runbox::server::{AppState, serve};
use runbox_test_utils::fake_backend::{FakeProcessBackend, Script};
use runbox_test_utils::{orchestrator_with, with_timeout};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use common::{SECRET, mock_projects, token_for};

async fn start_server(backend: &FakeProcessBackend) -> (String, AppState) {
    let (_fs, projects) = mock_projects();
    let orchestrator = orchestrator_with(
        Arc::new(backend.clone()),
        projects,
        Interpreters::default(),
    );
    let state = AppState::new(orchestrator, Arc::new(JwtIdentity::new(SECRET)));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_state = state.clone();
    tokio::spawn(async move {
        serve(listener, server_state, std::future::pending()).await.unwrap();
    });

    (format!("ws://{addr}/events"), state)
}

async fn next_json(socket: &mut WebSocketStream<MaybeTlsStream<TcpStream>>) -> Value {
    let message = with_timeout(socket.next()).await.unwrap().unwrap();
    serde_json::from_str(message.to_text().unwrap()).unwrap()
}

#[tokio::test]
async fn test_subscriber_receives_its_runs_events() {
    let backend = FakeProcessBackend::new();
    backend.push_script(Script::new().stdout("hello\n").exit(0));
    let (url, state) = start_server(&backend).await;

    let (mut socket, _) = connect_async(format!("{url}?token={}", token_for("alice")))
        .await
        .unwrap();

    let hello = next_json(&mut socket).await;
    assert_eq!(hello["event"], "authenticated");
    assert_eq!(hello["userId"], "alice");

    let id = state
        .orchestrator
        .start_file_run(FileRunRequest {
            owner: "alice".to_string(),
            project: "demo".to_string(),
            file: "main.py".to_string(),
            language: "python".to_string(),
        })
        .unwrap()
        .to_string();

    let started = next_json(&mut socket).await;
    assert_eq!(started["event"], "execution_started");
    assert_eq!(started["id"], id.as_str());
    assert_eq!(started["filename"], "main.py");
    assert_eq!(started["project"], "demo");

    let output = next_json(&mut socket).await;
    assert_eq!(output["event"], "process_output");
    assert_eq!(output["type"], "stdout");
    assert_eq!(output["data"], "hello\n");

    let done = next_json(&mut socket).await;
    assert_eq!(done["event"], "execution_completed");
    assert_eq!(done["exitCode"], 0);
    assert_eq!(done["success"], true);
}

#[tokio::test]
async fn test_subscriber_does_not_see_other_owners_runs() {
    let backend = FakeProcessBackend::new();
    let (url, state) = start_server(&backend).await;

    let (mut socket, _) = connect_async(format!("{url}?token={}", token_for("bob")))
        .await
        .unwrap();
    let hello = with_timeout(socket.next()).await.unwrap().unwrap();
    assert!(hello.to_text().unwrap().contains("authenticated"));

    state
        .orchestrator
        .start_file_run(FileRunRequest {
            owner: "alice".to_string(),
            project: "demo".to_string(),
            file: "main.py".to_string(),
            language: "python".to_string(),
        })
        .unwrap();

    let quiet = tokio::time::timeout(Duration::from_millis(200), socket.next()).await;
    assert!(quiet.is_err(), "bob received {quiet:?}");
}

#[tokio::test]
async fn test_connection_without_token_is_rejected() {
    let backend = FakeProcessBackend::new();
    let (url, _state) = start_server(&backend).await;

    assert!(connect_async(url.as_str()).await.is_err());
    assert!(connect_async(format!("{url}?token=garbage")).await.is_err());
}
