use runbox::engine::{EventHub, ExecutionEvent};
use runbox::types::{ExecutionId, OutputStream};

fn output(id: ExecutionId, data: &str) -> ExecutionEvent {
    ExecutionEvent::ProcessOutput {
        id,
        stream: OutputStream::Stdout,
        data: data.to_string(),
    }
}

#[tokio::test]
async fn test_events_reach_only_the_owners_subscribers_in_order() {
    let hub = EventHub::new();
    let mut alice_a = hub.subscribe("alice");
    let mut alice_b = hub.subscribe("alice");
    let mut bob = hub.subscribe("bob");
    let id = ExecutionId::new();

    assert_eq!(hub.publish("alice", output(id, "1")), 2);
    assert_eq!(hub.publish("alice", output(id, "2")), 2);

    for rx in [&mut alice_a, &mut alice_b] {
        assert_eq!(rx.recv().await.unwrap(), output(id, "1"));
        assert_eq!(rx.recv().await.unwrap(), output(id, "2"));
    }
    assert!(bob.try_recv().is_err());
}

#[test]
fn test_publish_without_subscribers_is_not_an_error() {
    let hub = EventHub::new();
    assert_eq!(hub.publish("nobody", output(ExecutionId::new(), "x")), 0);
}

#[test]
fn test_dropped_subscribers_are_pruned() {
    let hub = EventHub::new();
    let kept = hub.subscribe("alice");
    let dropped = hub.subscribe("alice");
    drop(dropped);

    assert_eq!(hub.subscriber_count("alice"), 1);
    assert_eq!(hub.publish("alice", output(ExecutionId::new(), "x")), 1);

    drop(kept);
    assert_eq!(hub.publish("alice", output(ExecutionId::new(), "y")), 0);
    assert_eq!(hub.subscriber_count("alice"), 0);
}

#[test]
fn test_event_json_shapes() {
    let id = ExecutionId::new();

    let started = serde_json::to_value(ExecutionEvent::ExecutionStarted {
        id,
        filename: Some("app.js".to_string()),
        project: "demo".to_string(),
    })
    .unwrap();
    assert_eq!(started["event"], "execution_started");
    assert_eq!(started["filename"], "app.js");

    let out = serde_json::to_value(ExecutionEvent::TerminalOutput {
        id,
        stream: OutputStream::Stderr,
        data: "oops".to_string(),
    })
    .unwrap();
    assert_eq!(out["event"], "terminal_output");
    assert_eq!(out["type"], "stderr");
    assert_eq!(out["data"], "oops");

    let done = serde_json::to_value(ExecutionEvent::ExecutionCompleted {
        id,
        exit_code: 0,
        success: true,
        terminated: None,
    })
    .unwrap();
    assert_eq!(done["event"], "execution_completed");
    assert_eq!(done["exitCode"], 0);
    assert_eq!(done["success"], true);
    assert!(done.get("terminated").is_none());
    assert_eq!(done["id"], id.to_string());
}
