mod common;

use std::sync::Arc;
use std::thread;

use runbox::engine::{ExecutionRegistry, ExecutionSession};
use runbox::errors::RunboxError;
use runbox::types::{ExecutionId, ExecutionKind};

use common::{command_spec, handle, label};

fn session_for(owner: &str) -> Arc<ExecutionSession> {
    Arc::new(ExecutionSession::new(
        ExecutionId::new(),
        owner.to_string(),
        ExecutionKind::RunCommand,
        &command_spec("true"),
        label(),
    ))
}

#[test]
fn test_register_then_lookup() {
    let registry = ExecutionRegistry::new();
    let session = session_for("alice");
    let id = session.id;

    registry.register(session, handle().0).unwrap();

    let entry = registry.lookup(&id).expect("registered");
    assert_eq!(entry.session.owner_id, "alice");
    assert_eq!(registry.len(), 1);
    assert!(registry.lookup(&ExecutionId::new()).is_none());
}

#[test]
fn test_duplicate_id_is_rejected() {
    let registry = ExecutionRegistry::new();
    let session = session_for("alice");

    registry.register(Arc::clone(&session), handle().0).unwrap();
    let err = registry.register(session, handle().0).unwrap_err();

    assert!(matches!(err, RunboxError::DuplicateId(_)), "got {err:?}");
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_remove_is_idempotent() {
    let registry = ExecutionRegistry::new();
    let session = session_for("alice");
    let id = session.id;
    registry.register(session, handle().0).unwrap();

    assert!(registry.remove(&id).is_some());
    assert!(registry.remove(&id).is_none());
    assert!(registry.is_empty());
}

#[test]
fn test_take_owned_checks_the_owner() {
    let registry = ExecutionRegistry::new();
    let session = session_for("alice");
    let id = session.id;
    registry.register(session, handle().0).unwrap();

    let err = registry.take_owned(&id, "mallory").unwrap_err();
    assert!(matches!(err, RunboxError::Forbidden(_)), "got {err:?}");
    assert!(registry.lookup(&id).is_some(), "forbidden take leaves the entry");

    let entry = registry.take_owned(&id, "alice").unwrap();
    assert_eq!(entry.session.id, id);
    assert!(registry.lookup(&id).is_none());

    let err = registry.take_owned(&id, "alice").unwrap_err();
    assert!(matches!(err, RunboxError::NotFound(_)), "got {err:?}");
}

#[test]
fn test_sessions_of_and_drain() {
    let registry = ExecutionRegistry::new();
    for owner in ["alice", "alice", "bob"] {
        registry.register(session_for(owner), handle().0).unwrap();
    }

    assert_eq!(registry.sessions_of("alice").len(), 2);
    assert_eq!(registry.sessions_of("bob").len(), 1);
    assert!(registry.sessions_of("carol").is_empty());

    assert_eq!(registry.drain().len(), 3);
    assert!(registry.is_empty());
}

#[test]
fn test_concurrent_registration_keeps_every_entry() {
    let registry = Arc::new(ExecutionRegistry::new());

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..100 {
                    registry.register(session_for("alice"), handle().0).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(registry.len(), 800);
}

#[test]
fn test_only_one_concurrent_take_wins() {
    let registry = Arc::new(ExecutionRegistry::new());
    let session = session_for("alice");
    let id = session.id;
    registry.register(session, handle().0).unwrap();

    let takers: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.take_owned(&id, "alice").is_ok())
        })
        .collect();
    let winners = takers
        .into_iter()
        .map(|t| t.join().unwrap())
        .filter(|won| *won)
        .count();

    assert_eq!(winners, 1);
}
