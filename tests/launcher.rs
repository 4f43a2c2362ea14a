mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use runbox::config::{ExecOptions, Interpreters};
use runbox::errors::RunboxError;
use runbox::exec::{ProcessLauncher, RealProcessBackend, command_spec, split_command_line};
use runbox_test_utils::fake_backend::FakeProcessBackend;

fn launcher_with(backend: &FakeProcessBackend, interpreters: Interpreters) -> ProcessLauncher {
    ProcessLauncher::new(Arc::new(backend.clone()), interpreters)
}

#[tokio::test]
async fn test_javascript_runs_under_node_in_the_file_directory() {
    let backend = FakeProcessBackend::new();
    let launcher = launcher_with(&backend, Interpreters::default());

    let launched = launcher
        .launch_file(Path::new("/work/alice/demo/src/app.js"), "javascript")
        .unwrap();

    assert_eq!(launched.spec.program, "node");
    assert_eq!(launched.spec.args, vec!["/work/alice/demo/src/app.js".to_string()]);
    assert_eq!(launched.spec.working_directory, PathBuf::from("/work/alice/demo/src"));
    assert!(!launched.spec.shell);
    assert!(
        launched
            .spec
            .env
            .contains(&("NODE_OPTIONS".to_string(), "--no-warnings".to_string()))
    );
}

#[tokio::test]
async fn test_python_uses_configured_interpreter_and_no_extra_env() {
    let backend = FakeProcessBackend::new();
    let interpreters = Interpreters {
        javascript: "node".to_string(),
        python: "python3".to_string(),
    };
    let launcher = launcher_with(&backend, interpreters);

    launcher
        .launch_file(Path::new("/work/alice/demo/main.py"), "Python")
        .unwrap();

    let spawned = backend.spawned();
    assert_eq!(spawned.len(), 1);
    assert_eq!(spawned[0].program, "python3");
    assert!(spawned[0].env.is_empty());
}

#[test]
fn test_unsupported_language_spawns_nothing() {
    let backend = FakeProcessBackend::new();
    let launcher = launcher_with(&backend, Interpreters::default());

    let err = launcher
        .launch_file(Path::new("/work/alice/demo/main.rb"), "ruby")
        .unwrap_err();

    match err {
        RunboxError::UnsupportedLanguage(lang) => assert_eq!(lang, "ruby"),
        other => panic!("Expected UnsupportedLanguage, got: {other:?}"),
    }
    assert!(backend.spawned().is_empty());
}

#[test]
fn test_command_spec_splits_on_whitespace_and_uses_the_shell() {
    let spec = command_spec("npm  run   dev", Path::new("/work/alice/demo/client")).unwrap();

    assert_eq!(spec.program, "npm");
    assert_eq!(spec.args, vec!["run".to_string(), "dev".to_string()]);
    assert!(spec.shell);
    assert_eq!(spec.display_command(), "npm run dev");
    assert_eq!(spec.working_directory, PathBuf::from("/work/alice/demo/client"));
}

#[test]
fn test_blank_command_is_invalid() {
    let err = command_spec("   ", Path::new("/tmp")).unwrap_err();
    assert!(matches!(err, RunboxError::InvalidInput(_)), "got {err:?}");
}

#[test]
fn test_split_command_line() {
    assert_eq!(
        split_command_line("  ls -la  "),
        Some(("ls".to_string(), vec!["-la".to_string()]))
    );
    assert_eq!(split_command_line("echo"), Some(("echo".to_string(), vec![])));
    assert_eq!(split_command_line(""), None);
    assert_eq!(split_command_line(" \t "), None);
}

#[tokio::test]
async fn test_missing_interpreter_is_a_spawn_failure() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("main.py");
    std::fs::write(&file, "print('hi')\n").unwrap();

    let interpreters = Interpreters {
        javascript: "node".to_string(),
        python: "runbox-no-such-interpreter".to_string(),
    };
    let launcher = ProcessLauncher::new(
        Arc::new(RealProcessBackend::new(ExecOptions::default())),
        interpreters,
    );

    let err = launcher.launch_file(&file, "python").unwrap_err();
    match err {
        RunboxError::SpawnFailure { program, .. } => {
            assert_eq!(program, "runbox-no-such-interpreter")
        }
        other => panic!("Expected SpawnFailure, got: {other:?}"),
    }
}
