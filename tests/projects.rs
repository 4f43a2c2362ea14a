mod common;

use std::path::PathBuf;
use std::sync::Arc;

use runbox::errors::RunboxError;
use runbox::fs::mock::MockFileSystem;
use runbox::projects::workspace::normalize_relative;
use runbox::projects::{ProjectDirectory, WorkspaceProjects};
use runbox_test_utils::builders::ProjectTree;

use common::{demo_path, mock_projects};

#[test]
fn test_project_lookup_is_scoped_to_the_owner() {
    let (_fs, projects) = mock_projects();

    let project = projects.project("alice", "demo").unwrap();
    assert_eq!(project.path, PathBuf::from("/work/alice/demo"));
    assert_eq!(project.name, "demo");

    let err = projects.project("bob", "demo").unwrap_err();
    assert!(matches!(err, RunboxError::NotFound(_)), "got {err:?}");
}

#[test]
fn test_project_names_must_be_plain_segments() {
    let (_fs, projects) = mock_projects();

    for name in ["..", ".", "../bob", "a/b", ""] {
        let err = projects.project("alice", name).unwrap_err();
        assert!(matches!(err, RunboxError::InvalidInput(_)), "{name}: got {err:?}");
    }
}

#[test]
fn test_resolve_file_inside_the_project() {
    let (_fs, projects) = mock_projects();
    let project = projects.project("alice", "demo").unwrap();

    assert_eq!(
        projects.resolve_file(&project, "src/app.js").unwrap(),
        demo_path("src/app.js")
    );
    assert_eq!(
        projects.resolve_file(&project, "./src/../main.py").unwrap(),
        demo_path("main.py")
    );
}

#[test]
fn test_resolve_file_rejects_escapes_and_missing_files() {
    let (fs, projects) = mock_projects();
    fs.add_file("/work/alice/secret.txt");
    let project = projects.project("alice", "demo").unwrap();

    for escape in ["../secret.txt", "/etc/passwd", "src/../../secret.txt"] {
        let err = projects.resolve_file(&project, escape).unwrap_err();
        assert!(matches!(err, RunboxError::Forbidden(_)), "{escape}: got {err:?}");
    }

    let err = projects.resolve_file(&project, "nope.js").unwrap_err();
    assert!(matches!(err, RunboxError::NotFound(_)), "got {err:?}");

    let err = projects.resolve_file(&project, "src").unwrap_err();
    assert!(matches!(err, RunboxError::NotFound(_)), "directories are not files");
}

#[test]
fn test_subdirectory() {
    let fs = MockFileSystem::new();
    fs.add_dir("/work/alice/demo/client");
    let projects = WorkspaceProjects::new("/work", Arc::new(fs));
    let project = projects.project("alice", "demo").unwrap();

    assert_eq!(
        projects.subdirectory(&project, "client"),
        Some(PathBuf::from("/work/alice/demo/client"))
    );
    assert_eq!(projects.subdirectory(&project, "server"), None);
}

#[test]
fn test_normalize_relative() {
    assert_eq!(normalize_relative("a/./b/../c"), Some(PathBuf::from("a/c")));
    assert_eq!(normalize_relative(".."), None);
    assert_eq!(normalize_relative("/abs"), None);
    assert_eq!(normalize_relative(""), Some(PathBuf::new()));
}

#[cfg(unix)]
#[test]
fn test_symlink_out_of_the_project_is_forbidden() {
    let tree = ProjectTree::new();
    let outside = tree.file("alice", "other", "secret.txt", "top secret");
    let project_dir = tree.project("alice", "demo");
    std::os::unix::fs::symlink(&outside, project_dir.join("link.txt")).unwrap();

    let projects = tree.directory();
    let project = projects.project("alice", "demo").unwrap();

    let err = projects.resolve_file(&project, "link.txt").unwrap_err();
    assert!(matches!(err, RunboxError::Forbidden(_)), "got {err:?}");
}
