// src/projects/workspace.rs

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, warn};

use crate::errors::{Result, RunboxError};
use crate::fs::FileSystem;
use crate::projects::{Project, ProjectDirectory};

/// Owner ids and project names become single path segments.
static SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("segment pattern is a valid regex")
});

/// Projects stored on disk as `<root>/<owner>/<project>`.
#[derive(Debug, Clone)]
pub struct WorkspaceProjects {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl WorkspaceProjects {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn canonical(&self, path: &Path) -> Result<PathBuf> {
        self.fs.canonicalize(path).map_err(RunboxError::from)
    }
}

impl ProjectDirectory for WorkspaceProjects {
    fn project(&self, owner: &str, name: &str) -> Result<Project> {
        if !SEGMENT.is_match(owner) {
            warn!(owner, "owner id is not usable as a directory name");
            return Err(RunboxError::NotFound("Project not found".to_string()));
        }
        if !SEGMENT.is_match(name) {
            return Err(RunboxError::InvalidInput(format!(
                "invalid project name '{name}'"
            )));
        }

        let path = self.root.join(owner).join(name);
        if !self.fs.is_dir(&path) {
            debug!(owner, project = name, path = ?path, "project directory missing");
            return Err(RunboxError::NotFound("Project not found".to_string()));
        }

        Ok(Project {
            owner: owner.to_string(),
            name: name.to_string(),
            path: self.canonical(&path)?,
        })
    }

    fn resolve_file(&self, project: &Project, relative: &str) -> Result<PathBuf> {
        let inside = normalize_relative(relative).ok_or_else(|| {
            RunboxError::Forbidden("Invalid file path".to_string())
        })?;
        let candidate = project.path.join(inside);

        if !self.fs.is_file(&candidate) {
            return Err(RunboxError::NotFound("File not found".to_string()));
        }

        // Symlinks may still point outside the project.
        let resolved = self.canonical(&candidate)?;
        if !resolved.starts_with(&project.path) {
            warn!(
                project = %project.name,
                path = ?resolved,
                "file resolves outside its project"
            );
            return Err(RunboxError::Forbidden("Invalid file path".to_string()));
        }

        Ok(resolved)
    }

    fn subdirectory(&self, project: &Project, name: &str) -> Option<PathBuf> {
        let dir = project.path.join(name);
        self.fs.is_dir(&dir).then_some(dir)
    }
}

/// Lexically normalize a project-relative path.
///
/// Returns `None` for absolute paths and for paths whose `..` components
/// climb above the project root.
pub fn normalize_relative(relative: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}
