// src/projects/mod.rs

//! Read-only view of user projects.
//!
//! Project CRUD lives elsewhere; the orchestrator only needs to find a
//! project's root directory and resolve paths inside it without escaping it.

use std::fmt::Debug;
use std::path::PathBuf;

use crate::errors::Result;
use crate::types::OwnerId;

pub mod workspace;

pub use workspace::WorkspaceProjects;

/// A project owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub owner: OwnerId,
    pub name: String,
    /// Absolute path of the project root.
    pub path: PathBuf,
}

/// Lookup and path resolution for projects.
pub trait ProjectDirectory: Send + Sync + Debug {
    /// Find `owner`'s project called `name`.
    ///
    /// Fails with `NotFound` if the project does not exist for this owner.
    fn project(&self, owner: &str, name: &str) -> Result<Project>;

    /// Resolve `relative` to an absolute path of an existing regular file
    /// inside `project`.
    ///
    /// Fails with `Forbidden` if the path escapes the project root and with
    /// `NotFound` if no such file exists.
    fn resolve_file(&self, project: &Project, relative: &str) -> Result<PathBuf>;

    /// Absolute path of the direct subdirectory `name`, if it exists.
    fn subdirectory(&self, project: &Project, name: &str) -> Option<PathBuf>;
}
