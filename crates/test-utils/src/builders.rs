#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use runbox::config::{ConfigFile, RawConfigFile};
use runbox::fs::RealFileSystem;
use runbox::projects::WorkspaceProjects;
use tempfile::TempDir;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    /// Defaults plus a JWT secret, so `build()` validates.
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.auth.jwt_secret = Some("test-secret".to_string());
        Self { config }
    }

    pub fn listen(mut self, addr: &str) -> Self {
        self.config.server.listen = addr.to_string();
        self
    }

    pub fn jwt_secret(mut self, secret: Option<&str>) -> Self {
        self.config.auth.jwt_secret = secret.map(str::to_string);
        self
    }

    pub fn projects_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.projects.root = root.into();
        self
    }

    pub fn grace_period(mut self, value: &str) -> Self {
        self.config.exec.grace_period = value.to_string();
        self
    }

    pub fn drain_timeout(mut self, value: &str) -> Self {
        self.config.exec.drain_timeout = value.to_string();
        self
    }

    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.config.exec.event_buffer = capacity;
        self
    }

    pub fn javascript(mut self, binary: &str) -> Self {
        self.config.interpreters.javascript = binary.to_string();
        self
    }

    pub fn python(mut self, binary: &str) -> Self {
        self.config.interpreters.python = binary.to_string();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A throwaway `<root>/<owner>/<project>` tree on disk.
pub struct ProjectTree {
    root: TempDir,
}

impl ProjectTree {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("create temp projects root"),
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Create `owner`'s project `name` and return its path.
    pub fn project(&self, owner: &str, name: &str) -> PathBuf {
        let path = self.root().join(owner).join(name);
        fs::create_dir_all(&path).expect("create project dir");
        path
    }

    /// Create a directory inside a project (creating the project too).
    pub fn dir(&self, owner: &str, project: &str, relative: &str) -> PathBuf {
        let path = self.project(owner, project).join(relative);
        fs::create_dir_all(&path).expect("create project subdir");
        path
    }

    /// Write a file inside a project (creating parents too).
    pub fn file(&self, owner: &str, project: &str, relative: &str, contents: &str) -> PathBuf {
        let path = self.project(owner, project).join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create file parent");
        }
        fs::write(&path, contents).expect("write project file");
        path
    }

    /// Project directory over this tree using the real filesystem.
    pub fn directory(&self) -> Arc<WorkspaceProjects> {
        Arc::new(WorkspaceProjects::new(self.root(), Arc::new(RealFileSystem)))
    }
}

impl Default for ProjectTree {
    fn default() -> Self {
        Self::new()
    }
}
