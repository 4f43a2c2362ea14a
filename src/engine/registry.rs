// src/engine/registry.rs

//! Single source of truth for which processes are running, for whom.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::engine::session::ExecutionSession;
use crate::errors::{Result, RunboxError};
use crate::exec::ProcessHandle;
use crate::types::ExecutionId;

/// A registered session together with the handle that can stop it.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub session: Arc<ExecutionSession>,
    pub handle: ProcessHandle,
}

/// Concurrency-safe map of in-flight sessions keyed by execution id.
///
/// Every operation takes the single inner lock once, so register, lookup,
/// remove and take are linearizable. Exit handling and cancellation both
/// remove entries; whichever gets there first wins and the other sees the
/// entry as absent.
#[derive(Debug, Default)]
pub struct ExecutionRegistry {
    entries: Mutex<HashMap<ExecutionId, RegistryEntry>>,
}

impl ExecutionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<ExecutionId, RegistryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert under `session.id`; fails with `DuplicateId` if already present.
    pub fn register(&self, session: Arc<ExecutionSession>, handle: ProcessHandle) -> Result<()> {
        let mut entries = self.entries();
        if entries.contains_key(&session.id) {
            return Err(RunboxError::DuplicateId(session.id.to_string()));
        }
        debug!(execution_id = %session.id, owner = %session.owner_id, "session registered");
        entries.insert(session.id, RegistryEntry { session, handle });
        Ok(())
    }

    pub fn lookup(&self, id: &ExecutionId) -> Option<RegistryEntry> {
        self.entries().get(id).cloned()
    }

    /// Remove `id` if present; a no-op otherwise.
    pub fn remove(&self, id: &ExecutionId) -> Option<RegistryEntry> {
        let removed = self.entries().remove(id);
        if removed.is_some() {
            debug!(execution_id = %id, "session removed");
        }
        removed
    }

    /// Remove `id` only if it belongs to `owner`.
    ///
    /// - `NotFound` if no such session is registered.
    /// - `Forbidden` if it belongs to someone else; the entry stays.
    pub fn take_owned(&self, id: &ExecutionId, owner: &str) -> Result<RegistryEntry> {
        let mut entries = self.entries();
        match entries.get(id) {
            None => Err(RunboxError::NotFound("Process not found".to_string())),
            Some(entry) if !entry.session.is_owned_by(owner) => Err(RunboxError::Forbidden(
                "Not authorized to stop this process".to_string(),
            )),
            Some(_) => entries
                .remove(id)
                .ok_or_else(|| RunboxError::NotFound("Process not found".to_string())),
        }
    }

    /// All sessions currently registered for `owner`.
    pub fn sessions_of(&self, owner: &str) -> Vec<Arc<ExecutionSession>> {
        self.entries()
            .values()
            .filter(|entry| entry.session.is_owned_by(owner))
            .map(|entry| Arc::clone(&entry.session))
            .collect()
    }

    /// Remove and return every entry.
    pub fn drain(&self) -> Vec<RegistryEntry> {
        self.entries().drain().map(|(_, entry)| entry).collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
