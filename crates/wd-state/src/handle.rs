//! Shared project handle for multi-threaded hosts

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::StateResult;
use crate::project::Project;
use crate::store::ProjectStore;

/// Cloneable handle that serializes edits to one project
#[derive(Debug, Clone)]
pub struct ProjectHandle {
    inner: Arc<RwLock<Project>>,
}

impl ProjectHandle {
    pub fn new(project: Project) -> Self {
        Self {
            inner: Arc::new(RwLock::new(project)),
        }
    }

    /// Run `f` with shared access
    pub fn read<R>(&self, f: impl FnOnce(&Project) -> R) -> R {
        f(&*self.inner.read())
    }

    /// Run `f` with exclusive access
    pub fn edit<R>(&self, f: impl FnOnce(&mut Project) -> R) -> R {
        f(&mut *self.inner.write())
    }

    /// Owned copy of the current state
    pub fn snapshot(&self) -> Project {
        self.inner.read().clone()
    }

    /// Persist the current state
    pub fn save(&self, store: &ProjectStore) -> StateResult<()> {
        let project = self.inner.read();
        store.save(&project)?;
        Ok(())
    }
}
