//! Project persistence, one JSON file per project grouped by station
//!
//! Layout: `<root>/<station_id>/<project_id>.json`

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wd_file::{read_json, write_json, FileError};

use crate::error::{StateError, StateResult};
use crate::project::Project;

/// Listing entry for a stored project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub duration_ms: f64,
    pub modified_at: DateTime<Utc>,
}

/// Filesystem-backed project store
#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn station_dir(&self, station_id: &str) -> StateResult<PathBuf> {
        let valid = !station_id.is_empty()
            && station_id != "."
            && station_id != ".."
            && !station_id.contains(['/', '\\', '\0']);
        if !valid {
            return Err(StateError::InvalidStationId(station_id.to_string()));
        }
        Ok(self.root.join(station_id))
    }

    /// File a project is (or would be) stored in
    pub fn project_path(&self, station_id: &str, id: Uuid) -> StateResult<PathBuf> {
        Ok(self.station_dir(station_id)?.join(format!("{}.json", id)))
    }

    /// Write a project, replacing any earlier version atomically
    pub fn save(&self, project: &Project) -> StateResult<PathBuf> {
        let path = self.project_path(&project.station_id, project.id)?;
        write_json(&path, project)?;
        log::debug!("Saved project {} to {}", project.id, path.display());
        Ok(path)
    }

    /// Load and re-validate a project
    pub fn load(&self, station_id: &str, id: Uuid) -> StateResult<Project> {
        let path = self.project_path(station_id, id)?;
        let mut project: Project = match read_json(&path) {
            Ok(project) => project,
            Err(FileError::NotFound(_)) => return Err(StateError::ProjectNotFound(id.to_string())),
            Err(e) => return Err(e.into()),
        };
        let repairs = project.validate();
        if repairs > 0 {
            log::warn!("Project {} needed {} repair(s) on load", id, repairs);
        }
        Ok(project)
    }

    /// All projects of a station, most recently modified first. Unreadable
    /// files are skipped with a warning.
    pub fn list(&self, station_id: &str) -> StateResult<Vec<ProjectSummary>> {
        let dir = self.station_dir(station_id)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut summaries = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_json::<Project>(&path) {
                Ok(project) => summaries.push(ProjectSummary {
                    id: project.id,
                    name: project.name,
                    duration_ms: project.duration_ms,
                    modified_at: project.modified_at,
                }),
                Err(e) => log::warn!("Skipping unreadable project {}: {}", path.display(), e),
            }
        }
        summaries.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        Ok(summaries)
    }

    /// Delete a stored project. Returns false when it did not exist.
    pub fn delete(&self, station_id: &str, id: Uuid) -> StateResult<bool> {
        let path = self.project_path(station_id, id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_path_like_station_ids() {
        let store = ProjectStore::new("/tmp/wd");
        for bad in ["", "..", "a/b", "a\\b"] {
            assert!(matches!(
                store.project_path(bad, Uuid::new_v4()),
                Err(StateError::InvalidStationId(_))
            ));
        }
    }

    #[test]
    fn test_missing_project() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path());
        assert!(matches!(
            store.load("station", Uuid::new_v4()),
            Err(StateError::ProjectNotFound(_))
        ));
        assert!(!store.delete("station", Uuid::new_v4()).unwrap());
        assert!(store.list("station").unwrap().is_empty());
    }
}
