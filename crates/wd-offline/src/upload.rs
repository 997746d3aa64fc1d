//! Upload queue contract
//!
//! Rendered files are handed to an upload queue that owns chunking,
//! resumption and retries. The pipeline only needs [`UploadQueue`].

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OfflineError, OfflineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    #[default]
    Pending,
    Uploading,
    Failed,
    Complete,
}

/// One queued upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadItem {
    pub id: Uuid,
    pub station_id: String,
    pub local_uri: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub status: UploadStatus,
    /// 0.0 - 1.0
    pub progress: f64,
    /// Resumable session, once the server assigned one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Bytes already accepted by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl UploadItem {
    pub fn new(
        station_id: impl Into<String>,
        local_uri: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            station_id: station_id.into(),
            local_uri: local_uri.into(),
            metadata,
            status: UploadStatus::Pending,
            progress: 0.0,
            session_id: None,
            offset: None,
        }
    }
}

/// Queue that accepts finished renders
pub trait UploadQueue: Send + Sync {
    /// Add an item and start pumping; returns its id
    fn enqueue(&self, item: UploadItem) -> OfflineResult<Uuid>;

    fn get(&self, id: Uuid) -> Option<UploadItem>;

    /// Reset a failed item to pending and pump again. `false` for an
    /// unknown id.
    fn retry(&self, id: Uuid) -> OfflineResult<bool>;

    fn items(&self) -> Vec<UploadItem>;
}

/// In-process queue that records items and counts pump requests; the
/// transfer itself is driven elsewhere through [`set_status`](Self::set_status).
#[derive(Debug, Default)]
pub struct MemoryUploadQueue {
    items: RwLock<Vec<UploadItem>>,
    pumps: AtomicU64,
}

impl MemoryUploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Times the queue was asked to start transferring
    pub fn pump_count(&self) -> u64 {
        self.pumps.load(Ordering::Relaxed)
    }

    fn pump(&self) {
        self.pumps.fetch_add(1, Ordering::Relaxed);
    }

    /// Record transfer progress for an item
    pub fn set_status(&self, id: Uuid, status: UploadStatus, progress: f64) -> bool {
        let mut items = self.items.write();
        match items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.status = status;
                item.progress = progress.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }
}

impl UploadQueue for MemoryUploadQueue {
    fn enqueue(&self, item: UploadItem) -> OfflineResult<Uuid> {
        let id = item.id;
        {
            let mut items = self.items.write();
            if items.iter().any(|i| i.id == id) {
                return Err(OfflineError::Upload(format!("duplicate upload id {}", id)));
            }
            items.push(item);
        }
        log::debug!("Queued upload {}", id);
        self.pump();
        Ok(id)
    }

    fn get(&self, id: Uuid) -> Option<UploadItem> {
        self.items.read().iter().find(|i| i.id == id).cloned()
    }

    fn retry(&self, id: Uuid) -> OfflineResult<bool> {
        {
            let mut items = self.items.write();
            let Some(item) = items.iter_mut().find(|i| i.id == id) else {
                return Ok(false);
            };
            item.status = UploadStatus::Pending;
        }
        self.pump();
        Ok(true)
    }

    fn items(&self) -> Vec<UploadItem> {
        self.items.read().clone()
    }
}
