//! Monotonic id and version allocation
//!
//! Each project carries its own allocator so ids survive a save/load cycle
//! and two edits in the same millisecond still get distinct versions.

use serde::{Deserialize, Serialize};

/// Per-project allocator for entity ids and waveform versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next_id: u64,
    next_version: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            next_version: 1,
        }
    }

    /// Fresh entity id, never reused within the project
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Fresh version stamp, strictly greater than every earlier one
    pub fn next_version(&mut self) -> u64 {
        let version = self.next_version;
        self.next_version += 1;
        version
    }

    /// Make sure future ids are above `id`. Used after loading foreign data.
    pub fn reserve_id(&mut self, id: u64) {
        if id >= self.next_id {
            self.next_id = id + 1;
        }
    }

    /// Make sure future versions are above `version`
    pub fn reserve_version(&mut self, version: u64) {
        if version >= self.next_version {
            self.next_version = version + 1;
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
