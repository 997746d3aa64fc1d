//! Atomic file writes and JSON documents

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{FileError, FileResult};

/// Largest JSON document accepted by [`read_json`]
pub const MAX_JSON_SIZE: u64 = 50 * 1024 * 1024;

/// Sibling path used while a file is being written
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Write `bytes` to `path` through a `.part` sibling and a rename, so
/// readers never observe a half-written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> FileResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let partial = partial_path(path);
    if let Err(e) = fs::write(&partial, bytes) {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&partial, path) {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }
    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> FileResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, json.as_bytes())
}

/// Read a JSON document, refusing oversized files
pub fn read_json<T: DeserializeOwned>(path: &Path) -> FileResult<T> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FileError::NotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    if meta.len() > MAX_JSON_SIZE {
        return Err(FileError::InvalidFile(format!(
            "{} exceeds {} MB",
            path.display(),
            MAX_JSON_SIZE / (1024 * 1024)
        )));
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/tmp/out.wav")),
            PathBuf::from("/tmp/out.wav.part")
        );
    }

    #[test]
    fn test_write_atomic_creates_dirs_and_leaves_no_part() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.bin");
        write_atomic(&path, b"hello").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"hello");
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let mut doc = BTreeMap::new();
        doc.insert("gain".to_string(), 0.5);
        write_json(&path, &doc).unwrap();

        let loaded: BTreeMap<String, f64> = read_json(&path).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_read_json_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result: FileResult<BTreeMap<String, f64>> = read_json(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(FileError::NotFound(_))));
    }
}
