//! Filesystem-backed implementation of RunStore.
//!
//! Each run id maps to one JSON record file under the root directory.
//! Saves write a temporary sibling and rename it over the record, so an
//! interrupted write leaves the previous record intact.

use crate::store::{RunStore, StoreError};
use async_trait::async_trait;
use masar_core::id::RunId;
use masar_core::state::RunState;
use std::path::{Path, PathBuf};

/// Filesystem-backed run store.
///
/// Directory layout:
/// ```text
/// root/
///   <url-encoded-run-id>.json
/// ```
///
/// Suitable for development, single-machine deployments, and cases where
/// records must survive process restarts without a database.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a new filesystem store rooted at the given directory.
    ///
    /// The directory is created lazily on first save.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn record_path(&self, run_id: &RunId) -> PathBuf {
        self.root.join(id_to_filename(run_id.as_str()))
    }
}

/// Encode a run id into a safe filename.
fn id_to_filename(id: &str) -> String {
    let mut encoded = String::new();
    for ch in id.chars() {
        match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => encoded.push(ch),
            _ => {
                for byte in ch.to_string().as_bytes() {
                    encoded.push_str(&format!("%{byte:02X}"));
                }
            }
        }
    }
    format!("{encoded}.json")
}

/// Decode a filename back to a run id.
fn filename_to_id(filename: &str) -> Option<String> {
    let name = filename.strip_suffix(".json")?;
    let mut result = Vec::new();
    let bytes = name.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok()?;
            let byte = u8::from_str_radix(hex, 16).ok()?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(result).ok()
}

#[async_trait]
impl RunStore for FsStore {
    async fn save(&self, state: &RunState) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let contents = serde_json::to_string_pretty(state)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Write-then-rename keeps the prior record intact if the write
        // is interrupted.
        let path = self.record_path(state.run_id());
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn load(&self, run_id: &RunId) -> Result<RunState, StoreError> {
        let path = self.record_path(run_id);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(run_id.to_string()))
            }
            Err(e) => Err(StoreError::Storage(e.to_string())),
        }
    }

    async fn delete(&self, run_id: &RunId) -> Result<(), StoreError> {
        let path = self.record_path(run_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(run_id.to_string()))
            }
            Err(e) => Err(StoreError::Storage(e.to_string())),
        }
    }

    async fn list(&self) -> Result<Vec<RunId>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(StoreError::Storage(e.to_string())),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?
        {
            if let Some(filename) = entry.file_name().to_str() {
                if let Some(id) = filename_to_id(filename) {
                    ids.push(RunId::new(id));
                }
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_encoding_roundtrip() {
        let ids = ["simple", "order:42", "path/to/run", "has spaces", "emoji🎉"];
        for id in &ids {
            let filename = id_to_filename(id);
            let decoded = filename_to_id(&filename).unwrap();
            assert_eq!(*id, decoded, "roundtrip failed for {id}");
        }
    }

    #[test]
    fn filename_to_id_rejects_non_json() {
        assert!(filename_to_id("record.txt").is_none());
        assert!(filename_to_id("record.json.tmp").is_none());
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        let mut state = RunState::new("run-1");
        state.set("records", 100).unwrap();
        state.mark_completed("collect", json!({"rows": 3}));
        store.save(&state).await.unwrap();

        let loaded = store.load(&RunId::new("run-1")).await.unwrap();
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            serde_json::to_value(&loaded).unwrap()
        );
    }

    #[tokio::test]
    async fn load_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        let result = store.load(&RunId::new("missing")).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn save_overwrites_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        let mut state = RunState::new("run-1");
        state.set("version", 1).unwrap();
        store.save(&state).await.unwrap();
        state.set("version", 2).unwrap();
        store.save(&state).await.unwrap();

        let loaded = store.load(&RunId::new("run-1")).await.unwrap();
        assert_eq!(loaded.get("version"), Some(&json!(2)));

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec!["run-1.json"]);
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        store.save(&RunState::new("run-1")).await.unwrap();
        store.delete(&RunId::new("run-1")).await.unwrap();

        let result = store.load(&RunId::new("run-1")).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        let result = store.delete(&RunId::new("missing")).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_decodes_encoded_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        store.save(&RunState::new("plain")).await.unwrap();
        store.save(&RunState::new("order:42")).await.unwrap();

        let mut ids: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|id| id.to_string())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["order:42", "plain"]);
    }

    #[tokio::test]
    async fn list_missing_root_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path().join("never-created"));

        let ids = store.list().await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn records_are_keyed_independently() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        let mut a = RunState::new("a");
        a.set("who", "a").unwrap();
        let mut b = RunState::new("b");
        b.set("who", "b").unwrap();
        store.save(&a).await.unwrap();
        store.save(&b).await.unwrap();

        assert_eq!(
            store.load(&RunId::new("a")).await.unwrap().get("who"),
            Some(&json!("a"))
        );
        assert_eq!(
            store.load(&RunId::new("b")).await.unwrap().get("who"),
            Some(&json!("b"))
        );
    }
}
