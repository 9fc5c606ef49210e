use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::storage::PropertyStore;

/// File-backed property store.
///
/// All properties live in a single `properties.json` map. Writes go to a
/// `.tmp` file first and are renamed into place, so a crash mid-write never
/// leaves a half-written file behind.
///
/// If `properties.json` is corrupted (invalid JSON), a backup is created at
/// `properties.json.bak`, a warning is logged, and the store starts empty.
pub struct JsonPropertyStore {
    file_path: PathBuf,
    cache: RwLock<HashMap<String, String>>,
}

impl JsonPropertyStore {
    pub async fn new(data_dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&data_dir)
            .await
            .context("Failed to create data directory")?;

        let file_path = data_dir.join("properties.json");

        let entries = if file_path.exists() {
            let content = tokio::fs::read_to_string(&file_path)
                .await
                .context("Failed to read properties.json")?;
            match serde_json::from_str::<HashMap<String, String>>(&content) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(
                        "properties.json is corrupted ({}), creating backup and starting empty",
                        e
                    );
                    let backup_path = data_dir.join("properties.json.bak");
                    if let Err(backup_err) = tokio::fs::copy(&file_path, &backup_path).await {
                        tracing::error!(
                            "Failed to create backup of corrupted properties.json: {}",
                            backup_err
                        );
                    }
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            file_path,
            cache: RwLock::new(entries),
        })
    }

    async fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        let tmp_path = self.file_path.with_extension("json.tmp");

        let json =
            serde_json::to_string_pretty(entries).context("Failed to serialize properties")?;

        tokio::fs::write(&tmp_path, json.as_bytes())
            .await
            .context("Failed to write temporary properties file")?;

        tokio::fs::rename(&tmp_path, &self.file_path)
            .await
            .context("Failed to rename temporary properties file")?;

        Ok(())
    }
}

#[async_trait]
impl PropertyStore for JsonPropertyStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let cache = self.cache.read().await;
        Ok(cache.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut cache = self.cache.write().await;
        cache.insert(key.to_string(), value.to_string());
        self.persist(&cache).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut cache = self.cache.write().await;
        if cache.remove(key).is_some() {
            self.persist(&cache).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup_store() -> (JsonPropertyStore, TempDir) {
        let tmp_dir = TempDir::new().expect("create temp dir");
        let store = JsonPropertyStore::new(tmp_dir.path().to_path_buf())
            .await
            .expect("create store");
        (store, tmp_dir)
    }

    #[tokio::test]
    async fn test_get_absent_key() {
        let (store, _tmp) = setup_store().await;
        assert!(store.get("missing").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let (store, _tmp) = setup_store().await;
        store.set("ExportTriggerId", "abc-123").await.expect("set");
        assert_eq!(
            store.get("ExportTriggerId").await.expect("get").as_deref(),
            Some("abc-123")
        );
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (store, _tmp) = setup_store().await;
        store.set("k", "v").await.expect("set");
        store.delete("k").await.expect("delete");
        assert!(store.get("k").await.expect("get").is_none());
        store.delete("k").await.expect("delete absent");
    }

    #[tokio::test]
    async fn test_persistence_across_instances() {
        let tmp_dir = TempDir::new().expect("create temp dir");

        {
            let store = JsonPropertyStore::new(tmp_dir.path().to_path_buf())
                .await
                .expect("create store");
            store.set("ExportNextIteration", "42").await.expect("set");
        }

        {
            let store = JsonPropertyStore::new(tmp_dir.path().to_path_buf())
                .await
                .expect("create store");
            assert_eq!(
                store
                    .get("ExportNextIteration")
                    .await
                    .expect("get")
                    .as_deref(),
                Some("42")
            );
        }
    }

    #[tokio::test]
    async fn test_atomic_write_produces_valid_json() {
        let (store, tmp) = setup_store().await;
        store.set("a", "1").await.expect("set");

        let file_path = tmp.path().join("properties.json");
        let content = tokio::fs::read_to_string(&file_path)
            .await
            .expect("read file");
        let entries: HashMap<String, String> = serde_json::from_str(&content).expect("parse JSON");
        assert_eq!(entries.get("a").map(String::as_str), Some("1"));
    }

    #[tokio::test]
    async fn test_no_tmp_file_left_after_write() {
        let (store, tmp) = setup_store().await;
        store.set("a", "1").await.expect("set");

        let tmp_file = tmp.path().join("properties.json.tmp");
        assert!(
            !tmp_file.exists(),
            "Temporary file should not remain after write"
        );
    }

    #[tokio::test]
    async fn test_corrupted_file_recovers_empty() {
        let tmp_dir = TempDir::new().expect("create temp dir");
        let file = tmp_dir.path().join("properties.json");

        tokio::fs::write(&file, b"this is not valid JSON{{{")
            .await
            .expect("write corrupted file");

        let store = JsonPropertyStore::new(tmp_dir.path().to_path_buf())
            .await
            .expect("create store from corrupted file");

        assert!(store.get("anything").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_corrupted_file_creates_backup() {
        let tmp_dir = TempDir::new().expect("create temp dir");
        let file = tmp_dir.path().join("properties.json");
        let backup = tmp_dir.path().join("properties.json.bak");

        let corrupted_content = b"corrupted data!!!";
        tokio::fs::write(&file, corrupted_content)
            .await
            .expect("write corrupted file");

        let _store = JsonPropertyStore::new(tmp_dir.path().to_path_buf())
            .await
            .expect("create store");

        assert!(backup.exists(), "Backup file should have been created");
        let backup_content = tokio::fs::read(&backup).await.expect("read backup");
        assert_eq!(backup_content, corrupted_content);
    }

    #[tokio::test]
    async fn test_corrupted_file_can_still_set() {
        let tmp_dir = TempDir::new().expect("create temp dir");
        let file = tmp_dir.path().join("properties.json");

        tokio::fs::write(&file, b"not json")
            .await
            .expect("write corrupted file");

        let store = JsonPropertyStore::new(tmp_dir.path().to_path_buf())
            .await
            .expect("create store");

        store.set("fresh", "value").await.expect("set");
        assert_eq!(
            store.get("fresh").await.expect("get").as_deref(),
            Some("value")
        );
    }
}
