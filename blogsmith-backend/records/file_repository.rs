use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::repository::RecordRepository;
use super::{Record, RecordQuery};

/// JSON-file-per-record store at `<data_dir>/records/`, mirrored in memory.
pub struct FileRecordRepository {
    records: RwLock<HashMap<String, Record>>,
    dir: PathBuf,
}

impl FileRecordRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            dir: base_dir.as_ref().join("records"),
        }
    }

    fn write_file(&self, record: &Record) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.dir.join(format!("{}.json", record.id));
        let content = serde_json::to_string_pretty(record)?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &path)
            .with_context(|| format!("failed to rename into {}", path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl RecordRepository for FileRecordRepository {
    async fn create(&self, record: Record) -> Result<()> {
        if record.id.trim().is_empty() {
            bail!("record id is required");
        }
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            bail!("record {} already exists", record.id);
        }
        self.write_file(&record)?;
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn update(&self, mut record: Record) -> Result<()> {
        let mut records = self.records.write().await;
        if !records.contains_key(&record.id) {
            bail!("record {} not found", record.id);
        }
        record.updated_at = chrono::Utc::now();
        self.write_file(&record)?;
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Record>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let existed = self.records.write().await.remove(id).is_some();
        let path = self.dir.join(format!("{id}.json"));
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        }
        Ok(existed)
    }

    async fn list(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        let mut matched: Vec<Record> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn load_all(&self) -> Result<()> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)?;
            return Ok(());
        }

        let mut map = HashMap::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(content) => match serde_json::from_str::<Record>(&content) {
                    Ok(record) => {
                        map.insert(record.id.clone(), record);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "failed to parse record file");
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read record file");
                }
            }
        }

        tracing::info!(count = map.len(), "loaded records");
        *self.records.write().await = map;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::RECORD_TYPE_BLOG_AI_POST;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn record(id: &str, status: &str, age_minutes: i64) -> Record {
        let mut r = Record::new(RECORD_TYPE_BLOG_AI_POST);
        r.id = id.to_string();
        r.created_at = Utc::now() - Duration::minutes(age_minutes);
        r.set_payload_map_key("status", json!(status)).unwrap();
        r
    }

    #[tokio::test]
    async fn test_record_crud() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileRecordRepository::new(tmp.path());
        store.load_all().await.unwrap();

        store.create(record("r1", "pending", 0)).await.unwrap();
        assert!(store.create(record("r1", "pending", 0)).await.is_err());

        let mut fetched = store.find_by_id("r1").await.unwrap().unwrap();
        fetched.set_payload_map_key("status", json!("approved")).unwrap();
        store.update(fetched).await.unwrap();

        let fetched = store.find_by_id("r1").await.unwrap().unwrap();
        assert_eq!(fetched.payload_map().unwrap()["status"], "approved");

        assert!(store.delete_by_id("r1").await.unwrap());
        assert!(!store.delete_by_id("r1").await.unwrap());
        assert!(store.find_by_id("r1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_record_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileRecordRepository::new(tmp.path());
        assert!(store.update(record("ghost", "pending", 0)).await.is_err());
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_newest_first() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileRecordRepository::new(tmp.path());
        store.create(record("old", "approved", 10)).await.unwrap();
        store.create(record("new", "approved", 1)).await.unwrap();
        store.create(record("draft", "draft", 5)).await.unwrap();

        let approved = store
            .list(&RecordQuery::of_type(RECORD_TYPE_BLOG_AI_POST).payload_like(r#""status":"approved""#))
            .await
            .unwrap();
        let ids: Vec<&str> = approved.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);

        let all = store.list(&RecordQuery::of_type(RECORD_TYPE_BLOG_AI_POST)).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_persistence_and_bad_files_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileRecordRepository::new(tmp.path());
        store.create(record("keep", "draft", 0)).await.unwrap();
        std::fs::write(tmp.path().join("records").join("broken.json"), "{oops").unwrap();

        let store2 = FileRecordRepository::new(tmp.path());
        store2.load_all().await.unwrap();
        assert!(store2.find_by_id("keep").await.unwrap().is_some());
        assert_eq!(store2.list(&RecordQuery::default()).await.unwrap().len(), 1);
    }
}
