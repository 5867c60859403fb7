use anyhow::Result;
use async_trait::async_trait;

use super::{Record, RecordQuery};

#[async_trait]
pub trait RecordRepository: Send + Sync {
    async fn create(&self, record: Record) -> Result<()>;
    async fn update(&self, record: Record) -> Result<()>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Record>>;
    async fn delete_by_id(&self, id: &str) -> Result<bool>;
    /// Matching records, newest first.
    async fn list(&self, query: &RecordQuery) -> Result<Vec<Record>>;
    async fn load_all(&self) -> Result<()>;
}
