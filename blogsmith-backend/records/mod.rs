pub mod file_repository;
pub mod repository;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Record type under which AI-authored posts are stored.
pub const RECORD_TYPE_BLOG_AI_POST: &str = "blog_ai_post";

/// A generic keyed record holding an opaque JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    pub fn new(record_type: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            record_type: record_type.to_string(),
            payload: "{}".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The payload decoded as a JSON object. A blank payload is an empty map.
    pub fn payload_map(&self) -> Result<Map<String, Value>> {
        if self.payload.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&self.payload)
            .with_context(|| format!("record {} has an invalid payload", self.id))
    }

    pub fn set_payload_map(&mut self, map: Map<String, Value>) -> Result<()> {
        self.payload = serde_json::to_string(&map).context("failed to encode record payload")?;
        Ok(())
    }

    pub fn set_payload_map_key(&mut self, key: &str, value: Value) -> Result<()> {
        let mut map = self.payload_map()?;
        map.insert(key.to_string(), value);
        self.set_payload_map(map)
    }
}

/// Filter for `RecordRepository::list`.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    pub record_type: Option<String>,
    /// Raw substring the payload must contain, e.g. `"status":"approved"`.
    pub payload_like: Option<String>,
    pub limit: Option<usize>,
}

impl RecordQuery {
    pub fn of_type(record_type: &str) -> Self {
        Self {
            record_type: Some(record_type.to_string()),
            ..Default::default()
        }
    }

    pub fn payload_like(mut self, needle: impl Into<String>) -> Self {
        self.payload_like = Some(needle.into());
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        if let Some(ref t) = self.record_type {
            if &record.record_type != t {
                return false;
            }
        }
        if let Some(ref needle) = self.payload_like {
            if !record.payload.contains(needle.as_str()) {
                return false;
            }
        }
        true
    }
}
