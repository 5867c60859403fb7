use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::blogai::RecordPost;
use crate::llm::LlmAdapter;
use crate::posts::file_repository::FileBlogPostRepository;
use crate::posts::repository::BlogPostRepository;
use crate::records::file_repository::FileRecordRepository;
use crate::records::repository::RecordRepository;
use crate::records::{RECORD_TYPE_BLOG_AI_POST, Record};
use crate::settings::SETTING_BLOG_TOPIC;
use crate::settings::file_repository::YamlSettingRepository;
use crate::settings::repository::SettingRepository;

/// Shared services handed to pipelines, components and handlers.
/// Built once at startup; cloning is cheap.
#[derive(Clone)]
pub struct Registry {
    pub llm: Arc<dyn LlmAdapter>,
    pub records: Arc<dyn RecordRepository>,
    pub posts: Arc<dyn BlogPostRepository>,
    pub settings: Arc<dyn SettingRepository>,
    /// Value of `BLOG_TOPIC` when it is set; shadows the stored setting.
    pub blog_topic_override: Option<String>,
}

impl Registry {
    /// File-backed stores rooted at `base_dir`.
    pub fn with_file_stores(
        base_dir: &Path,
        llm: Arc<dyn LlmAdapter>,
        blog_topic_override: Option<String>,
    ) -> Self {
        Self {
            llm,
            records: Arc::new(FileRecordRepository::new(base_dir)),
            posts: Arc::new(FileBlogPostRepository::new(base_dir)),
            settings: Arc::new(YamlSettingRepository::new(base_dir)),
            blog_topic_override: blog_topic_override.filter(|t| !t.trim().is_empty()),
        }
    }

    pub async fn load_all(&self) -> Result<()> {
        self.records.load_all().await.context("failed to load records")?;
        self.posts.load_all().await.context("failed to load blog posts")?;
        Ok(())
    }

    /// The override when present, otherwise the stored setting. May be empty.
    pub async fn resolve_blog_topic(&self) -> Result<String> {
        if let Some(topic) = &self.blog_topic_override {
            return Ok(topic.trim().to_string());
        }
        let topic = self.settings.get(SETTING_BLOG_TOPIC, "").await?;
        Ok(topic.trim().to_string())
    }

    /// Load a `blog_ai_post` record and decode its post. `None` when the
    /// record is missing or has another type.
    pub async fn find_record_post(&self, id: &str) -> Result<Option<(Record, RecordPost)>> {
        let Some(record) = self.records.find_by_id(id).await? else {
            return Ok(None);
        };
        if record.record_type != RECORD_TYPE_BLOG_AI_POST {
            return Ok(None);
        }
        let post = RecordPost::from_record(&record)
            .with_context(|| format!("record {id} does not hold a valid post"))?;
        Ok(Some((record, post)))
    }

    /// Normalize and persist `post` as the payload of `record`.
    pub async fn save_record_post(&self, mut record: Record, post: &RecordPost) -> Result<()> {
        post.validate()
            .with_context(|| format!("refusing to save record {}", record.id))?;
        record.payload = post.to_record_payload()?;
        self.records.update(record).await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{insert_post, registry};
    use super::*;
    use crate::llm::testing::ScriptedLlm;

    #[tokio::test]
    async fn test_override_shadows_setting() {
        let (reg, _dir) = registry(ScriptedLlm::new(), Some("sports"));
        reg.settings.set(SETTING_BLOG_TOPIC, "legal").await.unwrap();
        assert_eq!(reg.resolve_blog_topic().await.unwrap(), "sports");
    }

    #[tokio::test]
    async fn test_topic_from_setting() {
        let (reg, _dir) = registry(ScriptedLlm::new(), Some("  "));
        assert!(reg.blog_topic_override.is_none());
        assert_eq!(reg.resolve_blog_topic().await.unwrap(), "");
        reg.settings.set(SETTING_BLOG_TOPIC, " legal ").await.unwrap();
        assert_eq!(reg.resolve_blog_topic().await.unwrap(), "legal");
    }

    #[tokio::test]
    async fn test_find_record_post_checks_type() {
        let (reg, _dir) = registry(ScriptedLlm::new(), None);
        let id = insert_post(&reg, &RecordPost::new_pending("Hello")).await;
        let (record, post) = reg.find_record_post(&id).await.unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(post.id, id);
        assert_eq!(post.title, "Hello");

        let mut other = Record::new("page");
        other.payload = r#"{"title":"x"}"#.to_string();
        let other_id = other.id.clone();
        reg.records.create(other).await.unwrap();
        assert!(reg.find_record_post(&other_id).await.unwrap().is_none());
        assert!(reg.find_record_post("missing").await.unwrap().is_none());
    }
}
