use async_trait::async_trait;

use super::{Pipeline, PipelineContext, PipelineData, PipelineError, Step};
use crate::blogai::{RecordPost, TitleGeneratorAgent};
use crate::posts::PostQuery;
use crate::records::{RECORD_TYPE_BLOG_AI_POST, Record, RecordQuery};
use crate::registry::Registry;

pub const KEY_EXISTING_TITLES: &str = "existing_titles";
pub const KEY_GENERATED_TITLES: &str = "generated_titles";
pub const KEY_SAVED_IDS: &str = "saved_ids";

/// Titles of every AI post record plus every published-store post.
pub struct FindExistingTitles;

#[async_trait]
impl Step for FindExistingTitles {
    fn name(&self) -> &'static str {
        "find_existing_titles"
    }

    async fn run(&self, ctx: &PipelineContext, data: &mut PipelineData) -> Result<(), PipelineError> {
        let records = ctx
            .registry
            .records
            .list(&RecordQuery::of_type(RECORD_TYPE_BLOG_AI_POST))
            .await?;

        let mut titles: Vec<String> = Vec::with_capacity(records.len());
        for record in &records {
            match record.payload_map() {
                Ok(map) => {
                    if let Some(title) = map.get("title").and_then(|v| v.as_str()) {
                        titles.push(title.to_string());
                    }
                }
                Err(e) => {
                    tracing::warn!(record_id = %record.id, error = %e, "skipping record with unreadable payload");
                }
            }
        }

        let posts = ctx.registry.posts.list(&PostQuery::default()).await?;
        titles.extend(posts.into_iter().map(|p| p.title));
        titles.retain(|t| !t.trim().is_empty());

        tracing::info!(count = titles.len(), "collected existing titles");
        data.insert(KEY_EXISTING_TITLES, titles);
        Ok(())
    }
}

pub struct GenerateTitles;

#[async_trait]
impl Step for GenerateTitles {
    fn name(&self) -> &'static str {
        "generate_titles"
    }

    async fn run(&self, ctx: &PipelineContext, data: &mut PipelineData) -> Result<(), PipelineError> {
        let existing: Vec<String> = data.get(self.name(), KEY_EXISTING_TITLES)?;

        let topic = ctx.registry.resolve_blog_topic().await?;
        if topic.is_empty() {
            return Err(PipelineError::Rejected("blog topic is empty".into()));
        }

        let titles = TitleGeneratorAgent::new()
            .generate_titles(ctx.registry.llm.as_ref(), &topic, &existing)
            .await?;
        data.insert(KEY_GENERATED_TITLES, titles);
        Ok(())
    }
}

/// One new pending record per generated title.
pub struct SaveTitles;

#[async_trait]
impl Step for SaveTitles {
    fn name(&self) -> &'static str {
        "save_titles"
    }

    async fn run(&self, ctx: &PipelineContext, data: &mut PipelineData) -> Result<(), PipelineError> {
        let titles: Vec<String> = data.get(self.name(), KEY_GENERATED_TITLES)?;
        if titles.is_empty() {
            return Err(PipelineError::Rejected("no titles generated".into()));
        }

        let mut saved = Vec::with_capacity(titles.len());
        for title in &titles {
            let mut record = Record::new(RECORD_TYPE_BLOG_AI_POST);
            let mut post = RecordPost::new_pending(title.as_str());
            post.id = record.id.clone();
            record.payload = post.to_record_payload().map_err(anyhow::Error::from)?;
            let id = record.id.clone();
            ctx.registry.records.create(record).await?;
            saved.push(id);
        }

        tracing::info!(count = saved.len(), "saved pending titles");
        data.insert(KEY_SAVED_IDS, saved);
        Ok(())
    }
}

pub fn title_pipeline() -> Pipeline {
    Pipeline::new("title_generation")
        .step(FindExistingTitles)
        .step(GenerateTitles)
        .step(SaveTitles)
}

/// Run the whole title pipeline and return the titles that were stored.
pub async fn generate_titles(registry: &Registry) -> Result<Vec<String>, PipelineError> {
    let ctx = PipelineContext::new(registry.clone());
    let data = title_pipeline().run(&ctx, PipelineData::new()).await?;
    data.get("title_generation", KEY_GENERATED_TITLES)
}

pub fn success_message(count: usize) -> String {
    format!("Generated {count} new title(s) successfully")
}
