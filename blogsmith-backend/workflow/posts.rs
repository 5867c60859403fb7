use async_trait::async_trait;

use super::{Pipeline, PipelineContext, PipelineData, PipelineError, Step};
use crate::blogai::post::now_rfc3339;
use crate::blogai::{BlogWriterAgent, PostError, RecordPost, RecordPostStatus};
use crate::records::RECORD_TYPE_BLOG_AI_POST;
use crate::registry::Registry;

pub const KEY_RECORD_POST_ID: &str = "record_post_id";
pub const KEY_POST_TITLE: &str = "post_title";
pub const KEY_CREATED_AT: &str = "created_at";
pub const KEY_BLOGAI_POST: &str = "blogai_post";

/// Loads the title record the post is written for.
pub struct GetPostDetails;

#[async_trait]
impl Step for GetPostDetails {
    fn name(&self) -> &'static str {
        "get_post_details"
    }

    async fn run(&self, ctx: &PipelineContext, data: &mut PipelineData) -> Result<(), PipelineError> {
        let id: String = data.get(self.name(), KEY_RECORD_POST_ID)?;
        let record = ctx
            .registry
            .records
            .find_by_id(&id)
            .await?
            .ok_or_else(|| PipelineError::Rejected(format!("record {id} not found")))?;
        if record.record_type != RECORD_TYPE_BLOG_AI_POST {
            return Err(PipelineError::Rejected(format!(
                "record {id} is not a {RECORD_TYPE_BLOG_AI_POST} record"
            )));
        }

        let post = RecordPost::from_record(&record).map_err(|e| PipelineError::Rejected(e.to_string()))?;
        if !post.status.can_transition_to(RecordPostStatus::Draft) {
            return Err(PipelineError::Rejected(
                PostError::InvalidTransition {
                    from: post.status,
                    to: RecordPostStatus::Draft,
                }
                .to_string(),
            ));
        }

        tracing::info!(record_id = %id, title = %post.title, "loaded post details");
        data.insert(KEY_POST_TITLE, &post.title);
        data.insert(KEY_CREATED_AT, &post.created_at);
        Ok(())
    }
}

pub struct GeneratePost;

#[async_trait]
impl Step for GeneratePost {
    fn name(&self) -> &'static str {
        "generate_post"
    }

    async fn run(&self, ctx: &PipelineContext, data: &mut PipelineData) -> Result<(), PipelineError> {
        let id: String = data.get(self.name(), KEY_RECORD_POST_ID)?;
        let title: String = data.get(self.name(), KEY_POST_TITLE)?;
        let created_at: String = data.get(self.name(), KEY_CREATED_AT)?;

        let mut post = BlogWriterAgent::new()
            .write_blog_post(ctx.registry.llm.as_ref(), &title)
            .await?;
        post.id = id;
        post.status = RecordPostStatus::Draft;
        post.created_at = created_at;
        post.updated_at = now_rfc3339();

        data.insert(KEY_BLOGAI_POST, post);
        Ok(())
    }
}

/// Writes the generated post back into the same record.
pub struct SavePost;

#[async_trait]
impl Step for SavePost {
    fn name(&self) -> &'static str {
        "save_post"
    }

    async fn run(&self, ctx: &PipelineContext, data: &mut PipelineData) -> Result<(), PipelineError> {
        let id: String = data.get(self.name(), KEY_RECORD_POST_ID)?;
        let post: RecordPost = data.get(self.name(), KEY_BLOGAI_POST)?;

        let record = ctx
            .registry
            .records
            .find_by_id(&id)
            .await?
            .ok_or_else(|| PipelineError::Rejected(format!("record {id} not found")))?;
        ctx.registry.save_record_post(record, &post).await?;

        tracing::info!(record_id = %id, sections = post.sections.len(), "saved generated post");
        Ok(())
    }
}

pub fn post_pipeline() -> Pipeline {
    Pipeline::new("post_generation")
        .step(GetPostDetails)
        .step(GeneratePost)
        .step(SavePost)
}

/// Write a full draft for the title record `record_id`.
pub async fn generate_post(registry: &Registry, record_id: &str) -> Result<RecordPost, PipelineError> {
    let ctx = PipelineContext::new(registry.clone());
    let data = post_pipeline()
        .run(&ctx, PipelineData::new().with(KEY_RECORD_POST_ID, record_id))
        .await?;
    data.get("post_generation", KEY_BLOGAI_POST)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedLlm;
    use crate::records::Record;
    use crate::registry::testing::{insert_post, registry};

    const POST_JSON: &str = r#"{
        "title": "Contract Review 101",
        "subtitle": "Sub",
        "summary": "Sum",
        "introduction": {"title": "Intro", "paragraphs": ["Hello."]},
        "sections": [{"title": "One", "paragraphs": ["Body."]}],
        "conclusion": {"title": "End", "paragraphs": ["Bye."]}
    }"#;

    fn approved(title: &str) -> RecordPost {
        let mut post = RecordPost::new_pending(title);
        post.status = RecordPostStatus::Approved;
        post
    }

    #[tokio::test]
    async fn test_generates_draft_into_same_record() {
        let (reg, _dir) = registry(ScriptedLlm::new().with_response(POST_JSON), None);
        let original = approved("Contract Review 101");
        let id = insert_post(&reg, &original).await;

        let post = generate_post(&reg, &id).await.unwrap();
        assert_eq!(post.id, id);
        assert_eq!(post.status, RecordPostStatus::Draft);

        let (_, stored) = reg.find_record_post(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, RecordPostStatus::Draft);
        assert_eq!(stored.sections.len(), 1);
        assert_eq!(stored.subtitle, "Sub");
        assert_eq!(stored.created_at, original.created_at);
    }

    #[tokio::test]
    async fn test_rejects_wrong_record_type() {
        let (reg, _dir) = registry(ScriptedLlm::new(), None);
        let mut record = Record::new("page");
        record.payload = r#"{"title":"x"}"#.to_string();
        let id = record.id.clone();
        reg.records.create(record).await.unwrap();

        let err = generate_post(&reg, &id).await.unwrap_err();
        assert_eq!(err.to_string(), format!("record {id} is not a blog_ai_post record"));
    }

    #[tokio::test]
    async fn test_rejects_pending_title() {
        let (reg, _dir) = registry(ScriptedLlm::new(), None);
        let id = insert_post(&reg, &RecordPost::new_pending("Not yet")).await;
        let err = generate_post(&reg, &id).await.unwrap_err();
        assert_eq!(err.to_string(), "cannot move post from pending to draft");
    }

    #[tokio::test]
    async fn test_writer_failure_leaves_record_untouched() {
        let (reg, _dir) = registry(ScriptedLlm::new().with_response("{\"title\":\"x\"}"), None);
        let id = insert_post(&reg, &approved("Keep")).await;

        assert!(generate_post(&reg, &id).await.is_err());
        let (_, stored) = reg.find_record_post(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, RecordPostStatus::Approved);
        assert!(stored.sections.is_empty());
    }

    #[tokio::test]
    async fn test_missing_record() {
        let (reg, _dir) = registry(ScriptedLlm::new(), None);
        let err = generate_post(&reg, "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "record nope not found");
    }
}
