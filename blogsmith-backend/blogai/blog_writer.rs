use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use super::markdown::{Block, blocks_to_markdown};
use super::post::{PostSection, RecordPost};
use super::prompts::{self, BLOCK_MARKER, PARAGRAPH_PLACEHOLDER};
use super::AgentError;
use crate::llm::{LlmAdapter, LlmOptions, OutputFormat, sanitize_json_content};

/// Addresses a whole part of a post: `introduction`, `conclusion` or
/// `section_N` (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionSelector {
    Introduction,
    Conclusion,
    Body(usize),
}

impl SectionSelector {
    pub fn parse(value: &str) -> Result<Self, AgentError> {
        match value.trim() {
            "introduction" => Ok(Self::Introduction),
            "conclusion" => Ok(Self::Conclusion),
            other => other
                .strip_prefix("section_")
                .and_then(|n| n.parse::<usize>().ok())
                .map(Self::Body)
                .ok_or_else(|| AgentError::validation(format!("invalid section selector: {other}"))),
        }
    }

    fn section<'a>(&self, post: &'a RecordPost) -> Option<&'a PostSection> {
        match self {
            Self::Introduction => Some(&post.introduction),
            Self::Conclusion => Some(&post.conclusion),
            Self::Body(i) => post.sections.get(*i),
        }
    }

    fn section_mut<'a>(&self, post: &'a mut RecordPost) -> Option<&'a mut PostSection> {
        match self {
            Self::Introduction => Some(&mut post.introduction),
            Self::Conclusion => Some(&mut post.conclusion),
            Self::Body(i) => post.sections.get_mut(*i),
        }
    }
}

impl fmt::Display for SectionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Introduction => f.write_str("introduction"),
            Self::Conclusion => f.write_str("conclusion"),
            Self::Body(i) => write!(f, "section_{i}"),
        }
    }
}

/// SEO fields produced by `generate_metas`. Keywords are comma separated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostMetas {
    #[serde(default)]
    pub meta_title: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub meta_keywords: String,
}

#[derive(Debug, Deserialize)]
struct SectionResponse {
    #[serde(default)]
    title: String,
    #[serde(default)]
    paragraphs: Vec<String>,
}

/// Writes whole posts and regenerates slices of existing ones. Every method
/// returns a new value; the input post is only read.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlogWriterAgent;

impl BlogWriterAgent {
    pub fn new() -> Self {
        Self
    }

    #[tracing::instrument(skip_all, fields(title = %title))]
    pub async fn write_blog_post(&self, llm: &dyn LlmAdapter, title: &str) -> Result<RecordPost, AgentError> {
        let response = llm
            .generate(
                prompts::WRITE_POST_SYSTEM,
                &prompts::write_post_user(title),
                &LlmOptions::json(8192, 0.7),
            )
            .await
            .map_err(AgentError::llm("generate blog post"))?;

        let mut post: RecordPost = serde_json::from_str(&sanitize_json_content(&response)).map_err(|e| {
            tracing::warn!(error = %e, snippet = %snippet(&response), "blog post JSON did not parse");
            AgentError::Parse {
                what: "blog post",
                source: e,
            }
        })?;
        post.normalize();

        if post.title.is_empty() {
            return Err(AgentError::validation("missing title in response"));
        }
        if post.subtitle.trim().is_empty() {
            return Err(AgentError::validation("missing subtitle in response"));
        }
        if post.summary.trim().is_empty() {
            return Err(AgentError::validation("missing summary in response"));
        }
        if post.introduction.title.is_empty() || post.introduction.paragraphs.is_empty() {
            return Err(AgentError::validation("missing introduction fields in response"));
        }
        if post.sections.is_empty() {
            return Err(AgentError::validation("missing sections in response"));
        }
        if post.conclusion.title.is_empty() || post.conclusion.paragraphs.is_empty() {
            return Err(AgentError::validation("missing conclusion fields in response"));
        }

        tracing::info!(sections = post.sections.len(), "blog post generated");
        Ok(post)
    }

    /// Replace one whole section. Everything else in the post is untouched.
    #[tracing::instrument(skip_all, fields(post_id = %post.id, selector = %selector))]
    pub async fn regenerate_section(
        &self,
        llm: &dyn LlmAdapter,
        post: &RecordPost,
        selector: &str,
    ) -> Result<RecordPost, AgentError> {
        let selector = SectionSelector::parse(selector)?;
        let (system, user) = match selector {
            SectionSelector::Introduction => {
                (prompts::introduction_system(), prompts::introduction_user(&post.title))
            }
            SectionSelector::Conclusion => {
                (prompts::conclusion_system(), prompts::conclusion_user(&post.title))
            }
            SectionSelector::Body(_) => {
                let section = selector
                    .section(post)
                    .ok_or_else(|| AgentError::validation("invalid section index"))?;
                (
                    prompts::body_section_system(),
                    prompts::body_section_user(&post.title, &section.title),
                )
            }
        };

        let response = llm
            .generate(&system, &user, &LlmOptions::json(4096, 0.7))
            .await
            .map_err(AgentError::llm("generate section content"))?;

        let parsed: SectionResponse = serde_json::from_str(&sanitize_json_content(&response)).map_err(|e| {
            tracing::warn!(error = %e, snippet = %snippet(&response), "section JSON did not parse");
            AgentError::Parse {
                what: "section content",
                source: e,
            }
        })?;

        let title = parsed.title.trim().to_string();
        let paragraphs: Vec<String> = parsed
            .paragraphs
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();
        if title.is_empty() || paragraphs.is_empty() {
            return Err(AgentError::validation("generated content or title is empty"));
        }

        let mut updated = post.clone();
        if let Some(section) = selector.section_mut(&mut updated) {
            *section = PostSection::new(title, paragraphs);
        }
        Ok(updated)
    }

    /// Rewrite (or append, when `paragraph_index` is one past the end) a single
    /// paragraph with the whole post as context.
    #[tracing::instrument(skip_all, fields(post_id = %post.id, section_type, section_index, paragraph_index))]
    pub async fn regenerate_paragraph(
        &self,
        llm: &dyn LlmAdapter,
        post: &RecordPost,
        section_type: &str,
        section_index: usize,
        paragraph_index: usize,
    ) -> Result<RecordPost, AgentError> {
        let mut with_placeholder = post.clone();
        let paragraphs = target_paragraphs(&mut with_placeholder, section_type, section_index, paragraph_index)?;
        let original = paragraphs.get(paragraph_index).map(|p| p.trim().to_string());
        match paragraphs.get_mut(paragraph_index) {
            Some(slot) => *slot = PARAGRAPH_PLACEHOLDER.to_string(),
            None => paragraphs.push(PARAGRAPH_PLACEHOLDER.to_string()),
        }

        let post_json = with_placeholder.to_json_pretty().map_err(|e| match e {
            super::PostError::InvalidPayload(source) => AgentError::Serialize(source),
            other => AgentError::validation(other.to_string()),
        })?;

        let response = llm
            .generate(
                prompts::PARAGRAPH_SYSTEM,
                &prompts::post_json_user(&post_json),
                &LlmOptions::text(512, 0.7),
            )
            .await
            .map_err(AgentError::llm("generate paragraph"))?;

        let paragraph = response.trim();
        if paragraph.is_empty() {
            return Err(AgentError::validation("generated paragraph is empty"));
        }
        if paragraph.contains(PARAGRAPH_PLACEHOLDER) {
            return Err(AgentError::validation("generated paragraph still contains the placeholder"));
        }
        if original.as_deref() == Some(paragraph) {
            return Err(AgentError::validation("generated paragraph is identical to the original"));
        }

        let mut updated = post.clone();
        let paragraphs = target_paragraphs(&mut updated, section_type, section_index, paragraph_index)?;
        match paragraphs.get_mut(paragraph_index) {
            Some(slot) => *slot = paragraph.to_string(),
            None => paragraphs.push(paragraph.to_string()),
        }
        Ok(updated)
    }

    #[tracing::instrument(skip_all, fields(post_id = %post.id))]
    pub async fn generate_summary(&self, llm: &dyn LlmAdapter, post: &RecordPost) -> Result<String, AgentError> {
        let post_json = serde_json::to_string(post).map_err(AgentError::Serialize)?;
        let response = llm
            .generate(
                prompts::SUMMARY_SYSTEM,
                &prompts::post_json_user(&post_json),
                &LlmOptions::text(200, 0.6),
            )
            .await
            .map_err(AgentError::llm("generate summary"))?;

        let summary = response.trim();
        if summary.is_empty() {
            return Err(AgentError::validation("generated summary is empty"));
        }
        Ok(summary.to_string())
    }

    #[tracing::instrument(skip_all, fields(post_id = %post.id))]
    pub async fn generate_metas(&self, llm: &dyn LlmAdapter, post: &RecordPost) -> Result<PostMetas, AgentError> {
        let post_json = serde_json::to_string(post).map_err(AgentError::Serialize)?;
        let response = llm
            .generate(
                prompts::METAS_SYSTEM,
                &prompts::post_json_user(&post_json),
                &LlmOptions::json(300, 0.6),
            )
            .await
            .map_err(AgentError::llm("generate metas"))?;

        let mut metas: PostMetas =
            serde_json::from_str(&sanitize_json_content(&response)).map_err(AgentError::parse("metas response"))?;
        metas.meta_title = metas.meta_title.trim().to_string();
        metas.meta_description = metas.meta_description.trim().to_string();
        metas.meta_keywords = metas.meta_keywords.trim().to_string();

        if metas.meta_title.is_empty() || metas.meta_description.is_empty() || metas.meta_keywords.is_empty() {
            return Err(AgentError::validation("generated metas are incomplete"));
        }
        Ok(metas)
    }

    /// Returns a `data:image/png;base64,...` URL.
    #[tracing::instrument(skip_all, fields(title = %title))]
    pub async fn generate_image(&self, llm: &dyn LlmAdapter, title: &str, summary: &str) -> Result<String, AgentError> {
        let options = LlmOptions {
            temperature: 0.7,
            output_format: OutputFormat::ImagePng,
            ..LlmOptions::default()
        };
        let bytes = llm
            .generate_image(&prompts::image_prompt(title, summary), &options)
            .await
            .map_err(AgentError::llm("generate image"))?;
        if bytes.is_empty() {
            return Err(AgentError::validation("generated image is empty"));
        }
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
    }

    /// Rewrite one editor block with the rest of the post as context. Blank
    /// blocks are rejected before the model is called. The returned text is
    /// trimmed and always differs from the original.
    #[tracing::instrument(skip_all, fields(block_id = %block_id))]
    pub async fn regenerate_block(
        &self,
        llm: &dyn LlmAdapter,
        post_title: &str,
        blocks: &[Block],
        block_id: &str,
    ) -> Result<String, AgentError> {
        let idx = blocks
            .iter()
            .position(|b| b.id == block_id)
            .ok_or_else(|| AgentError::validation("block not found"))?;
        let target = &blocks[idx];
        if target.text.trim().is_empty() {
            return Err(AgentError::validation("block is empty, nothing to rewrite"));
        }

        let mut marked = blocks.to_vec();
        marked[idx].text = BLOCK_MARKER.to_string();
        let context = blocks_to_markdown(&marked);

        let response = llm
            .generate(
                prompts::BLOCK_SYSTEM,
                &prompts::block_user(post_title, target.kind.as_str(), &context, &target.text),
                &LlmOptions::text(512, 0.7),
            )
            .await
            .map_err(AgentError::llm("regenerate block"))?;

        let text = response.trim();
        if text.is_empty() || text == BLOCK_MARKER || text == target.text.trim() {
            return Err(AgentError::validation("LLM did not provide a meaningful rewrite for this block."));
        }
        Ok(text.to_string())
    }
}

fn target_paragraphs<'a>(
    post: &'a mut RecordPost,
    section_type: &str,
    section_index: usize,
    paragraph_index: usize,
) -> Result<&'a mut Vec<String>, AgentError> {
    let (paragraphs, label) = match section_type {
        "introduction" => (&mut post.introduction.paragraphs, "introduction"),
        "conclusion" => (&mut post.conclusion.paragraphs, "conclusion"),
        "section" => {
            let section = post
                .sections
                .get_mut(section_index)
                .ok_or_else(|| AgentError::validation("invalid section index"))?;
            (&mut section.paragraphs, "section")
        }
        other => return Err(AgentError::validation(format!("unknown section type: {other}"))),
    };
    if paragraph_index > paragraphs.len() {
        return Err(AgentError::validation(format!("invalid {label} paragraph index")));
    }
    Ok(paragraphs)
}

fn snippet(text: &str) -> &str {
    let mut end = text.len().min(300);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
