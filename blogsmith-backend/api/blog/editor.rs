use askama::Template;
use axum::Json;
use axum::response::{IntoResponse, Response};
use hyper::StatusCode;
use serde_json::json;

use super::views::{PostEditorView, SectionView};
use super::{agent_status, json_error, json_success_with, page_error, render_page};
use crate::api::AppState;
use crate::blogai::markdown::record_post_to_markdown;
use crate::blogai::post::split_keywords;
use crate::blogai::{AgentError, BlogWriterAgent, RecordPost, RecordPostStatus};
use crate::components::{FormFields, form_value};
use crate::links::AdminLinks;
use crate::posts::{BlogPost, PostEditor, PostStatus};
use crate::records::Record;

pub const MSG_RECORD_ID_REQUIRED: &str = "Record ID is required";
pub const MSG_RECORD_NOT_FOUND: &str = "Record not found";
pub const MSG_INVALID_POST: &str = "Invalid post data";
pub const MSG_TITLE_REQUIRED: &str = "Title is required";
pub const MSG_TITLE_SUMMARY_REQUIRED: &str = "Title and summary are required";
const MSG_STORE_FAILED: &str = "Failed to save post. Please try again later.";

pub(super) async fn page(state: &AppState, record_id: &str) -> Response {
    let post = match state.registry.find_record_post(record_id.trim()).await {
        Ok(Some((_, post))) => post,
        Ok(None) => return (StatusCode::NOT_FOUND, MSG_RECORD_NOT_FOUND).into_response(),
        Err(e) => {
            tracing::error!(record_id = %record_id, error = %e, "failed to load post for editor");
            return page_error(MSG_STORE_FAILED);
        }
    };
    let post_json = match post.to_json() {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(record_id = %record_id, error = %e, "failed to encode post");
            return page_error(MSG_STORE_FAILED);
        }
    };

    let view = PostEditorView {
        title: &post.title,
        subtitle: &post.subtitle,
        summary: &post.summary,
        meta_title: &post.meta_title,
        meta_description: &post.meta_description,
        meta_keywords: post.meta_keywords.join(", "),
        image: &post.image,
        action_url: AdminLinks::ai_post_editor(&post.id),
        sections: SectionView::for_post(&post),
        post_json,
    };
    render_page("AI Post Editor", view.render())
}

#[tracing::instrument(skip_all, fields(record_id = %record_id, action = %action))]
pub(super) async fn handle(state: &AppState, record_id: &str, action: &str, form: &FormFields) -> Response {
    let record_id = record_id.trim();
    if record_id.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, MSG_RECORD_ID_REQUIRED);
    }
    let (record, post) = match state.registry.find_record_post(record_id).await {
        Ok(Some(found)) => found,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, MSG_RECORD_NOT_FOUND),
        Err(e) => {
            tracing::error!(error = %e, "failed to load record post");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, MSG_STORE_FAILED);
        }
    };

    let agent = BlogWriterAgent::new();
    let llm = state.registry.llm.as_ref();

    match action {
        "load_post" => Json(json!({
            "status": "success",
            "post": post,
        }))
        .into_response(),
        "regenerate_section" => {
            let result = agent.regenerate_section(llm, &post, form_value(form, "section")).await;
            apply(state, record, result, "Section regenerated successfully").await
        }
        "regenerate_paragraph" => {
            let (section_index, paragraph_index) = match paragraph_indices(form) {
                Ok(indices) => indices,
                Err(message) => return json_error(StatusCode::BAD_REQUEST, message),
            };
            let result = agent
                .regenerate_paragraph(
                    llm,
                    &post,
                    form_value(form, "section_type"),
                    section_index,
                    paragraph_index,
                )
                .await;
            apply(state, record, result, "Paragraph regenerated successfully").await
        }
        "regenerate_summary" => {
            let result = agent.generate_summary(llm, &post).await.map(|summary| RecordPost {
                summary,
                ..post.clone()
            });
            apply(state, record, result, "Summary regenerated successfully").await
        }
        "regenerate_metas" => {
            let result = agent.generate_metas(llm, &post).await.map(|metas| RecordPost {
                meta_title: metas.meta_title,
                meta_description: metas.meta_description,
                meta_keywords: split_keywords(&metas.meta_keywords),
                ..post.clone()
            });
            apply(state, record, result, "Metas regenerated successfully").await
        }
        "regenerate_image" => {
            let result = agent
                .generate_image(llm, &post.title, &post.summary)
                .await
                .map(|image| RecordPost { image, ..post.clone() });
            apply(state, record, result, "Image generated successfully").await
        }
        "save_draft" => save_draft(state, record, post, form).await,
        "create_final_post" => create_final_post(state, record, post, form).await,
        other => json_error(StatusCode::BAD_REQUEST, format!("Unknown action: {other}")),
    }
}

/// Persist an agent result; nothing is written when the agent failed.
async fn apply(
    state: &AppState,
    record: Record,
    result: Result<RecordPost, AgentError>,
    message: &str,
) -> Response {
    let mut updated = match result {
        Ok(updated) => updated,
        Err(e) => {
            tracing::warn!(record_id = %record.id, error = %e, "regeneration rejected");
            return json_error(agent_status(&e), e.to_string());
        }
    };
    updated.touch();

    if let Err(e) = state.registry.save_record_post(record, &updated).await {
        tracing::error!(record_id = %updated.id, error = %e, "failed to save regenerated post");
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, MSG_STORE_FAILED);
    }
    json_success_with(message, json!({ "post": updated }))
}

fn paragraph_indices(form: &FormFields) -> Result<(usize, usize), String> {
    let section_index = match form_value(form, "section_index") {
        "" => 0,
        raw => raw
            .parse::<usize>()
            .map_err(|_| format!("invalid section index: {raw}"))?,
    };
    let raw = form_value(form, "paragraph_index");
    let paragraph_index = raw
        .parse::<usize>()
        .map_err(|_| format!("invalid paragraph index: {raw}"))?;
    Ok((section_index, paragraph_index))
}

/// The posted `post` JSON with identity and timestamps taken from the
/// stored copy. A blank field means the stored post as-is.
fn submitted_post(stored: &RecordPost, form: &FormFields) -> Result<RecordPost, Response> {
    let raw = form_value(form, "post");
    if raw.is_empty() {
        return Ok(stored.clone());
    }
    let mut submitted: RecordPost = serde_json::from_str(raw).map_err(|e| {
        tracing::warn!(record_id = %stored.id, error = %e, "rejected posted post JSON");
        json_error(StatusCode::BAD_REQUEST, MSG_INVALID_POST)
    })?;
    submitted.id = stored.id.clone();
    submitted.status = stored.status;
    submitted.created_at = stored.created_at.clone();
    submitted.normalize();
    Ok(submitted)
}

async fn save_draft(state: &AppState, record: Record, stored: RecordPost, form: &FormFields) -> Response {
    let mut post = match submitted_post(&stored, form) {
        Ok(post) => post,
        Err(response) => return response,
    };
    if post.title.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, MSG_TITLE_REQUIRED);
    }
    if let Err(e) = post.transition_to(RecordPostStatus::Draft) {
        return json_error(StatusCode::BAD_REQUEST, e.to_string());
    }

    if let Err(e) = state.registry.save_record_post(record, &post).await {
        tracing::error!(record_id = %post.id, error = %e, "failed to save draft");
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, MSG_STORE_FAILED);
    }
    tracing::info!(record_id = %post.id, "draft saved");
    json_success_with("Draft saved successfully", json!({ "post": post }))
}

/// Publish the record post as a markdown blog post.
async fn create_final_post(state: &AppState, record: Record, stored: RecordPost, form: &FormFields) -> Response {
    let mut post = match submitted_post(&stored, form) {
        Ok(post) => post,
        Err(response) => return response,
    };
    if post.title.is_empty() || post.summary.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, MSG_TITLE_SUMMARY_REQUIRED);
    }
    if let Err(e) = post.transition_to(RecordPostStatus::Published) {
        return json_error(StatusCode::BAD_REQUEST, e.to_string());
    }

    let mut blog_post = BlogPost::new(post.title.clone());
    blog_post.summary = post.summary.trim().to_string();
    blog_post.content = record_post_to_markdown(&post);
    blog_post.editor = PostEditor::Markdown;
    blog_post.status = PostStatus::Published;
    blog_post.meta_description = post.meta_description.clone();
    blog_post.meta_keywords = post.meta_keywords.join(", ");
    blog_post.image_url = post.image.clone();
    let blog_post_id = blog_post.id.clone();

    if let Err(e) = state.registry.posts.create(blog_post).await {
        tracing::error!(record_id = %post.id, error = %e, "failed to create blog post");
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, MSG_STORE_FAILED);
    }
    if let Err(e) = state.registry.save_record_post(record, &post).await {
        tracing::error!(record_id = %post.id, blog_post_id = %blog_post_id, error = %e, "blog post created but record status not saved");
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, MSG_STORE_FAILED);
    }

    tracing::info!(record_id = %post.id, blog_post_id = %blog_post_id, "post published");
    json_success_with(
        "Post published successfully",
        json!({
            "post_id": blog_post_id,
            "redirect": AdminLinks::ai_post_content_update(&blog_post_id),
        }),
    )
}
