use askama::Template;
use axum::response::Response;
use hyper::StatusCode;
use serde_json::json;

use super::views::{ApprovedRow, DraftRow, PostGeneratorView, PostManagerView, PostRow};
use super::{json_error, json_success_with, list_record_posts, page_error, pipeline_status, render_page};
use crate::api::AppState;
use crate::blogai::RecordPostStatus;
use crate::components::{FormFields, form_value};
use crate::links::AdminLinks;
use crate::posts::PostQuery;
use crate::workflow::posts::generate_post;

const MSG_LIST_FAILED: &str = "Failed to load posts. Please try again later.";

pub(super) async fn page(state: &AppState) -> Response {
    let (approved, drafts) = match (
        list_record_posts(state, Some(RecordPostStatus::Approved)).await,
        list_record_posts(state, Some(RecordPostStatus::Draft)).await,
    ) {
        (Ok(approved), Ok(drafts)) => (approved, drafts),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(error = %e, "failed to list post records");
            return page_error(MSG_LIST_FAILED);
        }
    };

    let view = PostGeneratorView {
        action_url: AdminLinks::ai_post_generator(),
        title_generator_url: AdminLinks::ai_title_generator(),
        approved: approved
            .into_iter()
            .map(|post| ApprovedRow {
                id: post.id,
                title: post.title,
            })
            .collect(),
        drafts: drafts
            .into_iter()
            .map(|post| DraftRow {
                editor_url: AdminLinks::ai_post_editor(&post.id),
                status: post.status.as_str(),
                title: post.title,
            })
            .collect(),
    };
    render_page("AI Post Generator", view.render())
}

#[tracing::instrument(skip_all, fields(action = %action))]
pub(super) async fn handle(state: &AppState, action: &str, form: &FormFields) -> Response {
    if action != "generate_post" {
        return json_error(StatusCode::BAD_REQUEST, format!("Unknown action: {action}"));
    }

    let record_id = form_value(form, "record_post_id");
    if record_id.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "Record post ID is required");
    }

    match generate_post(&state.registry, record_id).await {
        Ok(post) => json_success_with(
            "Post generated successfully",
            json!({ "redirect": AdminLinks::ai_post_editor(&post.id) }),
        ),
        Err(e) => {
            tracing::error!(record_id = %record_id, error = %e, "post generation failed");
            json_error(pipeline_status(&e), e.to_string())
        }
    }
}

/// Published blog posts with links into the block editor.
pub(super) async fn post_manager(state: &AppState) -> Response {
    let posts = match state.registry.posts.list(&PostQuery::default()).await {
        Ok(posts) => posts,
        Err(e) => {
            tracing::error!(error = %e, "failed to list blog posts");
            return page_error(MSG_LIST_FAILED);
        }
    };

    let view = PostManagerView {
        title_generator_url: AdminLinks::ai_title_generator(),
        post_generator_url: AdminLinks::ai_post_generator(),
        rows: posts
            .into_iter()
            .map(|post| PostRow {
                content_url: AdminLinks::post_update(&post.id),
                status: post.status.as_str(),
                updated_at: post.updated_at.format("%Y-%m-%d %H:%M").to_string(),
                title: post.title,
            })
            .collect(),
    };
    render_page("Posts", view.render())
}
