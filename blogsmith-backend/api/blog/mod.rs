//! Blog admin controllers, all served from `/admin/blog` and dispatched on
//! the `controller` query parameter.

mod components;
mod editor;
mod generator;
mod titles;
mod views;

#[cfg(test)]
mod tests;

use askama::Template;
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use hyper::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use super::AppState;
use crate::blogai::{AgentError, RecordPost, RecordPostStatus};
use crate::components::FormFields;
use crate::links::{ADMIN_BLOG_PATH, AdminLinks};
use crate::records::{RECORD_TYPE_BLOG_AI_POST, RecordQuery};
use crate::workflow::PipelineError;

pub fn router() -> Router<AppState> {
    Router::new().route(ADMIN_BLOG_PATH, get(dispatch_get).post(dispatch_post))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BlogQuery {
    #[serde(default)]
    pub controller: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub post_id: String,
    #[serde(default)]
    pub return_url: String,
}

impl BlogQuery {
    /// The posted `action` field, falling back to the query string.
    fn action<'a>(&'a self, form: &'a FormFields) -> &'a str {
        match form.get("action").map(|a| a.trim()) {
            Some(action) if !action.is_empty() => action,
            _ => self.action.trim(),
        }
    }
}

async fn dispatch_get(State(state): State<AppState>, Query(query): Query<BlogQuery>) -> Response {
    match query.controller.as_str() {
        "" | "post-manager" => generator::post_manager(&state).await,
        "post-update" => Redirect::to(&AdminLinks::ai_post_content_update(&query.id)).into_response(),
        "ai-title-generator" => titles::page(&state).await,
        "ai-post-generator" => generator::page(&state).await,
        "ai-post-editor" => editor::page(&state, &query.id).await,
        "ai-post-content-update" => components::content_update_page(&state, &query.post_id).await,
        "blog-settings" => components::settings_page(&state, &query).await,
        other => unknown_controller(other),
    }
}

async fn dispatch_post(
    State(state): State<AppState>,
    Query(query): Query<BlogQuery>,
    Form(form): Form<FormFields>,
) -> Response {
    let action = query.action(&form).to_string();
    match query.controller.as_str() {
        "ai-title-generator" => titles::handle(&state, &action, &form).await,
        "ai-post-generator" => generator::handle(&state, &action, &form).await,
        "ai-post-editor" => editor::handle(&state, &query.id, &action, &form).await,
        "ai-post-content-update" => components::content_update(&state, &query.post_id, &action, form).await,
        "blog-settings" => components::settings(&state, &query.return_url, &action, form).await,
        other => unknown_controller(other),
    }
}

fn unknown_controller(controller: &str) -> Response {
    tracing::warn!(controller = %controller, "unknown blog controller");
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

pub(crate) fn json_success(message: impl Into<String>) -> Response {
    json_success_with(message, json!({}))
}

/// Success body with the fields of `extra` merged in.
pub(crate) fn json_success_with(message: impl Into<String>, extra: Value) -> Response {
    let mut body = json!({
        "status": "success",
        "message": message.into(),
    });
    if let (Some(body), Value::Object(extra)) = (body.as_object_mut(), extra) {
        body.extend(extra);
    }
    Json(body).into_response()
}

pub(crate) fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "status": "error",
            "message": message.into(),
        })),
    )
        .into_response()
}

pub(crate) fn agent_status(err: &AgentError) -> StatusCode {
    match err {
        AgentError::Validation(_) => StatusCode::BAD_REQUEST,
        AgentError::Llm { .. } | AgentError::Parse { .. } => StatusCode::BAD_GATEWAY,
        AgentError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn pipeline_status(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::Rejected(_) => StatusCode::BAD_REQUEST,
        PipelineError::Agent(e) => agent_status(e),
        PipelineError::MissingData { .. } | PipelineError::InvalidData { .. } | PipelineError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Full admin page around an already rendered body.
pub(crate) fn render_page(title: &str, body: Result<String, askama::Error>) -> Response {
    let page = body.and_then(|body| views::PageView { title, body: &body }.render());
    match page {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, page = %title, "failed to render page");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

/// Bare HTML fragment, used for component round-trips.
pub(crate) fn render_fragment(html: Result<String, askama::Error>) -> Response {
    match html {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render component");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render component").into_response()
        }
    }
}

/// Every `blog_ai_post` record, newest first, optionally filtered by status.
/// Records whose payload does not decode are skipped.
pub(crate) async fn list_record_posts(
    state: &AppState,
    status: Option<RecordPostStatus>,
) -> anyhow::Result<Vec<RecordPost>> {
    let mut query = RecordQuery::of_type(RECORD_TYPE_BLOG_AI_POST);
    if let Some(status) = status {
        query = query.payload_like(status.payload_needle());
    }
    let records = state.registry.records.list(&query).await?;

    let posts = records
        .iter()
        .filter_map(|record| match RecordPost::from_record(record) {
            Ok(post) => Some(post),
            Err(e) => {
                tracing::warn!(record_id = %record.id, error = %e, "skipping undecodable post record");
                None
            }
        })
        .filter(|post| status.is_none_or(|s| post.status == s))
        .collect();
    Ok(posts)
}

pub(crate) fn page_error(message: &str) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, message.to_string()).into_response()
}
