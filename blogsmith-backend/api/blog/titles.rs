use askama::Template;
use axum::response::Response;
use hyper::StatusCode;

use super::views::{TitleManagerView, TitleRow};
use super::{json_error, json_success, list_record_posts, page_error, pipeline_status, render_page};
use crate::api::AppState;
use crate::blogai::{RecordPost, RecordPostStatus};
use crate::components::{Component, ComponentSessions, FormFields, SettingsModal, form_value};
use crate::links::AdminLinks;
use crate::records::{RECORD_TYPE_BLOG_AI_POST, Record};
use crate::workflow::titles::{generate_titles, success_message};

pub const MSG_TITLE_REQUIRED: &str = "Title is required";
pub const MSG_RECORD_ID_REQUIRED: &str = "Record ID is required";
pub const MSG_RECORD_NOT_FOUND: &str = "Record not found";
const MSG_STORE_FAILED: &str = "Failed to update titles. Please try again later.";

pub(super) async fn page(state: &AppState) -> Response {
    let posts = match list_record_posts(state, None).await {
        Ok(posts) => posts,
        Err(e) => {
            tracing::error!(error = %e, "failed to list title records");
            return page_error(MSG_STORE_FAILED);
        }
    };

    let return_url = AdminLinks::ai_title_generator();
    let modal = SettingsModal::mount(state.registry.clone(), &return_url).await;
    let component_id = ComponentSessions::new_id();
    if let Err(e) = state.sessions.save(&component_id, modal.state()).await {
        tracing::error!(error = %e, "failed to store settings modal state");
    }
    let settings_html = match modal.render(&component_id) {
        Ok(html) => html,
        Err(e) => return render_page("AI Title Generator", Err(e)),
    };

    let view = TitleManagerView {
        action_url: AdminLinks::ai_title_generator(),
        settings_url: AdminLinks::blog_settings(&return_url),
        settings_component_id: component_id,
        post_generator_url: AdminLinks::ai_post_generator(),
        rows: posts.iter().map(TitleRow::from_post).collect(),
        settings_html,
    };
    render_page("AI Title Generator", view.render())
}

#[tracing::instrument(skip_all, fields(action = %action))]
pub(super) async fn handle(state: &AppState, action: &str, form: &FormFields) -> Response {
    match action {
        "generate_titles" => match generate_titles(&state.registry).await {
            Ok(titles) => json_success(success_message(titles.len())),
            Err(e) => {
                tracing::error!(error = %e, "title generation failed");
                json_error(pipeline_status(&e), e.to_string())
            }
        },
        "add_title" => add_title(state, form_value(form, "custom_title")).await,
        "approve_title" => transition(state, form_value(form, "record_id"), RecordPostStatus::Approved).await,
        "reject_title" => transition(state, form_value(form, "record_id"), RecordPostStatus::Rejected).await,
        "delete_title" => delete_title(state, form_value(form, "record_id")).await,
        other => json_error(StatusCode::BAD_REQUEST, format!("Unknown action: {other}")),
    }
}

async fn add_title(state: &AppState, title: &str) -> Response {
    if title.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, MSG_TITLE_REQUIRED);
    }

    let post = RecordPost::new_pending(title);
    let mut record = Record::new(RECORD_TYPE_BLOG_AI_POST);
    let saved = match post.to_record_payload() {
        Ok(payload) => {
            record.payload = payload;
            state.registry.records.create(record).await
        }
        Err(e) => Err(e.into()),
    };

    match saved {
        Ok(()) => json_success("Title added successfully"),
        Err(e) => {
            tracing::error!(error = %e, "failed to add title");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, MSG_STORE_FAILED)
        }
    }
}

async fn transition(state: &AppState, record_id: &str, next: RecordPostStatus) -> Response {
    if record_id.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, MSG_RECORD_ID_REQUIRED);
    }

    let (record, mut post) = match state.registry.find_record_post(record_id).await {
        Ok(Some(found)) => found,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, MSG_RECORD_NOT_FOUND),
        Err(e) => {
            tracing::error!(record_id = %record_id, error = %e, "failed to load title record");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, MSG_STORE_FAILED);
        }
    };

    if let Err(e) = post.transition_to(next) {
        return json_error(StatusCode::BAD_REQUEST, e.to_string());
    }
    if let Err(e) = state.registry.save_record_post(record, &post).await {
        tracing::error!(record_id = %record_id, error = %e, "failed to save title status");
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, MSG_STORE_FAILED);
    }

    tracing::info!(record_id = %record_id, status = %next, "title status changed");
    match next {
        RecordPostStatus::Approved => json_success("Title approved"),
        _ => json_success("Title rejected"),
    }
}

async fn delete_title(state: &AppState, record_id: &str) -> Response {
    if record_id.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, MSG_RECORD_ID_REQUIRED);
    }
    match state.registry.records.delete_by_id(record_id).await {
        Ok(true) => json_success("Title deleted"),
        Ok(false) => json_error(StatusCode::NOT_FOUND, MSG_RECORD_NOT_FOUND),
        Err(e) => {
            tracing::error!(record_id = %record_id, error = %e, "failed to delete title");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, MSG_STORE_FAILED)
        }
    }
}
