use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, header};
use hyper::StatusCode;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use tower::ServiceExt;

use crate::api::{AppState, create_app};
use crate::blogai::{PostSection, RecordPost, RecordPostStatus};
use crate::components::block_editor::BlockEditorState;
use crate::links::AdminLinks;
use crate::llm::testing::ScriptedLlm;
use crate::posts::{BlogPost, PostEditor, PostQuery, PostStatus};
use crate::registry::Registry;
use crate::registry::testing::{insert_post, registry};
use crate::settings::SETTING_BLOG_TOPIC;

fn app(registry: &Registry) -> (Router, AppState) {
    let state = AppState::new(registry.clone());
    (create_app(state.clone()), state)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn post_form(app: &Router, uri: &str, fields: &[(&str, &str)]) -> (StatusCode, String) {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{k}={}", utf8_percent_encode(v, NON_ALPHANUMERIC)))
        .collect::<Vec<_>>()
        .join("&");
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn post_json(app: &Router, uri: &str, fields: &[(&str, &str)]) -> (StatusCode, Value) {
    let (status, body) = post_form(app, uri, fields).await;
    (status, serde_json::from_str(&body).unwrap())
}

fn hidden_value(html: &str, name: &str) -> String {
    let marker = format!(r#"name="{name}" value=""#);
    let start = html.find(&marker).unwrap() + marker.len();
    let end = html[start..].find('"').unwrap();
    html[start..start + end].to_string()
}

fn draft(title: &str) -> RecordPost {
    let mut post = RecordPost::new_pending(title);
    post.status = RecordPostStatus::Draft;
    post.summary = "A short summary.".into();
    post.introduction = PostSection::new("Intro", vec!["Opening.".into()]);
    post.sections = vec![PostSection::new("One", vec!["First body.".into(), "Second body.".into()])];
    post.conclusion = PostSection::new("End", vec!["Bye.".into()]);
    post.meta_keywords = vec!["law".into(), "contracts".into()];
    post
}

#[tokio::test]
async fn test_health_and_unknown_path() {
    let (reg, _dir) = registry(ScriptedLlm::new(), None);
    let (app, _) = app(&reg);

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"ok\""));

    let (status, _) = get(&app, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/admin/blog?controller=bogus").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_and_approve_title() {
    let (reg, _dir) = registry(ScriptedLlm::new(), None);
    let (app, _) = app(&reg);
    let url = AdminLinks::ai_title_generator();

    let (status, body) = post_json(&app, &url, &[("action", "add_title"), ("custom_title", "  ")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Title is required");

    let (status, body) = post_json(&app, &url, &[("action", "add_title"), ("custom_title", "Leases Explained")]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let (status, html) = get(&app, &url).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Leases Explained"));
    assert!(html.contains("AiTitleGeneratorSettingsModalContainer"));

    let id = hidden_value(&html, "record_id");
    let (_, body) = post_json(&app, &url, &[("action", "approve_title"), ("record_id", &id)]).await;
    assert_eq!(body["status"], "success");
    let (_, stored) = reg.find_record_post(&id).await.unwrap().unwrap();
    assert_eq!(stored.status, RecordPostStatus::Approved);

    let (status, body) = post_json(&app, &url, &[("action", "reject_title"), ("record_id", &id)]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "cannot move post from approved to rejected");
}

#[tokio::test]
async fn test_delete_title() {
    let (reg, _dir) = registry(ScriptedLlm::new(), None);
    let (app, _) = app(&reg);
    let id = insert_post(&reg, &RecordPost::new_pending("Gone soon")).await;
    let url = AdminLinks::ai_title_generator();

    let (_, body) = post_json(&app, &url, &[("action", "delete_title"), ("record_id", &id)]).await;
    assert_eq!(body["status"], "success");
    assert!(reg.find_record_post(&id).await.unwrap().is_none());

    let (status, body) = post_json(&app, &url, &[("action", "delete_title"), ("record_id", &id)]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Record not found");
}

#[tokio::test]
async fn test_generate_titles_requires_topic() {
    let (reg, _dir) = registry(ScriptedLlm::new(), None);
    let (app, _) = app(&reg);

    let (status, body) = post_json(&app, &AdminLinks::ai_title_generator(), &[("action", "generate_titles")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "blog topic is empty");
}

#[tokio::test]
async fn test_generate_post_redirects_to_editor() {
    let post_json_response = r#"{
        "title": "Leases Explained",
        "subtitle": "What tenants sign",
        "summary": "Sum",
        "introduction": {"title": "Intro", "paragraphs": ["Hello."]},
        "sections": [{"title": "One", "paragraphs": ["Body."]}],
        "conclusion": {"title": "End", "paragraphs": ["Bye."]}
    }"#;
    let (reg, _dir) = registry(ScriptedLlm::new().with_response(post_json_response), None);
    let (app, _) = app(&reg);
    let mut approved = RecordPost::new_pending("Leases Explained");
    approved.status = RecordPostStatus::Approved;
    let id = insert_post(&reg, &approved).await;

    let (_, html) = get(&app, &AdminLinks::ai_post_generator()).await;
    assert!(html.contains("Leases Explained"));

    let (status, body) = post_json(
        &app,
        &AdminLinks::ai_post_generator(),
        &[("action", "generate_post"), ("record_post_id", &id)],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["redirect"], AdminLinks::ai_post_editor(&id));

    let (status, html) = get(&app, &AdminLinks::ai_post_editor(&id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Regenerate Section"));
    assert!(html.contains("section_0"));
}

#[tokio::test]
async fn test_regenerate_summary_and_metas() {
    let llm = ScriptedLlm::new()
        .with_response("A fresher summary.")
        .with_response(r#"{"meta_title":"MT","meta_description":"MD","meta_keywords":"a, b ,A, c"}"#);
    let (reg, _dir) = registry(llm, None);
    let (app, _) = app(&reg);
    let id = insert_post(&reg, &draft("Leases")).await;
    let url = AdminLinks::ai_post_editor(&id);

    let (_, body) = post_json(&app, &url, &[("action", "regenerate_summary")]).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["post"]["summary"], "A fresher summary.");

    let (_, body) = post_json(&app, &url, &[("action", "regenerate_metas")]).await;
    assert_eq!(body["status"], "success");

    let (_, stored) = reg.find_record_post(&id).await.unwrap().unwrap();
    assert_eq!(stored.summary, "A fresher summary.");
    assert_eq!(stored.meta_title, "MT");
    assert_eq!(stored.meta_keywords, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_rejected_paragraph_is_not_saved() {
    let (reg, _dir) = registry(ScriptedLlm::new().with_response("First body."), None);
    let (app, _) = app(&reg);
    let original = draft("Leases");
    let id = insert_post(&reg, &original).await;

    let (status, body) = post_json(
        &app,
        &AdminLinks::ai_post_editor(&id),
        &[
            ("action", "regenerate_paragraph"),
            ("section_type", "section"),
            ("section_index", "0"),
            ("paragraph_index", "0"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "generated paragraph is identical to the original");

    let (_, stored) = reg.find_record_post(&id).await.unwrap().unwrap();
    assert_eq!(stored.sections, original.sections);
}

#[tokio::test]
async fn test_bad_paragraph_index_is_rejected() {
    let (reg, _dir) = registry(ScriptedLlm::new(), None);
    let (app, _) = app(&reg);
    let id = insert_post(&reg, &draft("Leases")).await;

    let (status, body) = post_json(
        &app,
        &AdminLinks::ai_post_editor(&id),
        &[("action", "regenerate_paragraph"), ("section_type", "introduction"), ("paragraph_index", "x")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid paragraph index: x");
}

#[tokio::test]
async fn test_save_draft_keeps_identity() {
    let (reg, _dir) = registry(ScriptedLlm::new(), None);
    let (app, _) = app(&reg);
    let original = draft("Leases");
    let id = insert_post(&reg, &original).await;

    let mut edited = draft("Leases, Revised");
    edited.id = "someone-else".into();
    edited.status = RecordPostStatus::Published;
    let edited = serde_json::to_string(&edited).unwrap();

    let (_, body) = post_json(
        &app,
        &AdminLinks::ai_post_editor(&id),
        &[("action", "save_draft"), ("post", &edited)],
    )
    .await;
    assert_eq!(body["status"], "success");

    let (_, stored) = reg.find_record_post(&id).await.unwrap().unwrap();
    assert_eq!(stored.id, id);
    assert_eq!(stored.title, "Leases, Revised");
    assert_eq!(stored.status, RecordPostStatus::Draft);
    assert_eq!(stored.created_at, original.created_at);

    let (status, body) = post_json(
        &app,
        &AdminLinks::ai_post_editor(&id),
        &[("action", "save_draft"), ("post", "{not json")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid post data");
}

#[tokio::test]
async fn test_create_final_post_publishes() {
    let (reg, _dir) = registry(ScriptedLlm::new(), None);
    let (app, _) = app(&reg);
    let mut no_summary = draft("Leases");
    no_summary.summary.clear();
    let id = insert_post(&reg, &no_summary).await;
    let url = AdminLinks::ai_post_editor(&id);

    let (status, body) = post_json(&app, &url, &[("action", "create_final_post")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Title and summary are required");
    assert!(reg.posts.list(&PostQuery::default()).await.unwrap().is_empty());

    let full = serde_json::to_string(&draft("Leases")).unwrap();
    let (_, body) = post_json(&app, &url, &[("action", "create_final_post"), ("post", &full)]).await;
    assert_eq!(body["status"], "success");

    let posts = reg.posts.list(&PostQuery::default()).await.unwrap();
    assert_eq!(posts.len(), 1);
    let published = &posts[0];
    assert_eq!(body["post_id"], published.id.as_str());
    assert_eq!(published.status, PostStatus::Published);
    assert_eq!(published.editor, PostEditor::Markdown);
    assert_eq!(published.meta_keywords, "law, contracts");
    assert!(published.content.starts_with("# Leases"));
    assert!(published.content.contains("## One\n\nFirst body.\n\nSecond body."));

    let (_, stored) = reg.find_record_post(&id).await.unwrap().unwrap();
    assert_eq!(stored.status, RecordPostStatus::Published);
}

#[tokio::test]
async fn test_block_editor_session_round_trip() {
    let (reg, _dir) = registry(ScriptedLlm::new(), None);
    let (app, state) = app(&reg);
    let mut post = BlogPost::new("Leases");
    post.content = "# Leases\n\nFirst.\n\nSecond.".into();
    let post_id = post.id.clone();
    reg.posts.create(post).await.unwrap();

    let url = AdminLinks::ai_post_content_update(&post_id);
    let (status, html) = get(&app, &url).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<html"));
    let component_id = hidden_value(&html, "component_id");

    let saved: BlockEditorState = state.sessions.load(&component_id).await.unwrap().unwrap();
    let second = saved.blocks.iter().find(|b| b.text == "Second.").unwrap().id.clone();

    let (status, fragment) = post_form(
        &app,
        &url,
        &[("component_id", &component_id), ("action", "delete_block"), ("block_id", &second)],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!fragment.contains("<html"));
    assert!(fragment.contains("First."));
    assert!(!fragment.contains("Second."));

    let saved: BlockEditorState = state.sessions.load(&component_id).await.unwrap().unwrap();
    assert!(saved.blocks.iter().all(|b| b.id != second));
}

#[tokio::test]
async fn test_save_close_drops_component_state() {
    let (reg, _dir) = registry(ScriptedLlm::new(), None);
    let (app, state) = app(&reg);
    let mut post = BlogPost::new("Leases");
    post.content = "# Leases\n\nFirst.".into();
    let post_id = post.id.clone();
    reg.posts.create(post).await.unwrap();

    let url = AdminLinks::ai_post_content_update(&post_id);
    let (_, html) = get(&app, &url).await;
    let component_id = hidden_value(&html, "component_id");
    assert_eq!(state.sessions.len().await, 1);

    let (status, _) = post_form(
        &app,
        &url,
        &[("component_id", &component_id), ("action", "save_close"), ("block_order", "")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(state.sessions.load::<BlockEditorState>(&component_id).await.unwrap().is_none());
    assert_eq!(state.sessions.len().await, 0);
}

#[tokio::test]
async fn test_post_update_redirects_to_block_editor() {
    let (reg, _dir) = registry(ScriptedLlm::new(), None);
    let (app, _) = app(&reg);
    let response = app
        .oneshot(
            Request::builder()
                .uri(AdminLinks::post_update("abc"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        AdminLinks::ai_post_content_update("abc").as_str()
    );
}

#[tokio::test]
async fn test_settings_without_session_mounts_fresh() {
    let (reg, _dir) = registry(ScriptedLlm::new(), None);
    let (app, _) = app(&reg);

    let (status, fragment) = post_form(
        &app,
        &AdminLinks::blog_settings(""),
        &[("component_id", "unknown"), ("action", "apply"), ("blog_topic", "family law")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(fragment.contains("Settings saved successfully"));
    assert_eq!(reg.settings.get(SETTING_BLOG_TOPIC, "").await.unwrap(), "family law");

    let (status, html) = get(&app, "/admin/blog?controller=blog-settings&action=open").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Title Generator Settings"));
    assert!(html.contains("family law"));
}
