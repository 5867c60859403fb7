use std::future::Future;

use axum::response::Response;

use super::{BlogQuery, render_fragment, render_page};
use crate::api::AppState;
use crate::components::{Component, ComponentSessions, FlatBlockEditor, FormFields, SettingsModal, form_value};

/// Mount, store the fresh state, render inside the admin layout.
async fn mount_page<C: Component>(state: &AppState, title: &str, component: C) -> Response {
    let component_id = ComponentSessions::new_id();
    if let Err(e) = state.sessions.save(&component_id, component.state()).await {
        tracing::error!(component_id = %component_id, error = %e, "failed to store component state");
    }
    render_page(title, component.render(&component_id))
}

/// One round-trip: restore by `component_id` (mounting afresh when the
/// session is unknown), handle the action, persist, render the fragment.
async fn round_trip<C, F>(state: &AppState, action: &str, form: FormFields, mount: F) -> Response
where
    C: Component,
    F: Future<Output = C> + Send,
{
    let mut component_id = form_value(&form, "component_id").to_string();
    let restored = if component_id.is_empty() {
        None
    } else {
        match state.sessions.load::<C::State>(&component_id).await {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!(component_id = %component_id, error = %e, "discarding component state");
                state.sessions.remove(&component_id).await;
                None
            }
        }
    };

    let mut component = match restored {
        Some(saved) => C::restore(state.registry.clone(), saved),
        None => {
            tracing::debug!(component_id = %component_id, "no stored component state, mounting");
            mount.await
        }
    };
    if component_id.is_empty() {
        component_id = ComponentSessions::new_id();
    }

    component.handle(action, &form).await;

    if component.is_finished() {
        state.sessions.remove(&component_id).await;
    } else if let Err(e) = state.sessions.save(&component_id, component.state()).await {
        tracing::error!(component_id = %component_id, error = %e, "failed to store component state");
    }
    render_fragment(component.render(&component_id))
}

pub(super) async fn content_update_page(state: &AppState, post_id: &str) -> Response {
    let editor = FlatBlockEditor::mount(state.registry.clone(), post_id).await;
    mount_page(state, "AI Content Editor", editor).await
}

pub(super) async fn content_update(state: &AppState, post_id: &str, action: &str, form: FormFields) -> Response {
    let mount = FlatBlockEditor::mount(state.registry.clone(), post_id);
    round_trip(state, action, form, mount).await
}

pub(super) async fn settings_page(state: &AppState, query: &BlogQuery) -> Response {
    let mut modal = SettingsModal::mount(state.registry.clone(), &query.return_url).await;
    if query.action.trim() == "open" {
        modal.handle("open", &FormFields::new()).await;
    }
    mount_page(state, "Blog Settings", modal).await
}

pub(super) async fn settings(state: &AppState, return_url: &str, action: &str, form: FormFields) -> Response {
    let mount = SettingsModal::mount(state.registry.clone(), return_url);
    round_trip(state, action, form, mount).await
}
