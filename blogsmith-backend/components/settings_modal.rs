use askama::Template;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Component, FormFields, Toast, form_value};
use crate::links::AdminLinks;
use crate::registry::Registry;
use crate::settings::SETTING_BLOG_TOPIC;

pub const MSG_ENV_INFO: &str = "The BLOG_TOPIC environment variable is set, so updates are disabled here.";
pub const MSG_ENV_MANAGED: &str = "Blog topic is managed via environment and cannot be changed here.";
pub const MSG_TOPIC_REQUIRED: &str = "Blog topic is required";
pub const MSG_SAVED: &str = "Settings saved successfully";
pub const MSG_SAVE_FAILED: &str = "Failed to save blog topic. Please try again later.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsModalState {
    pub blog_topic: String,
    pub is_open: bool,
    #[serde(default)]
    pub form_error: String,
    #[serde(default)]
    pub form_success: String,
    #[serde(default)]
    pub form_info: String,
    #[serde(default)]
    pub redirect: String,
    pub env_override: bool,
    #[serde(default)]
    pub return_url: String,
}

/// Modal editing the `blog_topic` setting used by the title generator.
pub struct SettingsModal {
    registry: Registry,
    state: SettingsModalState,
}

impl SettingsModal {
    pub async fn mount(registry: Registry, return_url: &str) -> Self {
        let mut state = SettingsModalState {
            return_url: return_url.trim().to_string(),
            ..Default::default()
        };

        match registry.settings.get(SETTING_BLOG_TOPIC, "").await {
            Ok(topic) => state.blog_topic = topic,
            Err(e) => tracing::error!(error = %e, "failed to read blog topic setting"),
        }
        if let Some(topic) = &registry.blog_topic_override {
            state.blog_topic = topic.clone();
            state.env_override = true;
            state.form_info = MSG_ENV_INFO.to_string();
        }

        Self { registry, state }
    }

    fn clear_messages(&mut self) {
        self.state.form_error.clear();
        self.state.form_success.clear();
        self.state.redirect.clear();
    }

    async fn save(&mut self, form: &FormFields, close: bool) {
        if self.state.env_override {
            self.state.form_error = MSG_ENV_MANAGED.to_string();
            return;
        }

        let topic = form_value(form, "blog_topic");
        if topic.is_empty() {
            self.state.form_error = MSG_TOPIC_REQUIRED.to_string();
            return;
        }

        if let Err(e) = self.registry.settings.set(SETTING_BLOG_TOPIC, topic).await {
            tracing::error!(error = %e, "failed to save blog topic");
            self.state.form_error = MSG_SAVE_FAILED.to_string();
            return;
        }

        self.state.blog_topic = topic.to_string();
        self.state.form_success = MSG_SAVED.to_string();
        if close {
            self.state.redirect = if self.state.return_url.is_empty() {
                AdminLinks::ai_title_generator()
            } else {
                self.state.return_url.clone()
            };
        }
    }
}

#[async_trait]
impl Component for SettingsModal {
    type State = SettingsModalState;

    fn restore(registry: Registry, state: Self::State) -> Self {
        Self { registry, state }
    }

    fn state(&self) -> &Self::State {
        &self.state
    }

    #[tracing::instrument(skip_all, fields(action = %action))]
    async fn handle(&mut self, action: &str, form: &FormFields) {
        self.clear_messages();
        match action {
            "open" => self.state.is_open = true,
            "close" => self.state.is_open = false,
            "apply" => self.save(form, false).await,
            "save_close" => self.save(form, true).await,
            other => {
                tracing::warn!(action = %other, "unknown settings action");
                self.state.form_error = format!("Unknown action: {other}");
            }
        }
    }

    fn is_finished(&self) -> bool {
        !self.state.redirect.is_empty()
    }

    fn render(&self, component_id: &str) -> Result<String, askama::Error> {
        let toast = Toast::from_messages(&self.state.form_error, &self.state.form_success, &self.state.redirect);
        SettingsModalView {
            component_id,
            action_url: AdminLinks::blog_settings(&self.state.return_url),
            is_open: self.state.is_open,
            blog_topic: &self.state.blog_topic,
            env_override: self.state.env_override,
            form_info: &self.state.form_info,
            has_toast: toast.is_some(),
            toast: toast.unwrap_or_default(),
        }
        .render()
    }
}

#[derive(Template)]
#[template(path = "settings_modal.html")]
struct SettingsModalView<'a> {
    component_id: &'a str,
    action_url: String,
    is_open: bool,
    blog_topic: &'a str,
    env_override: bool,
    form_info: &'a str,
    has_toast: bool,
    toast: Toast,
}
