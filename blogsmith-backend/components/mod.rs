//! Stateful server-rendered components. A component is restored from its
//! serialized state, handles one posted action and renders HTML again.

pub mod block_editor;
pub mod settings_modal;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::registry::Registry;

pub use block_editor::FlatBlockEditor;
pub use settings_modal::SettingsModal;

/// Posted form fields.
pub type FormFields = HashMap<String, String>;

/// Trimmed form value, empty when absent.
pub fn form_value<'a>(form: &'a FormFields, key: &str) -> &'a str {
    form.get(key).map(|v| v.trim()).unwrap_or("")
}

#[async_trait]
pub trait Component: Sized + Send {
    type State: Serialize + DeserializeOwned + Send + Sync;

    fn restore(registry: Registry, state: Self::State) -> Self;

    fn state(&self) -> &Self::State;

    async fn handle(&mut self, action: &str, form: &FormFields);

    fn render(&self, component_id: &str) -> Result<String, askama::Error>;

    /// True once the component has redirected away; its state can be dropped.
    fn is_finished(&self) -> bool {
        false
    }
}

/// How long an untouched component state is kept.
pub const SESSION_TTL: Duration = Duration::from_secs(2 * 60 * 60);
/// Upper bound on stored states; the least recently touched go first.
pub const MAX_SESSIONS: usize = 1000;

struct SessionEntry {
    state: Value,
    touched: Instant,
}

/// Serialized component state between round-trips, keyed by component id.
/// Entries expire after `ttl` without use and the map never holds more than
/// `max_entries`.
pub struct ComponentSessions {
    states: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl Default for ComponentSessions {
    fn default() -> Self {
        Self::with_limits(SESSION_TTL, MAX_SESSIONS)
    }
}

impl ComponentSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(ttl: Duration, max_entries: usize) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn new_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    pub async fn save<S: Serialize>(&self, id: &str, state: &S) -> Result<()> {
        let value = serde_json::to_value(state).context("failed to serialize component state")?;
        let mut states = self.states.write().await;
        states.insert(
            id.to_string(),
            SessionEntry {
                state: value,
                touched: Instant::now(),
            },
        );
        self.evict(&mut states);
        Ok(())
    }

    /// `None` for unknown or expired ids.
    pub async fn load<S: DeserializeOwned>(&self, id: &str) -> Result<Option<S>> {
        let value = {
            let mut states = self.states.write().await;
            match states.get(id) {
                Some(entry) if entry.touched.elapsed() >= self.ttl => {
                    states.remove(id);
                    return Ok(None);
                }
                Some(entry) => entry.state.clone(),
                None => return Ok(None),
            }
        };
        let state = serde_json::from_value(value)
            .with_context(|| format!("component state {id} has an unexpected shape"))?;
        Ok(Some(state))
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.states.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }

    fn evict(&self, states: &mut HashMap<String, SessionEntry>) {
        let ttl = self.ttl;
        states.retain(|_, entry| entry.touched.elapsed() < ttl);

        let overflow = states.len().saturating_sub(self.max_entries);
        if overflow == 0 {
            return;
        }
        let mut by_age: Vec<(Instant, String)> =
            states.iter().map(|(id, entry)| (entry.touched, id.clone())).collect();
        by_age.sort();
        for (_, id) in by_age.into_iter().take(overflow) {
            states.remove(&id);
        }
        tracing::debug!(evicted = overflow, "component sessions over capacity");
    }
}

/// Toast shown after an action. Rendered as data attributes and picked up by
/// a small script in the page layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toast {
    pub kind: &'static str,
    pub text: String,
    pub timer_ms: u32,
    pub redirect: String,
}

impl Toast {
    pub fn error(text: &str) -> Self {
        Self {
            kind: "error",
            text: text.to_string(),
            timer_ms: 5000,
            redirect: String::new(),
        }
    }

    pub fn success(text: &str) -> Self {
        Self {
            kind: "success",
            text: text.to_string(),
            timer_ms: 3000,
            redirect: String::new(),
        }
    }

    /// Success followed by navigation after the toast closes.
    pub fn redirect(text: &str, to: &str) -> Self {
        Self {
            kind: "success",
            text: text.to_string(),
            timer_ms: 2000,
            redirect: to.to_string(),
        }
    }

    /// Error wins over success; redirect only applies to success.
    pub fn from_messages(error: &str, success: &str, redirect: &str) -> Option<Self> {
        if !error.is_empty() {
            return Some(Self::error(error));
        }
        if success.is_empty() {
            return None;
        }
        if redirect.is_empty() {
            Some(Self::success(success))
        } else {
            Some(Self::redirect(success, redirect))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sessions_roundtrip_and_remove() {
        let sessions = ComponentSessions::new();
        let id = ComponentSessions::new_id();
        sessions.save(&id, &vec!["a".to_string()]).await.unwrap();

        let restored: Option<Vec<String>> = sessions.load(&id).await.unwrap();
        assert_eq!(restored, Some(vec!["a".to_string()]));
        assert!(sessions.load::<Vec<String>>("other").await.unwrap().is_none());
        assert!(sessions.load::<u32>(&id).await.is_err());

        assert!(sessions.remove(&id).await);
        assert!(!sessions.remove(&id).await);
    }

    #[tokio::test]
    async fn test_expired_state_is_dropped() {
        let sessions = ComponentSessions::with_limits(Duration::ZERO, 10);
        sessions.save("a", &1u32).await.unwrap();
        assert!(sessions.load::<u32>("a").await.unwrap().is_none());
        assert_eq!(sessions.len().await, 0);
    }

    #[tokio::test]
    async fn test_oldest_state_evicted_over_capacity() {
        let sessions = ComponentSessions::with_limits(Duration::from_secs(3600), 2);
        sessions.save("first", &1u32).await.unwrap();
        sessions.save("second", &2u32).await.unwrap();
        sessions.save("third", &3u32).await.unwrap();

        assert_eq!(sessions.len().await, 2);
        assert!(sessions.load::<u32>("first").await.unwrap().is_none());
        assert_eq!(sessions.load::<u32>("third").await.unwrap(), Some(3));
    }

    #[test]
    fn test_toast_precedence() {
        assert_eq!(Toast::from_messages("", "", "/x"), None);
        assert_eq!(Toast::from_messages("bad", "ok", "/x").unwrap().kind, "error");
        let toast = Toast::from_messages("", "ok", "/x").unwrap();
        assert_eq!(toast.timer_ms, 2000);
        assert_eq!(toast.redirect, "/x");
        assert_eq!(Toast::from_messages("", "ok", "").unwrap().timer_ms, 3000);
    }

    #[test]
    fn test_form_value_trims() {
        let mut form = FormFields::new();
        form.insert("title".into(), "  Hi ".into());
        assert_eq!(form_value(&form, "title"), "Hi");
        assert_eq!(form_value(&form, "missing"), "");
    }
}
