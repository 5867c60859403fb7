use std::collections::HashSet;

use serde_json::Value;

use super::AgentError;
use super::prompts;
use crate::llm::{LlmAdapter, LlmOptions, sanitize_json_content};

/// Most titles returned from one generation.
pub const MAX_TITLES: usize = 15;

/// Proposes fresh post titles for a topic, avoiding titles already in use.
#[derive(Debug, Default, Clone, Copy)]
pub struct TitleGeneratorAgent;

impl TitleGeneratorAgent {
    pub fn new() -> Self {
        Self
    }

    /// One JSON call; returns 0-15 titles in the order the model produced
    /// them, minus blanks, existing titles and repeats (case-insensitive).
    #[tracing::instrument(skip_all, fields(topic = %topic, existing = existing_titles.len()))]
    pub async fn generate_titles(
        &self,
        llm: &dyn LlmAdapter,
        topic: &str,
        existing_titles: &[String],
    ) -> Result<Vec<String>, AgentError> {
        let system = prompts::title_generator_system(existing_titles);
        let user = prompts::title_generator_user(topic);

        let response = llm
            .generate(&system, &user, &LlmOptions::json(4096, 0.8))
            .await
            .map_err(AgentError::llm("generate titles"))?;
        tracing::debug!(response = %response, "title generator raw response");

        let candidates = parse_titles(&response)?;
        let titles = filter_titles(candidates, existing_titles);
        tracing::info!(count = titles.len(), "generated titles");
        Ok(titles)
    }
}

/// `titles[]` entries may be objects with a `title` field or bare strings.
fn parse_titles(response: &str) -> Result<Vec<String>, AgentError> {
    let value: Value =
        serde_json::from_str(&sanitize_json_content(response)).map_err(AgentError::parse("titles"))?;

    let items = value
        .get("titles")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    Ok(items
        .iter()
        .filter_map(|item| match item {
            Value::Object(obj) => obj.get("title").and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect())
}

fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

fn filter_titles(candidates: Vec<String>, existing_titles: &[String]) -> Vec<String> {
    let existing: HashSet<String> = existing_titles
        .iter()
        .map(|t| normalize_title(t))
        .filter(|t| !t.is_empty())
        .collect();

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|title| {
            let key = normalize_title(title);
            !key.is_empty() && !existing.contains(&key) && seen.insert(key)
        })
        .take(MAX_TITLES)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::OutputFormat;
    use crate::llm::testing::ScriptedLlm;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_filters_existing_case_insensitively() {
        let llm = ScriptedLlm::new().with_response(
            r#"{"titles":[
                {"title":"how to review a contract","description":"dup"},
                {"title":"  Five Clauses Lawyers Love ","description":"new"},
                {"title":"Contract Red Flags","description":"new"}
            ]}"#,
        );
        let existing = strings(&["How to review a contract", "Top 10 contract clauses"]);

        let titles = TitleGeneratorAgent::new()
            .generate_titles(&llm, "contract review", &existing)
            .await
            .unwrap();

        assert_eq!(titles, vec!["Five Clauses Lawyers Love", "Contract Red Flags"]);
    }

    #[tokio::test]
    async fn test_prompt_lists_existing_titles_and_requests_json() {
        let llm = ScriptedLlm::new().with_response(r#"{"titles":[]}"#);
        TitleGeneratorAgent::new()
            .generate_titles(&llm, "sports", &strings(&["Old One"]))
            .await
            .unwrap();

        let call = &llm.calls()[0];
        assert!(call.system_prompt.contains("- Old One"));
        assert!(call.system_prompt.contains("\"titles\""));
        assert!(call.user_prompt.contains("Topic: sports"));
        assert_eq!(call.output_format, OutputFormat::Json);
    }

    #[tokio::test]
    async fn test_no_existing_titles_placeholder() {
        let llm = ScriptedLlm::new().with_response(r#"{"titles":[]}"#);
        let titles = TitleGeneratorAgent::new()
            .generate_titles(&llm, "tech", &[])
            .await
            .unwrap();
        assert!(titles.is_empty());
        assert!(llm.calls()[0].system_prompt.contains("None provided."));
    }

    #[tokio::test]
    async fn test_llm_error_propagates() {
        let llm = ScriptedLlm::new().with_failure("quota exceeded");
        let err = TitleGeneratorAgent::new()
            .generate_titles(&llm, "tech", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Llm { .. }));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_oversized_response_capped() {
        let titles: Vec<String> = (1..=20).map(|n| format!("Title {n}")).collect();
        let response = serde_json::json!({ "titles": titles }).to_string();
        let llm = ScriptedLlm::new().with_response(response);

        let generated = TitleGeneratorAgent::new()
            .generate_titles(&llm, "tech", &strings(&["Title 2"]))
            .await
            .unwrap();

        assert_eq!(generated.len(), MAX_TITLES);
        assert_eq!(generated[0], "Title 1");
        assert_eq!(generated[1], "Title 3");
        assert_eq!(generated[MAX_TITLES - 1], "Title 16");
    }

    #[test]
    fn test_parse_accepts_strings_and_fenced_json() {
        let raw = "```json\n{\"titles\": [\"Plain\", {\"title\": \"Object\"}, {\"title\": \"  \"}, 42]}\n```";
        assert_eq!(parse_titles(raw).unwrap(), vec!["Plain", "Object"]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_titles("no json here"), Err(AgentError::Parse { .. })));
    }

    #[test]
    fn test_internal_duplicates_first_wins() {
        let filtered = filter_titles(strings(&["Alpha", "beta", "ALPHA", "Beta ", "Gamma"]), &strings(&["", "  "]));
        assert_eq!(filtered, vec!["Alpha", "beta", "Gamma"]);
    }

    #[test]
    fn test_result_never_contains_existing() {
        let existing = strings(&["One", "two"]);
        let filtered = filter_titles(strings(&["one", " TWO", "three", "Three"]), &existing);
        for title in &filtered {
            assert!(!existing.iter().any(|e| normalize_title(e) == normalize_title(title)));
        }
        assert_eq!(filtered, vec!["three"]);
    }
}
