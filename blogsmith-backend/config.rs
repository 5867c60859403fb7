use std::path::PathBuf;

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_LLM_MODEL: &str = "google/gemini-2.5-flash-lite";
pub const DEFAULT_LLM_IMAGE_MODEL: &str = "google/gemini-2.5-flash-image-preview";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub sentry_dsn: Option<String>,
    pub environment: String,
    pub data_dir: PathBuf,
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub llm_model: String,
    pub llm_image_model: String,
    /// When set, the blog topic is fixed and the settings modal is read-only.
    pub blog_topic: Option<String>,
}

/// Raw string values as they come from the environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawConfig<'a> {
    pub port: Option<&'a str>,
    pub sentry_dsn: Option<&'a str>,
    pub environment: Option<&'a str>,
    pub data_dir: Option<&'a str>,
    pub openrouter_api_key: Option<&'a str>,
    pub openrouter_base_url: Option<&'a str>,
    pub llm_model: Option<&'a str>,
    pub llm_image_model: Option<&'a str>,
    pub blog_topic: Option<&'a str>,
}

impl Config {
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok();
        let port = var("PORT");
        let sentry_dsn = var("SENTRY_DSN");
        let environment = var("ENVIRONMENT");
        let data_dir = var("BLOGSMITH_DATA_DIR");
        let api_key = var("OPENROUTER_API_KEY");
        let base_url = var("OPENROUTER_BASE_URL");
        let model = var("LLM_MODEL");
        let image_model = var("LLM_IMAGE_MODEL");
        let blog_topic = var(crate::settings::ENV_BLOG_TOPIC);

        Self::from_raw_values(RawConfig {
            port: port.as_deref(),
            sentry_dsn: sentry_dsn.as_deref(),
            environment: environment.as_deref(),
            data_dir: data_dir.as_deref(),
            openrouter_api_key: api_key.as_deref(),
            openrouter_base_url: base_url.as_deref(),
            llm_model: model.as_deref(),
            llm_image_model: image_model.as_deref(),
            blog_topic: blog_topic.as_deref(),
        })
    }

    /// Build a Config from raw string values (as they would come from env vars).
    /// Used directly in tests to avoid mutating process-global environment.
    pub fn from_raw_values(raw: RawConfig<'_>) -> Self {
        let non_empty = |v: Option<&str>| v.map(str::trim).filter(|s| !s.is_empty()).map(String::from);

        let port = raw.port.and_then(|v| v.trim().parse().ok()).unwrap_or(8081);

        let data_dir = non_empty(raw.data_dir).map(PathBuf::from).unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".blogsmith")
        });

        Config {
            port,
            sentry_dsn: non_empty(raw.sentry_dsn),
            environment: non_empty(raw.environment).unwrap_or_else(|| "local".to_string()),
            data_dir,
            openrouter_api_key: non_empty(raw.openrouter_api_key),
            openrouter_base_url: non_empty(raw.openrouter_base_url)
                .unwrap_or_else(|| DEFAULT_OPENROUTER_BASE_URL.to_string()),
            llm_model: non_empty(raw.llm_model).unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            llm_image_model: non_empty(raw.llm_image_model)
                .unwrap_or_else(|| DEFAULT_LLM_IMAGE_MODEL.to_string()),
            blog_topic: non_empty(raw.blog_topic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_invalid_port_uses_default() {
        let config = Config::from_raw_values(RawConfig {
            port: Some("not-a-number"),
            ..Default::default()
        });
        assert_eq!(config.port, 8081);
    }

    #[test]
    fn test_config_valid_port() {
        let config = Config::from_raw_values(RawConfig {
            port: Some("3000"),
            ..Default::default()
        });
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_config_empty_sentry_dsn_is_none() {
        let config = Config::from_raw_values(RawConfig {
            sentry_dsn: Some(""),
            ..Default::default()
        });
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_raw_values(RawConfig::default());
        assert_eq!(config.environment, "local");
        assert_eq!(config.openrouter_base_url, DEFAULT_OPENROUTER_BASE_URL);
        assert_eq!(config.llm_model, DEFAULT_LLM_MODEL);
        assert_eq!(config.llm_image_model, DEFAULT_LLM_IMAGE_MODEL);
        assert!(config.openrouter_api_key.is_none());
        assert!(config.blog_topic.is_none());
        assert!(config.data_dir.ends_with(".blogsmith"));
    }

    #[test]
    fn test_config_blank_blog_topic_is_none() {
        let config = Config::from_raw_values(RawConfig {
            blog_topic: Some("   "),
            ..Default::default()
        });
        assert!(config.blog_topic.is_none());
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_raw_values(RawConfig {
            data_dir: Some("/tmp/blog"),
            openrouter_api_key: Some("sk-test"),
            llm_model: Some("openai/gpt-4o-mini"),
            blog_topic: Some(" contract review "),
            ..Default::default()
        });
        assert_eq!(config.data_dir, PathBuf::from("/tmp/blog"));
        assert_eq!(config.openrouter_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm_model, "openai/gpt-4o-mini");
        assert_eq!(config.blog_topic.as_deref(), Some("contract review"));
    }
}
