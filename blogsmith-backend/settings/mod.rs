pub mod file_repository;
pub mod repository;

/// Setting key holding the seed topic for title generation.
pub const SETTING_BLOG_TOPIC: &str = "blog_topic";

/// Environment variable that shadows `blog_topic` and makes it read-only.
pub const ENV_BLOG_TOPIC: &str = "BLOG_TOPIC";
