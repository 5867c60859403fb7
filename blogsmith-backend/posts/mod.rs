pub mod file_repository;
pub mod repository;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Unpublished,
    Trash,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Unpublished => "unpublished",
            Self::Trash => "trash",
        }
    }
}

/// How the `content` field is authored and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostEditor {
    Blockarea,
    Blockeditor,
    #[default]
    Markdown,
    Htmlarea,
    Textarea,
}

/// A post in the public blog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    /// Markdown when `editor` is `Markdown`.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub meta_keywords: String,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub editor: PostEditor,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            summary: String::new(),
            content: String::new(),
            image_url: String::new(),
            meta_description: String::new(),
            meta_keywords: String::new(),
            status: PostStatus::Draft,
            editor: PostEditor::Markdown,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Filter for `BlogPostRepository::list`.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub status: Option<PostStatus>,
    pub limit: Option<usize>,
}
