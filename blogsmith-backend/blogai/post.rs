use std::collections::HashSet;
use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::markdown::markdown_to_record_post;
use crate::records::Record;

/// Workflow position of an AI-authored post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordPostStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Draft,
    Published,
}

impl RecordPostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }

    /// Allowed moves: pending to approved/rejected, approved to draft,
    /// draft to published, and re-saving a draft or published post.
    pub fn can_transition_to(self, next: RecordPostStatus) -> bool {
        use RecordPostStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Approved, Draft)
                | (Draft, Draft)
                | (Draft, Published)
                | (Published, Published)
        )
    }

    /// Payload fragment used to filter records by status.
    pub fn payload_needle(&self) -> String {
        format!("\"status\":\"{}\"", self.as_str())
    }
}

impl fmt::Display for RecordPostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PostError {
    #[error("id is required")]
    MissingId,

    #[error("title is required")]
    MissingTitle,

    #[error("invalid post payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("cannot move post from {from} to {to}")]
    InvalidTransition {
        from: RecordPostStatus,
        to: RecordPostStatus,
    },
}

/// Introduction, body section or conclusion. Older payloads carry a single
/// `content` string instead of `paragraphs`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawSection")]
pub struct PostSection {
    pub title: String,
    pub paragraphs: Vec<String>,
}

#[derive(Deserialize)]
struct RawSection {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    paragraphs: Option<Vec<String>>,
    #[serde(default)]
    content: Option<String>,
}

impl From<RawSection> for PostSection {
    fn from(raw: RawSection) -> Self {
        let paragraphs = match (raw.paragraphs, raw.content) {
            (Some(p), _) => p,
            (None, Some(content)) => vec![content],
            (None, None) => Vec::new(),
        };
        Self {
            title: raw.title.unwrap_or_default(),
            paragraphs,
        }
    }
}

impl PostSection {
    pub fn new(title: impl Into<String>, paragraphs: Vec<String>) -> Self {
        Self {
            title: title.into(),
            paragraphs,
        }
    }

    pub fn has_content(&self) -> bool {
        self.paragraphs.iter().any(|p| !p.trim().is_empty())
    }

    fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
        self.paragraphs = self
            .paragraphs
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();
    }
}

/// Structured AI-authored post, persisted as the JSON payload of a
/// `blog_ai_post` record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordPost {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: RecordPostStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(default)]
    pub introduction: PostSection,
    #[serde(default)]
    pub sections: Vec<PostSection>,
    #[serde(default)]
    pub conclusion: PostSection,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub meta_description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meta_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub meta_title: String,
    /// `data:image/png;base64,...` for generated images.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl RecordPost {
    /// A freshly proposed title waiting for review.
    pub fn new_pending(title: impl Into<String>) -> Self {
        let now = now_rfc3339();
        let title = title.into().trim().to_string();
        Self {
            meta_title: title.clone(),
            title,
            status: RecordPostStatus::Pending,
            created_at: now.clone(),
            updated_at: now,
            ..Default::default()
        }
    }

    /// Parse a post out of a record payload, taking the id from the record.
    pub fn from_record(record: &Record) -> Result<Self, PostError> {
        let payload: Value = if record.payload.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(&record.payload)?
        };
        let legacy_content = payload
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|c| !c.trim().is_empty());
        let mut post: RecordPost = serde_json::from_value(payload)?;
        post.id = record.id.clone();

        if let Some(content) = legacy_content {
            post.promote_legacy_content(&content);
        }

        if post.id.is_empty() {
            return Err(PostError::MissingId);
        }
        if post.title.trim().is_empty() {
            return Err(PostError::MissingTitle);
        }
        if post.meta_title.is_empty() {
            post.meta_title = post.title.clone();
        }
        let now = now_rfc3339();
        if post.created_at.is_empty() {
            post.created_at = now.clone();
        }
        if post.updated_at.is_empty() {
            post.updated_at = now;
        }
        Ok(post)
    }

    /// Older payloads kept the body as one markdown `content` string.
    fn promote_legacy_content(&mut self, content: &str) {
        if self.introduction.has_content() || !self.sections.is_empty() || self.conclusion.has_content() {
            return;
        }
        let parsed = markdown_to_record_post(content, &self.title);
        if self.title.trim().is_empty() {
            self.title = parsed.title;
        }
        self.introduction = parsed.introduction;
        self.sections = parsed.sections;
        self.conclusion = parsed.conclusion;
    }

    pub fn to_json(&self) -> Result<String, PostError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, PostError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Normalize then serialize for storage; fails without a title.
    pub fn to_record_payload(&self) -> Result<String, PostError> {
        let mut post = self.clone();
        post.normalize();
        post.validate_title()?;
        post.to_json()
    }

    /// Trim text, drop blank paragraphs and dedupe keyword lists.
    pub fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
        self.introduction.normalize();
        for section in &mut self.sections {
            section.normalize();
        }
        self.conclusion.normalize();
        self.keywords = dedupe_keywords(&self.keywords);
        self.meta_keywords = dedupe_keywords(&self.meta_keywords);
        if self.meta_title.trim().is_empty() {
            self.meta_title = self.title.clone();
        }
    }

    pub fn validate(&self) -> Result<(), PostError> {
        if self.id.trim().is_empty() {
            return Err(PostError::MissingId);
        }
        self.validate_title()
    }

    fn validate_title(&self) -> Result<(), PostError> {
        if self.title.trim().is_empty() {
            return Err(PostError::MissingTitle);
        }
        Ok(())
    }

    pub fn transition_to(&mut self, next: RecordPostStatus) -> Result<(), PostError> {
        if !self.status.can_transition_to(next) {
            return Err(PostError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = now_rfc3339();
    }
}

/// Trimmed, non-empty, case-insensitively unique; first spelling wins.
pub fn dedupe_keywords(keywords: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.to_lowercase()))
        .map(String::from)
        .collect()
}

/// Split a comma separated keyword string.
pub fn split_keywords(raw: &str) -> Vec<String> {
    let parts: Vec<String> = raw.split(',').map(String::from).collect();
    dedupe_keywords(&parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::RECORD_TYPE_BLOG_AI_POST;

    fn record_with(payload: &str) -> Record {
        let mut r = Record::new(RECORD_TYPE_BLOG_AI_POST);
        r.id = "rec-1".to_string();
        r.payload = payload.to_string();
        r
    }

    #[test]
    fn test_from_record_promotes_legacy_content() {
        let record = record_with(
            r#"{"title":"Old","content":"Welcome.\n\n## Terms\n\nRead them.\n\n## Conclusion\n\nDone."}"#,
        );
        let post = RecordPost::from_record(&record).unwrap();
        assert_eq!(post.introduction.paragraphs, vec!["Welcome."]);
        assert_eq!(post.sections.len(), 1);
        assert_eq!(post.sections[0].title, "Terms");
        assert_eq!(post.conclusion.paragraphs, vec!["Done."]);

        let structured = record_with(
            r#"{"title":"New","content":"ignored","sections":[{"title":"S","paragraphs":["p"]}]}"#,
        );
        let post = RecordPost::from_record(&structured).unwrap();
        assert_eq!(post.sections.len(), 1);
        assert!(post.introduction.paragraphs.is_empty());
    }

    #[test]
    fn test_from_record_injects_id_and_defaults() {
        let post = RecordPost::from_record(&record_with(r#"{"title":"Hello","status":"approved"}"#)).unwrap();
        assert_eq!(post.id, "rec-1");
        assert_eq!(post.status, RecordPostStatus::Approved);
        assert_eq!(post.meta_title, "Hello");
        assert!(!post.created_at.is_empty());
        assert!(!post.updated_at.is_empty());
    }

    #[test]
    fn test_from_record_requires_title() {
        let err = RecordPost::from_record(&record_with(r#"{"status":"pending"}"#)).unwrap_err();
        assert!(matches!(err, PostError::MissingTitle));
        assert_eq!(err.to_string(), "title is required");
    }

    #[test]
    fn test_from_record_requires_id() {
        let mut r = record_with(r#"{"title":"x"}"#);
        r.id = String::new();
        assert!(matches!(RecordPost::from_record(&r), Err(PostError::MissingId)));
    }

    #[test]
    fn test_legacy_content_promoted_to_paragraphs() {
        let payload = r#"{
            "title": "Legacy",
            "introduction": {"title": "Intro", "content": "Old intro"},
            "sections": [{"title": "S1", "content": "Old body"}],
            "conclusion": {"title": "End", "paragraphs": ["New style"]}
        }"#;
        let post = RecordPost::from_record(&record_with(payload)).unwrap();
        assert_eq!(post.introduction.paragraphs, vec!["Old intro"]);
        assert_eq!(post.sections[0].paragraphs, vec!["Old body"]);
        assert_eq!(post.conclusion.paragraphs, vec!["New style"]);
    }

    #[test]
    fn test_normalize_drops_blank_paragraphs_and_dupes() {
        let mut post = RecordPost::new_pending("  Title ");
        post.introduction = PostSection::new("Intro", vec!["a".into(), "   ".into(), " b ".into()]);
        post.keywords = vec!["Rust".into(), "rust ".into(), "".into(), "Axum".into()];
        post.normalize();
        assert_eq!(post.title, "Title");
        assert_eq!(post.introduction.paragraphs, vec!["a", "b"]);
        assert_eq!(post.keywords, vec!["Rust", "Axum"]);
    }

    #[test]
    fn test_payload_status_needle_matches_serialization() {
        let mut post = RecordPost::new_pending("T");
        post.status = RecordPostStatus::Approved;
        let json = post.to_record_payload().unwrap();
        assert!(json.contains(&RecordPostStatus::Approved.payload_needle()));
    }

    #[test]
    fn test_to_record_payload_rejects_blank_title() {
        let post = RecordPost::new_pending("   ");
        assert!(matches!(post.to_record_payload(), Err(PostError::MissingTitle)));
    }

    #[test]
    fn test_status_transitions() {
        use RecordPostStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Draft));
        assert!(Draft.can_transition_to(Published));
        assert!(!Published.can_transition_to(Pending));
        assert!(!Rejected.can_transition_to(Draft));

        let mut post = RecordPost::new_pending("T");
        post.status = Published;
        let err = post.transition_to(Pending).unwrap_err();
        assert_eq!(err.to_string(), "cannot move post from published to pending");
        assert_eq!(post.status, Published);
    }

    #[test]
    fn test_split_keywords() {
        assert_eq!(split_keywords("rust, axum,, Rust ,tokio"), vec!["rust", "axum", "tokio"]);
    }
}
