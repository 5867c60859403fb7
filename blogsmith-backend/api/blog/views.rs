use askama::Template;

use crate::blogai::{PostSection, RecordPost, RecordPostStatus};

#[derive(Template)]
#[template(path = "page.html")]
pub(crate) struct PageView<'a> {
    pub title: &'a str,
    pub body: &'a str,
}

#[derive(Template)]
#[template(path = "title_manager.html")]
pub(crate) struct TitleManagerView {
    pub action_url: String,
    pub settings_url: String,
    pub settings_component_id: String,
    pub post_generator_url: String,
    pub rows: Vec<TitleRow>,
    pub settings_html: String,
}

pub(crate) struct TitleRow {
    pub id: String,
    pub title: String,
    pub status: &'static str,
    pub created_at: String,
    pub updated_at: String,
    pub can_approve: bool,
    pub can_reject: bool,
}

impl TitleRow {
    pub fn from_post(post: &RecordPost) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            status: post.status.as_str(),
            created_at: post.created_at.clone(),
            updated_at: post.updated_at.clone(),
            can_approve: post.status.can_transition_to(RecordPostStatus::Approved),
            can_reject: post.status.can_transition_to(RecordPostStatus::Rejected),
        }
    }
}

#[derive(Template)]
#[template(path = "post_generator.html")]
pub(crate) struct PostGeneratorView {
    pub action_url: String,
    pub title_generator_url: String,
    pub approved: Vec<ApprovedRow>,
    pub drafts: Vec<DraftRow>,
}

pub(crate) struct ApprovedRow {
    pub id: String,
    pub title: String,
}

pub(crate) struct DraftRow {
    pub title: String,
    pub status: &'static str,
    pub editor_url: String,
}

#[derive(Template)]
#[template(path = "post_manager.html")]
pub(crate) struct PostManagerView {
    pub title_generator_url: String,
    pub post_generator_url: String,
    pub rows: Vec<PostRow>,
}

pub(crate) struct PostRow {
    pub title: String,
    pub status: &'static str,
    pub updated_at: String,
    pub content_url: String,
}

#[derive(Template)]
#[template(path = "post_editor.html")]
pub(crate) struct PostEditorView<'a> {
    pub title: &'a str,
    pub subtitle: &'a str,
    pub summary: &'a str,
    pub meta_title: &'a str,
    pub meta_description: &'a str,
    pub meta_keywords: String,
    pub image: &'a str,
    pub action_url: String,
    pub sections: Vec<SectionView<'a>>,
    pub post_json: String,
}

pub(crate) struct SectionView<'a> {
    pub title: &'a str,
    /// Value for `regenerate_section`.
    pub selector: String,
    /// Value for `regenerate_paragraph`.
    pub section_type: &'static str,
    pub section_index: usize,
    pub paragraphs: Vec<ParagraphView<'a>>,
    pub append_index: usize,
}

pub(crate) struct ParagraphView<'a> {
    pub index: usize,
    pub text: &'a str,
}

impl<'a> SectionView<'a> {
    fn new(section: &'a PostSection, selector: String, section_type: &'static str, section_index: usize) -> Self {
        Self {
            title: &section.title,
            selector,
            section_type,
            section_index,
            paragraphs: section
                .paragraphs
                .iter()
                .enumerate()
                .map(|(index, text)| ParagraphView { index, text })
                .collect(),
            append_index: section.paragraphs.len(),
        }
    }

    /// Introduction, body sections, conclusion; in reading order.
    pub fn for_post(post: &'a RecordPost) -> Vec<Self> {
        let mut sections = vec![Self::new(&post.introduction, "introduction".into(), "introduction", 0)];
        sections.extend(
            post.sections
                .iter()
                .enumerate()
                .map(|(i, section)| Self::new(section, format!("section_{i}"), "section", i)),
        );
        sections.push(Self::new(&post.conclusion, "conclusion".into(), "conclusion", 0));
        sections
    }
}
