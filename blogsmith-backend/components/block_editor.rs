use askama::Template;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Component, FormFields, Toast, form_value};
use crate::blogai::markdown::{Block, BlockType, blocks_to_markdown, markdown_to_blocks};
use crate::blogai::{AgentError, BlogWriterAgent};
use crate::links::AdminLinks;
use crate::posts::{BlogPost, PostEditor};
use crate::registry::Registry;

pub const MSG_POST_ID_REQUIRED: &str = "Post ID is required";
pub const MSG_POST_NOT_FOUND: &str = "Post not found";
pub const MSG_BLOCK_NOT_FOUND: &str = "Block not found";
pub const MSG_NO_REWRITE: &str = "LLM did not provide a meaningful rewrite for this block.";
pub const MSG_REGENERATE_FAILED: &str = "Failed to regenerate block content. Please try again later.";
pub const MSG_SAVE_FAILED: &str = "Failed to save post. Please try again later.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockEditorState {
    pub post: Option<BlogPost>,
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub success: String,
    #[serde(default)]
    pub redirect_to: String,
}

impl BlockEditorState {
    fn clear_messages(&mut self) {
        self.error.clear();
        self.success.clear();
        self.redirect_to.clear();
    }

    fn position(&self, block_id: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == block_id)
    }
}

/// Flat list-of-blocks editor for the markdown content of one blog post.
pub struct FlatBlockEditor {
    registry: Registry,
    state: BlockEditorState,
}

impl FlatBlockEditor {
    /// Load the post and split its content into blocks. Load problems end
    /// up in `state.error`; the editor still renders.
    pub async fn mount(registry: Registry, post_id: &str) -> Self {
        let mut state = BlockEditorState::default();
        let post_id = post_id.trim();

        if post_id.is_empty() {
            state.error = MSG_POST_ID_REQUIRED.to_string();
        } else {
            match registry.posts.find_by_id(post_id).await {
                Ok(Some(post)) => {
                    state.blocks = markdown_to_blocks(&post.content);
                    state.post = Some(post);
                }
                Ok(None) => state.error = MSG_POST_NOT_FOUND.to_string(),
                Err(e) => {
                    tracing::error!(post_id = %post_id, error = %e, "failed to load post for block editor");
                    state.error = MSG_POST_NOT_FOUND.to_string();
                }
            }
        }

        Self { registry, state }
    }

    /// Adopt the client's block order. Unknown ids are ignored and blocks the
    /// order leaves out keep their relative position at the end. An order
    /// naming no known block keeps the current order.
    fn reconcile_order(&mut self, block_order: &str) {
        if block_order.trim().is_empty() {
            return;
        }
        let mut remaining = std::mem::take(&mut self.state.blocks);
        let mut ordered = Vec::with_capacity(remaining.len());
        for id in block_order.split(',').map(str::trim).filter(|id| !id.is_empty()) {
            if let Some(pos) = remaining.iter().position(|b| b.id == id) {
                ordered.push(remaining.remove(pos));
            }
        }
        if ordered.is_empty() {
            tracing::warn!(block_order = %block_order, "block order matched no blocks, keeping current order");
        } else if !remaining.is_empty() {
            tracing::debug!(missing = remaining.len(), "block order omitted blocks, appending them");
        }
        ordered.append(&mut remaining);
        self.state.blocks = ordered;
    }

    fn delete_block(&mut self, block_id: &str) {
        match self.state.position(block_id) {
            Some(idx) => {
                self.state.blocks.remove(idx);
                self.state.success = "Block deleted".to_string();
            }
            None => self.state.error = MSG_BLOCK_NOT_FOUND.to_string(),
        }
    }

    fn duplicate_block(&mut self, block_id: &str) {
        match self.state.position(block_id) {
            Some(idx) => {
                let copy = self.state.blocks[idx].duplicate();
                self.state.blocks.insert(idx + 1, copy);
                self.state.success = "Block duplicated".to_string();
            }
            None => self.state.error = MSG_BLOCK_NOT_FOUND.to_string(),
        }
    }

    async fn regenerate_block(&mut self, block_id: &str) {
        let Some(idx) = self.state.position(block_id) else {
            self.state.error = MSG_BLOCK_NOT_FOUND.to_string();
            return;
        };
        let title = self.state.post.as_ref().map(|p| p.title.as_str()).unwrap_or_default();

        let result = BlogWriterAgent::new()
            .regenerate_block(self.registry.llm.as_ref(), title, &self.state.blocks, block_id)
            .await;
        match result {
            Ok(text) => {
                self.state.blocks[idx].text = text;
                self.state.success = "Block regenerated".to_string();
            }
            Err(AgentError::Validation(reason)) => {
                tracing::warn!(block_id = %block_id, reason = %reason, "block rewrite rejected");
                self.state.error = MSG_NO_REWRITE.to_string();
            }
            Err(e) => {
                tracing::error!(block_id = %block_id, error = %e, "failed to regenerate block");
                self.state.error = MSG_REGENERATE_FAILED.to_string();
            }
        }
    }

    /// Text and type come from `block_<id>` / `block_type_<id>`; absent
    /// fields keep the block's current value.
    fn blocks_from_form(&self, form: &FormFields) -> Vec<Block> {
        self.state
            .blocks
            .iter()
            .map(|block| {
                let kind = form
                    .get(&format!("block_type_{}", block.id))
                    .and_then(|t| BlockType::parse(t))
                    .unwrap_or(block.kind);
                let text = form
                    .get(&format!("block_{}", block.id))
                    .cloned()
                    .unwrap_or_else(|| block.text.clone());
                Block {
                    id: block.id.clone(),
                    kind,
                    text,
                }
            })
            .collect()
    }

    async fn save(&mut self, form: &FormFields, close: bool) {
        let Some(current) = self.state.post.as_ref() else {
            self.state.error = MSG_POST_NOT_FOUND.to_string();
            return;
        };

        let blocks = self.blocks_from_form(form);
        let mut post = current.clone();
        post.content = blocks_to_markdown(&blocks);
        let title = form_value(form, "title");
        if !title.is_empty() {
            post.title = title.to_string();
        }
        let summary = form_value(form, "summary");
        if !summary.is_empty() {
            post.summary = summary.to_string();
        }
        post.editor = PostEditor::Markdown;
        post.updated_at = chrono::Utc::now();

        if let Err(e) = self.registry.posts.update(post.clone()).await {
            tracing::error!(post_id = %post.id, error = %e, "failed to save post from block editor");
            self.state.error = MSG_SAVE_FAILED.to_string();
            return;
        }

        tracing::info!(post_id = %post.id, blocks = blocks.len(), "post content saved");
        self.state.blocks = blocks;
        self.state.post = Some(post);
        if close {
            self.state.success = "Post saved successfully".to_string();
            self.state.redirect_to = AdminLinks::post_manager();
        } else {
            self.state.success = "Changes applied successfully".to_string();
        }
    }
}

#[async_trait]
impl Component for FlatBlockEditor {
    type State = BlockEditorState;

    fn restore(registry: Registry, state: Self::State) -> Self {
        Self { registry, state }
    }

    fn state(&self) -> &Self::State {
        &self.state
    }

    #[tracing::instrument(skip_all, fields(action = %action))]
    async fn handle(&mut self, action: &str, form: &FormFields) {
        self.state.clear_messages();
        if self.state.post.is_none() {
            self.state.error = MSG_POST_NOT_FOUND.to_string();
            return;
        }

        self.reconcile_order(form_value(form, "block_order"));
        let block_id = form_value(form, "block_id");

        match action {
            "reorder" => {}
            "delete_block" => self.delete_block(block_id),
            "duplicate_block" => self.duplicate_block(block_id),
            "regenerate_block" => self.regenerate_block(block_id).await,
            "apply" => self.save(form, false).await,
            "save_close" => self.save(form, true).await,
            other => {
                tracing::warn!(action = %other, "unknown block editor action");
                self.state.error = format!("Unknown action: {other}");
            }
        }
    }

    fn is_finished(&self) -> bool {
        !self.state.redirect_to.is_empty()
    }

    fn render(&self, component_id: &str) -> Result<String, askama::Error> {
        let post_id = self.state.post.as_ref().map(|p| p.id.as_str()).unwrap_or_default();
        let blocks: Vec<BlockView<'_>> = self.state.blocks.iter().map(BlockView::from).collect();
        let block_order = self
            .state
            .blocks
            .iter()
            .map(|b| b.id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let toast = Toast::from_messages(&self.state.error, &self.state.success, &self.state.redirect_to);

        BlockEditorView {
            component_id,
            action_url: AdminLinks::ai_post_content_update(post_id),
            post_manager_url: AdminLinks::post_manager(),
            post_update_url: AdminLinks::post_update(post_id),
            has_post: self.state.post.is_some(),
            title: self.state.post.as_ref().map(|p| p.title.as_str()).unwrap_or_default(),
            summary: self.state.post.as_ref().map(|p| p.summary.as_str()).unwrap_or_default(),
            blocks,
            block_order,
            has_toast: toast.is_some(),
            toast: toast.unwrap_or_default(),
        }
        .render()
    }
}

struct BlockView<'a> {
    id: &'a str,
    kind: &'static str,
    label: &'static str,
    text: &'a str,
    is_heading: bool,
    rows: u32,
}

impl<'a> From<&'a Block> for BlockView<'a> {
    fn from(block: &'a Block) -> Self {
        Self {
            id: &block.id,
            kind: block.kind.as_str(),
            label: block.kind.label(),
            text: &block.text,
            is_heading: block.kind.is_heading(),
            rows: if block.kind == BlockType::Code { 6 } else { 3 },
        }
    }
}

#[derive(Template)]
#[template(path = "block_editor.html")]
struct BlockEditorView<'a> {
    component_id: &'a str,
    action_url: String,
    post_manager_url: String,
    post_update_url: String,
    has_post: bool,
    title: &'a str,
    summary: &'a str,
    blocks: Vec<BlockView<'a>>,
    block_order: String,
    has_toast: bool,
    toast: Toast,
}
