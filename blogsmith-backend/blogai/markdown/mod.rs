
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::post::{PostSection, RecordPost};

const INTRO_KEYWORDS: &[&str] = &["introduction", "intro", "getting started", "overview"];
const CONCLUSION_KEYWORDS: &[&str] = &[
    "conclusion",
    "summary",
    "final thoughts",
    "wrap up",
    "wrapping up",
    "closing thoughts",
];

const DEFAULT_INTRO_TITLE: &str = "Introduction";
const DEFAULT_CONCLUSION_TITLE: &str = "Conclusion";
const DEFAULT_SECTION_TITLE: &str = "Section";

// ---------------------------------------------------------------------------
// Flat block model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockType {
    #[serde(rename = "h1")]
    Heading1,
    #[serde(rename = "h2")]
    Heading2,
    #[serde(rename = "p")]
    Paragraph,
    #[serde(rename = "code")]
    Code,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heading1 => "h1",
            Self::Heading2 => "h2",
            Self::Paragraph => "p",
            Self::Code => "code",
        }
    }

    /// Accepts the wire names plus a few long forms posted by forms.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "h1" | "heading1" => Some(Self::Heading1),
            "h2" | "heading2" => Some(Self::Heading2),
            "p" | "paragraph" => Some(Self::Paragraph),
            "code" => Some(Self::Code),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Heading1 => "Heading 1",
            Self::Heading2 => "Heading 2",
            Self::Paragraph => "Paragraph",
            Self::Code => "Code",
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, Self::Heading1 | Self::Heading2)
    }
}

/// One editor unit. Ids are unique within an editing session only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockType,
    pub text: String,
}

impl Block {
    pub fn new(kind: BlockType, text: impl Into<String>) -> Self {
        Self {
            id: new_block_id(),
            kind,
            text: text.into(),
        }
    }

    /// Same content under a fresh id.
    pub fn duplicate(&self) -> Self {
        Self {
            id: new_block_id(),
            ..self.clone()
        }
    }
}

pub fn new_block_id() -> String {
    Uuid::new_v4().simple().to_string()
}

// ---------------------------------------------------------------------------
// Markdown → blocks
// ---------------------------------------------------------------------------

/// Split markdown into sequential blocks without inferring post structure.
pub fn markdown_to_blocks(markdown: &str) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut paragraph_lines: Vec<&str> = Vec::new();
    let mut code_lines: Vec<&str> = Vec::new();
    let mut open_fence: Option<&'static str> = None;

    for raw_line in markdown.split('\n') {
        let line = raw_line.trim_end_matches('\r');
        let trimmed = line.trim();

        if let Some(fence) = code_fence(trimmed) {
            match open_fence {
                None => {
                    flush_paragraph(&mut blocks, &mut paragraph_lines);
                    open_fence = Some(fence);
                    continue;
                }
                Some(open) if open == fence => {
                    open_fence = None;
                    flush_code(&mut blocks, &mut code_lines);
                    continue;
                }
                Some(_) => {}
            }
        }

        if open_fence.is_some() {
            code_lines.push(line);
            continue;
        }

        if trimmed.is_empty() {
            flush_paragraph(&mut blocks, &mut paragraph_lines);
            continue;
        }

        if let Some(text) = trimmed.strip_prefix("# ") {
            flush_paragraph(&mut blocks, &mut paragraph_lines);
            blocks.push(Block::new(BlockType::Heading1, text.trim()));
            continue;
        }

        if heading_level(trimmed) >= 2 {
            flush_paragraph(&mut blocks, &mut paragraph_lines);
            blocks.push(Block::new(BlockType::Heading2, heading_text(trimmed)));
            continue;
        }

        paragraph_lines.push(line);
    }

    flush_paragraph(&mut blocks, &mut paragraph_lines);
    flush_code(&mut blocks, &mut code_lines);
    blocks
}

fn flush_paragraph(blocks: &mut Vec<Block>, lines: &mut Vec<&str>) {
    if lines.is_empty() {
        return;
    }
    let text = normalize_paragraph(&lines.join("\n"));
    lines.clear();
    if !text.trim().is_empty() {
        blocks.push(Block::new(BlockType::Paragraph, text));
    }
}

fn flush_code(blocks: &mut Vec<Block>, lines: &mut Vec<&str>) {
    if lines.is_empty() {
        return;
    }
    blocks.push(Block::new(BlockType::Code, lines.join("\n")));
    lines.clear();
}

// ---------------------------------------------------------------------------
// Blocks → markdown
// ---------------------------------------------------------------------------

pub fn blocks_to_markdown(blocks: &[Block]) -> String {
    let mut out = String::new();

    for block in blocks {
        let text = block.text.trim_end_matches('\n');
        if text.trim().is_empty() && block.kind != BlockType::Code {
            continue;
        }

        match block.kind {
            BlockType::Heading1 => {
                out.push_str("# ");
                out.push_str(text.trim());
                out.push_str("\n\n");
            }
            BlockType::Heading2 => {
                out.push_str("## ");
                out.push_str(text.trim());
                out.push_str("\n\n");
            }
            BlockType::Paragraph => {
                let cleaned = normalize_paragraph(text);
                if cleaned.trim().is_empty() {
                    continue;
                }
                out.push_str(&cleaned);
                out.push_str("\n\n");
            }
            BlockType::Code => {
                out.push_str("```\n");
                out.push_str(text);
                out.push_str("\n```\n\n");
            }
        }
    }

    out.trim().to_string()
}

// ---------------------------------------------------------------------------
// Markdown ↔ RecordPost
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ParsedSection<'a> {
    title: String,
    lines: Vec<&'a str>,
}

/// Build a structured post from markdown. `fallback_title` is used when the
/// document has no level-1 heading.
pub fn markdown_to_record_post(markdown: &str, fallback_title: &str) -> RecordPost {
    let (title, preamble, mut sections) = parse_markdown(markdown);

    let mut post = RecordPost {
        title: if title.trim().is_empty() {
            fallback_title.trim().to_string()
        } else {
            title.trim().to_string()
        },
        introduction: PostSection::new(DEFAULT_INTRO_TITLE, Vec::new()),
        conclusion: PostSection::new(DEFAULT_CONCLUSION_TITLE, Vec::new()),
        ..Default::default()
    };

    post.introduction.paragraphs = paragraphs_from_lines(&preamble);

    if post.introduction.paragraphs.is_empty()
        && sections.first().is_some_and(|s| is_intro_title(&s.title))
    {
        let first = sections.remove(0);
        post.introduction = PostSection::new(first.title, paragraphs_from_lines(&first.lines));
    }

    if sections.last().is_some_and(|s| is_conclusion_title(&s.title)) {
        if let Some(last) = sections.pop() {
            post.conclusion = PostSection::new(last.title, paragraphs_from_lines(&last.lines));
        }
    }

    for section in sections {
        let paragraphs = paragraphs_from_lines(&section.lines);
        if paragraphs.is_empty() && section.title.trim().is_empty() {
            continue;
        }
        post.sections.push(PostSection::new(section.title, paragraphs));
    }

    if post.introduction.paragraphs.is_empty() {
        if !post.sections.is_empty() && post.conclusion.paragraphs.is_empty() {
            let first = post.sections.remove(0);
            if !first.title.trim().is_empty() {
                post.introduction.title = first.title;
            }
            post.introduction.paragraphs = first.paragraphs;
        } else if post.sections.is_empty() && !post.conclusion.paragraphs.is_empty() {
            post.introduction.paragraphs = std::mem::take(&mut post.conclusion.paragraphs);
        }
    }

    if post.introduction.title.trim().is_empty() {
        post.introduction.title = DEFAULT_INTRO_TITLE.to_string();
    }
    if post.conclusion.title.trim().is_empty() {
        post.conclusion.title = DEFAULT_CONCLUSION_TITLE.to_string();
    }

    post
}

/// Render a structured post as markdown. Every part with text or a title is
/// written; fully empty parts are skipped.
pub fn record_post_to_markdown(post: &RecordPost) -> String {
    let mut out = String::new();

    let title = post.title.trim();
    if !title.is_empty() {
        out.push_str("# ");
        out.push_str(title);
        out.push_str("\n\n");
    }

    let parts = std::iter::once(&post.introduction)
        .chain(&post.sections)
        .chain(std::iter::once(&post.conclusion));
    for section in parts {
        if section.has_content() || !section.title.trim().is_empty() {
            write_section(&mut out, section);
        }
    }

    out.trim().to_string()
}

fn write_section(out: &mut String, section: &PostSection) {
    let title = match section.title.trim() {
        "" => DEFAULT_SECTION_TITLE,
        t => t,
    };
    out.push_str("## ");
    out.push_str(title);
    out.push_str("\n\n");

    for paragraph in &section.paragraphs {
        let cleaned = normalize_paragraph(paragraph);
        if cleaned.trim().is_empty() {
            continue;
        }
        out.push_str(&cleaned);
        out.push_str("\n\n");
    }
}

fn parse_markdown(markdown: &str) -> (String, Vec<&str>, Vec<ParsedSection<'_>>) {
    let mut title = String::new();
    let mut preamble: Vec<&str> = Vec::new();
    let mut sections: Vec<ParsedSection<'_>> = Vec::new();
    let mut open_fence: Option<&'static str> = None;

    for raw_line in markdown.split('\n') {
        let line = raw_line.trim_end_matches('\r');
        let trimmed = line.trim();

        if let Some(fence) = code_fence(trimmed) {
            match open_fence {
                None => open_fence = Some(fence),
                Some(open) if open == fence => open_fence = None,
                Some(_) => {}
            }
            push_line(&mut sections, &mut preamble, line);
            continue;
        }

        if open_fence.is_none() {
            if title.is_empty() {
                if let Some(text) = trimmed.strip_prefix("# ") {
                    title = text.trim().to_string();
                    continue;
                }
            }

            if heading_level(trimmed) >= 2 {
                sections.push(ParsedSection {
                    title: heading_text(trimmed).to_string(),
                    lines: Vec::new(),
                });
                continue;
            }
        }

        push_line(&mut sections, &mut preamble, line);
    }

    (title, preamble, sections)
}

fn push_line<'a>(sections: &mut [ParsedSection<'a>], preamble: &mut Vec<&'a str>, line: &'a str) {
    match sections.last_mut() {
        Some(current) => current.lines.push(line),
        None => preamble.push(line),
    }
}

/// Group lines into paragraphs on blank lines; fenced code stays intact.
fn paragraphs_from_lines(lines: &[&str]) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut open_fence: Option<&'static str> = None;

    let flush = |buffer: &mut Vec<&str>, paragraphs: &mut Vec<String>| {
        if buffer.is_empty() {
            return;
        }
        let paragraph = normalize_paragraph(&buffer.join("\n"));
        buffer.clear();
        if !paragraph.trim().is_empty() {
            paragraphs.push(paragraph);
        }
    };

    for raw_line in lines {
        let line = raw_line.trim_end_matches('\r');
        let trimmed = line.trim();

        if let Some(fence) = code_fence(trimmed) {
            match open_fence {
                None => open_fence = Some(fence),
                Some(open) if open == fence => open_fence = None,
                Some(_) => {}
            }
            buffer.push(line);
            continue;
        }

        if open_fence.is_none() && trimmed.is_empty() {
            flush(&mut buffer, &mut paragraphs);
            continue;
        }

        buffer.push(line);
    }

    flush(&mut buffer, &mut paragraphs);
    paragraphs
}

// ---------------------------------------------------------------------------
// Line helpers
// ---------------------------------------------------------------------------

/// Strip surrounding newlines and trailing spaces/tabs on every line.
pub fn normalize_paragraph(paragraph: &str) -> String {
    paragraph
        .trim_matches(['\n', '\r'])
        .split('\n')
        .map(|l| l.trim_end_matches([' ', '\t']))
        .collect::<Vec<_>>()
        .join("\n")
}

fn code_fence(trimmed: &str) -> Option<&'static str> {
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

/// Number of leading `#` when followed by a space, otherwise 0.
fn heading_level(line: &str) -> usize {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if hashes > 0 && line.as_bytes().get(hashes) == Some(&b' ') {
        hashes
    } else {
        0
    }
}

fn heading_text(line: &str) -> &str {
    let level = heading_level(line);
    if level == 0 {
        return line;
    }
    line[level + 1..].trim()
}

fn is_intro_title(title: &str) -> bool {
    let lowered = title.trim().to_lowercase();
    INTRO_KEYWORDS.contains(&lowered.as_str())
}

fn is_conclusion_title(title: &str) -> bool {
    let lowered = title.trim().to_lowercase();
    CONCLUSION_KEYWORDS.contains(&lowered.as_str())
}
