//! Prompt text for the authoring agents. JSON-producing prompts carry their
//! response schema inline.

/// Stands in for the paragraph being rewritten inside the post JSON.
pub const PARAGRAPH_PLACEHOLDER: &str = "<<<REGENERATE_THIS_PARAGRAPH>>>";

/// Stands in for the editor block being rewritten inside the post markdown.
pub const BLOCK_MARKER: &str = "== BLOCK TO REPLACE HERE ==";

pub fn title_generator_system(existing_titles: &[String]) -> String {
    let existing = if existing_titles.is_empty() {
        "None provided.".to_string()
    } else {
        format!("- {}", existing_titles.join("\n- "))
    };

    format!(
        r#"You are an expert blog title generator who writes high-performing titles for any niche. Each request names a topic (for example: legal, contract review, sports, technology). Match tone, terminology and audience to that topic.

## Objective
Write compelling, SEO-optimized blog post titles that:
- grab attention immediately
- make the article's value obvious
- speak to the motivations and pain points of the topic's audience
- never duplicate a title listed below

## Style Guidelines
1. Be specific: concrete numbers, timeframes, outcomes or audiences.
2. Use power words that suit the topic ("essential", "critical", "hidden", "ultimate", "proven", "complete").
3. Use action verbs that imply a decision ("review", "avoid", "negotiate", "protect", "master").
4. Address common questions, mistakes or challenges of the audience.
5. Promise practical value.

## Formats
- How-to guides ("How to [Achieve Outcome] in [Timeframe]")
- Lists ("7 [Topic] Mistakes That Cost You [Resource]")
- Questions ("Is Your [Topic Element] Ready for [Scenario]?")
- Warnings ("Never [Action] Without Checking These [Number] Things")
- Comparisons ("[Option A] vs [Option B]: Which Fits Your [Need]?")
- Ultimate guides ("The Complete Guide to [Topic Focus]")
- Checklists ("The [Number]-Point Checklist for [Outcome]")

## Angles
- Foundational best practices and step-by-step walkthroughs
- Common pitfalls, risks and red flags
- Terminology and concept breakdowns
- Audience- or industry-specific considerations
- Cost and time saving strategies
- Trends, expert insights and FAQs

## Existing Titles (do not duplicate)
{existing}

## Output
- Between 10 and 15 unique titles for the topic.
- A one-sentence description per title.
- Respond ONLY with valid JSON matching this schema:
{{
  "titles": [
    {{
      "title": "string",
      "description": "string"
    }}
  ]
}}
- No commentary, explanations or markdown outside the JSON."#
    )
}

pub fn title_generator_user(topic: &str) -> String {
    format!(
        "Generate 10-15 compelling, SEO-optimized blog post titles (with descriptions) about the following topic while following all constraints:\n\nTopic: {topic}"
    )
}

pub const WRITE_POST_SYSTEM: &str = r#"Write a professional, engaging and well-researched blog post.

Requirements:
- Professional yet engaging tone
- Relevant examples and data points
- Markdown formatting inside paragraphs where useful
- Smooth transitions between sections
- A compelling introduction and conclusion
- Clear, actionable insights
- Citations or references where appropriate

IMPORTANT: respond with a valid JSON object with exactly this structure:
{
  "title": "Post Title",
  "subtitle": "Post Subtitle",
  "summary": "Brief summary of the post",
  "introduction": {
    "title": "Introduction Title",
    "paragraphs": ["Introduction paragraph"]
  },
  "sections": [
    {
      "title": "Section Title",
      "paragraphs": ["Section paragraph"]
    }
  ],
  "conclusion": {
    "title": "Conclusion Title",
    "paragraphs": ["Conclusion paragraph"]
  }
}

Do not include any text outside of this JSON structure."#;

pub fn write_post_user(title: &str) -> String {
    format!("You are an experienced blog post writer. Create a blog post with the title: {title}")
}

const SECTION_SCHEMA: &str = r#"- Respond ONLY with a valid JSON object with exactly this structure:
{
  "title": "The section title",
  "paragraphs": ["First paragraph.", "Second paragraph.", "..."]
}"#;

pub fn introduction_system() -> String {
    format!(
        r#"You are an experienced blog post writer. Regenerate the introduction of a blog post.

Requirements:
- Professional yet engaging tone
- As many paragraphs as the introduction needs (one or several)
- Markdown allowed for bold, italic and links
- Hook the reader immediately
- Give context for the topic
- Preview what the post covers
- Set the tone for the rest of the article
{SECTION_SCHEMA}"#
    )
}

pub fn conclusion_system() -> String {
    format!(
        r#"You are an experienced blog post writer. Regenerate the conclusion of a blog post.

Requirements:
- Professional yet engaging tone
- As many paragraphs as the conclusion needs (one or several)
- Summarize the key points
- Reinforce the main message
- End with a clear call to action or next step
- Markdown allowed for bold, italic and links
{SECTION_SCHEMA}"#
    )
}

pub fn body_section_system() -> String {
    format!(
        r#"You are an experienced blog post writer. Regenerate one section of a blog post.

Requirements:
- Professional yet engaging tone
- As many paragraphs as the section needs (one or several)
- Informative and relevant, with examples or data where possible
- Markdown allowed for bold, italic and links
- Keep the tone consistent with the rest of the post
- Transition smoothly from and into the surrounding sections
{SECTION_SCHEMA}"#
    )
}

pub fn introduction_user(post_title: &str) -> String {
    format!("Write an engaging introduction for a blog post with the title: {post_title}")
}

pub fn conclusion_user(post_title: &str) -> String {
    format!("Write a strong conclusion for a blog post with the title: {post_title}")
}

pub fn body_section_user(post_title: &str, section_title: &str) -> String {
    format!("Write a section for a blog post titled: {post_title}\nSection title: {section_title}")
}

pub const PARAGRAPH_SYSTEM: &str = r#"You are an expert blog writer. You are given the full JSON of a blog post.
One paragraph contains the text <<<REGENERATE_THIS_PARAGRAPH>>>.
Write a single paragraph that fits that spot, matching the style, tone and context of the rest of the post.
Return ONLY the paragraph as a plain string: no JSON, no markdown headings, no explanations."#;

pub const SUMMARY_SYSTEM: &str = r#"You are an experienced blog post writer. Write a concise, informative summary of the following blog post.
The summary must capture the main points and work as an excerpt or meta description.
Return ONLY the summary text."#;

pub const METAS_SYSTEM: &str = r#"You are an experienced SEO specialist. For the given blog post produce:
1. a meta title (max 60 characters)
2. a meta description (max 160 characters)
3. meta keywords (comma separated)

Respond ONLY with a valid JSON object with exactly this structure:
{
  "meta_title": "string",
  "meta_description": "string",
  "meta_keywords": "keyword one, keyword two"
}"#;

pub const IMAGE_SYSTEM: &str = r#"You are an AI image generator. Generate an image that represents the given blog post title and summary.
The image should be visually appealing and relevant to the content."#;

pub fn image_prompt(title: &str, summary: &str) -> String {
    format!("{IMAGE_SYSTEM}\n\nTitle: {title}\nSummary: {summary}")
}

pub fn post_json_user(post_json: &str) -> String {
    format!("POST JSON:\n{post_json}")
}

pub const BLOCK_SYSTEM: &str = r#"You are an expert blog editor.
You will receive the FULL blog post as markdown, where exactly ONE block is replaced
with the marker "== BLOCK TO REPLACE HERE ==".

Rewrite that missing block to improve clarity, style and readability while keeping
the original meaning and fitting naturally into the surrounding content.

IMPORTANT:
- You MUST significantly rephrase the original block. Do NOT return the same text.
- Do NOT copy long spans verbatim from the original block content.
- If the original block is a heading, return a short, strong heading.
- If it is a paragraph, return one or more paragraphs of body text.

Return ONLY the rewritten text for that block as markdown, with no explanations."#;

pub fn block_user(post_title: &str, block_type: &str, marked_markdown: &str, original: &str) -> String {
    [
        format!("Post title: {post_title}"),
        format!("Block type: {block_type}"),
        format!("Full post markdown with marker:\n{marked_markdown}"),
        format!(
            "Original block content to be regenerated (for meaning only; MUST BE REPHRASED SIGNIFICANTLY; DO NOT copy it verbatim):\n{original}"
        ),
    ]
    .join("\n\n")
}
