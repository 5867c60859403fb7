/// Strip a markdown code fence and any prose in front of the first `{` so the
/// remainder can be handed to `serde_json`.
pub fn sanitize_json_content(content: &str) -> String {
    let mut trimmed = content.trim();

    if trimmed.starts_with("```") {
        trimmed = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .unwrap_or(trimmed)
            .trim();
        trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed).trim();
    }

    match trimmed.find('{') {
        Some(idx) if idx > 0 => trimmed[idx..].trim().to_string(),
        _ => trimmed.to_string(),
    }
}
