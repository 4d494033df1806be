//! Fenced-JSON extraction with truncation-tolerant fallback.
//!
//! Strategy: locate a ```json block and parse its contents. If the block is
//! absent or fails to parse, strip leading/trailing fence markers from the
//! whole text and try again. Both failing is `MalformedModelOutput` with a
//! short preview of the raw text for diagnosis.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::WizardError;

/// Prefix of transient "thinking" lines interleaved into streamed
/// responses. Stripped before parsing; callers may show them as progress.
pub const THINKING_MARKER: &str = "[pensando]";

const PREVIEW_CHARS: usize = 200;

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

fn malformed(raw: &str) -> WizardError {
    WizardError::MalformedModelOutput {
        preview: preview(raw),
    }
}

/// Remove thinking-marker lines from streamed text. Returns the cleaned
/// text and the marker lines in stream order.
pub fn strip_thinking_lines(text: &str) -> (String, Vec<String>) {
    let mut kept = Vec::new();
    let mut thoughts = Vec::new();
    for line in text.lines() {
        match line.trim_start().strip_prefix(THINKING_MARKER) {
            Some(rest) => thoughts.push(rest.trim().to_string()),
            None => kept.push(line),
        }
    }
    (kept.join("\n"), thoughts)
}

/// Content of the first ```json fence, if any. The label match is
/// case-insensitive; a missing closing fence runs to end of text.
fn fenced_block(text: &str) -> Option<&str> {
    for (idx, _) in text.match_indices("```") {
        let after = &text[idx + 3..];
        let Some(label) = after.get(..4) else {
            continue;
        };
        if label.eq_ignore_ascii_case("json") {
            let content = &after[4..];
            let end = content.find("```").unwrap_or(content.len());
            return Some(content[..end].trim());
        }
    }
    None
}

/// Drop a leading and trailing fence line, keeping everything between.
fn strip_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines
        .first()
        .is_some_and(|l| l.trim_start().starts_with("```"))
    {
        lines.remove(0);
    }
    if lines
        .last()
        .is_some_and(|l| l.trim_start().starts_with("```"))
    {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

/// Extract a JSON value from raw model text.
pub fn extract_json(text: &str) -> Result<Value, WizardError> {
    let (body, _) = strip_thinking_lines(text);

    if let Some(block) = fenced_block(&body) {
        if let Ok(value) = serde_json::from_str(block) {
            return Ok(value);
        }
    }

    let stripped = strip_fences(&body);
    serde_json::from_str(&stripped).map_err(|_| malformed(text))
}

/// Extract and deserialize a typed value from raw model text.
pub fn parse_fenced<T: DeserializeOwned>(text: &str) -> Result<T, WizardError> {
    let value = extract_json(text)?;
    serde_json::from_value(value).map_err(|_| malformed(text))
}
