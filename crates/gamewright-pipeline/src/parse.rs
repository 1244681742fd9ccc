use regex::Regex;
use serde::de::DeserializeOwned;

use gamewright_core::error::{GamewrightError, Result};

/// Strip a Markdown code fence from model output, if present.
///
/// Falls back to the slice between the first `{` and the last `}` so that
/// prose-wrapped JSON still parses.
pub fn extract_json(text: &str) -> &str {
    let fence = Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap();
    if let Some(captures) = fence.captures(text) {
        if let Some(inner) = captures.get(1) {
            return inner.as_str();
        }
    }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return &text[start..=end];
        }
    }
    text.trim()
}

/// Strip a surrounding code fence from generated file content.
///
/// Unlike [`extract_json`] this never guesses at braces; unfenced content
/// passes through untouched.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(end) = rest.rfind("```") {
            let inner = &rest[..end];
            // The first line is the language tag, if any.
            return match inner.find('\n') {
                Some(newline) => inner[newline + 1..].trim_end(),
                None => inner.trim(),
            };
        }
    }
    text
}

/// Parse model output against a declared schema, attributing failures to
/// the producing step.
pub fn parse_schema<T: DeserializeOwned>(step: &str, text: &str) -> Result<T> {
    serde_json::from_str(extract_json(text)).map_err(|e| GamewrightError::SchemaValidation {
        step: step.to_string(),
        message: e.to_string(),
    })
}
