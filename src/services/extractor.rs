//! Turns free-form model output into a validated [`WorkRecord`].
//!
//! The model is told to answer with bare JSON, but it regularly wraps the
//! object in markdown fences or surrounds it with prose. Extraction strips
//! fence markers, then tries an incremental JSON parse from each top-level `{`
//! in turn and keeps the first syntactically complete object. Stray braces or
//! a second object in trailing prose therefore do not break extraction.

use serde_json::{Map, Value};
use std::borrow::Cow;

use crate::{
    error::{AppError, AppResult},
    models::WorkRecord,
};

/// Maximum number of characters of model output echoed back in error payloads
pub const RAW_TEXT_LIMIT: usize = 2000;

const FENCE: &str = "```";

/// Extracts and validates a [`WorkRecord`] from raw model output
///
/// Fails with [`AppError::Extraction`] when no JSON object can be found or the
/// object does not fit the record shape, and with [`AppError::Validation`] when
/// `title` or `order` is missing.
pub fn extract_work_record(raw: &str) -> AppResult<WorkRecord> {
    let text = strip_code_fences(raw);

    let Some(object) = find_first_object(&text) else {
        tracing::error!(
            raw_len = raw.len(),
            raw = %truncate_raw(raw),
            "No JSON object found in AI response"
        );
        return Err(AppError::Extraction {
            raw_text: truncate_raw(raw),
        });
    };

    let missing = missing_required_fields(&object);
    if !missing.is_empty() {
        tracing::error!(missing = ?missing, "AI response is missing required fields");
        return Err(AppError::Validation {
            missing,
            raw_text: truncate_raw(raw),
        });
    }

    serde_json::from_value(Value::Object(object)).map_err(|e| {
        tracing::error!(error = %e, "AI response does not match the work record shape");
        AppError::Extraction {
            raw_text: truncate_raw(raw),
        }
    })
}

/// Removes markdown fence markers (```` ``` ```` with an optional language tag)
fn strip_code_fences(text: &str) -> Cow<'_, str> {
    if !text.contains(FENCE) {
        return Cow::Borrowed(text);
    }

    let stripped = text
        .lines()
        .map(strip_fence_line)
        .collect::<Vec<_>>()
        .join("\n");
    Cow::Owned(stripped)
}

fn strip_fence_line(line: &str) -> &str {
    let mut rest = line.trim();
    if let Some(after) = rest.strip_prefix(FENCE) {
        rest = after.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(before) = rest.strip_suffix(FENCE) {
        rest = before;
    }
    rest
}

/// First complete JSON object found scanning `{` positions left to right
///
/// Only braces at nesting depth zero start a candidate. A `{` inside an object
/// that failed to parse (for example one cut off mid-stream) is never retried,
/// so a nested fragment cannot stand in for the outer record.
fn find_first_object(text: &str) -> Option<Map<String, Value>> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '{' => {
                if depth == 0 {
                    if let Some(object) = parse_object_at(&text[idx..]) {
                        return Some(object);
                    }
                }
                depth += 1;
            }
            '}' => depth = depth.saturating_sub(1),
            // Quotes only matter inside a candidate; prose may carry stray ones
            '"' if depth > 0 => in_string = true,
            _ => {}
        }
    }

    None
}

fn parse_object_at(text: &str) -> Option<Map<String, Value>> {
    let mut values = serde_json::Deserializer::from_str(text).into_iter::<Value>();
    match values.next() {
        Some(Ok(Value::Object(object))) => Some(object),
        _ => None,
    }
}

fn missing_required_fields(object: &Map<String, Value>) -> Vec<&'static str> {
    let mut missing = Vec::new();

    let has_title = object
        .get("title")
        .and_then(Value::as_str)
        .is_some_and(|title| !title.trim().is_empty());
    if !has_title {
        missing.push("title");
    }

    if !object.get("order").is_some_and(Value::is_array) {
        missing.push("order");
    }

    missing
}

fn truncate_raw(raw: &str) -> String {
    match raw.char_indices().nth(RAW_TEXT_LIMIT) {
        Some((cut, _)) => raw[..cut].to_string(),
        None => raw.to_string(),
    }
}
