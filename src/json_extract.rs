//! Lenient extraction of a segment array from free-form model output
//!
//! Stages, first success wins:
//! 1. strip a markdown code fence and parse strictly
//! 2. greedy `[...]` pattern match over the text
//! 3. first bracket-balanced `[...]` substring that parses
//!
//! Elements without a non-empty `from` or `to` are dropped.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::models::Segment;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```").expect("valid regex")
});

static GREEDY_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("valid regex"));

/// Highway label used when the model omits one
pub const UNKNOWN_HIGHWAY: &str = "Unknown";

/// Why no segment array could be recovered
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseFailure {
    #[error("response is empty")]
    Empty,
    #[error("no JSON array found in response")]
    NoArray,
    #[error("JSON array is malformed: {0}")]
    Malformed(String),
}

/// Parse a model response into segments, tolerating fences and chatter
pub fn parse_json_array_leniently(text: &str) -> Result<Vec<Segment>, ParseFailure> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseFailure::Empty);
    }

    let unfenced = strip_code_fence(trimmed);
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(unfenced) {
        return Ok(segments_from_values(items));
    }

    let mut last_error = None;
    if let Some(found) = GREEDY_ARRAY.find(unfenced) {
        match serde_json::from_str::<Value>(found.as_str()) {
            Ok(Value::Array(items)) => return Ok(segments_from_values(items)),
            Ok(_) => {}
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    for candidate in balanced_arrays(unfenced) {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(candidate) {
            return Ok(segments_from_values(items));
        }
    }

    match last_error {
        Some(message) => Err(ParseFailure::Malformed(message)),
        None => Err(ParseFailure::NoArray),
    }
}

/// Return the body of the first fenced block, or the text unchanged
fn strip_code_fence(text: &str) -> &str {
    FENCED_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(text)
}

/// Bracket-balanced `[...]` substrings in order of their opening bracket.
/// Brackets inside JSON string literals are ignored. Single pass over the text.
fn balanced_arrays(text: &str) -> Vec<&str> {
    let mut open = Vec::new();
    let mut pairs = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (index, &byte) in text.as_bytes().iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' => open.push(index),
            b']' => {
                if let Some(start) = open.pop() {
                    pairs.push((start, index));
                }
            }
            _ => {}
        }
    }

    pairs.sort_unstable_by_key(|&(start, _)| start);
    pairs
        .into_iter()
        .map(|(start, end)| &text[start..=end])
        .collect()
}

fn segments_from_values(items: Vec<Value>) -> Vec<Segment> {
    items
        .into_iter()
        .filter_map(|item| {
            let from = string_field(&item, "from")?;
            let to = string_field(&item, "to")?;
            let highway =
                string_field(&item, "highway").unwrap_or_else(|| UNKNOWN_HIGHWAY.to_string());
            Some(Segment { from, to, highway })
        })
        .collect()
}

fn string_field(item: &Value, key: &str) -> Option<String> {
    let text = match item.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
