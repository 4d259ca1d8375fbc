//! Unwrapping the provider's reply into a JSON object or plain text.
//!
//! Models often wrap JSON in Markdown code fences or surround it with prose.
//! Unwrapping is a separate step from interpreting the object as an action.

use serde_json::{Map, Value};

use notemind_core::{Error, Result};

/// The provider reply after unwrapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// A single JSON object.
    Structured(Map<String, Value>),
    /// Freeform text containing no braces at all.
    PlainText(String),
}

/// Remove a surrounding Markdown code fence, if any.
///
/// Handles ```` ```json ... ``` ````, bare ```` ``` ```` fences, and a fenced
/// block embedded in surrounding prose (the first block wins).
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    let after_open = &trimmed[open + 3..];
    // Skip the info string ("json", "JSON", ...) up to the end of that line.
    let body_start = match after_open.find('\n') {
        Some(nl) if after_open[..nl].trim().chars().all(|c| c.is_ascii_alphanumeric()) => nl + 1,
        _ => {
            let info_len = after_open
                .chars()
                .take_while(|c| c.is_ascii_alphabetic())
                .map(char::len_utf8)
                .sum::<usize>();
            info_len
        }
    };
    let body = &after_open[body_start..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Unwrap a provider reply.
///
/// - Text without any `{` or `}` is returned as [`Envelope::PlainText`],
///   verbatim apart from surrounding whitespace.
/// - Otherwise the text must contain one parseable JSON object, or the reply
///   fails with a format error. The raw text travels with the error for
///   diagnostics only.
pub fn parse_envelope(raw: &str) -> Result<Envelope> {
    if raw.trim().is_empty() {
        return Err(Error::format("empty reply", raw));
    }

    if !raw.contains('{') && !raw.contains('}') {
        return Ok(Envelope::PlainText(raw.trim().to_string()));
    }

    // A bare object wins outright. String values may contain fences of their
    // own, so fence stripping must not run first.
    let trimmed = raw.trim();
    if let Some(map) = parse_object(trimmed) {
        return Ok(Envelope::Structured(map));
    }

    if let Some(map) = parse_object(strip_code_fences(trimmed)) {
        return Ok(Envelope::Structured(map));
    }

    // Prose around the object: take the outermost braces of the original.
    if let Some(map) = outermost_object(trimmed) {
        return Ok(Envelope::Structured(map));
    }

    Err(Error::format("reply is not a JSON object", raw))
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn outermost_object(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start < end {
        parse_object(&text[start..=end])
    } else {
        None
    }
}
