//! Turns raw model text into typed artifacts.
//!
//! Pipeline: strip code fences, strict JSON parse (a list may arrive wrapped
//! in a one-key object), then [`Validate`]. Any failure yields the caller's
//! fallback, so nothing here ever returns an error to a view.

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::artifacts::Validate;
use crate::errors::MalformedResponse;

fn opening_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^```[A-Za-z0-9_+-]*").expect("opening fence pattern is valid"))
}

/// Removes a leading ```` ```lang ```` marker and a trailing ```` ``` ````,
/// whichever are present. Truncated output often has only the opener.
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(m) = opening_fence().find(text) {
        text = &text[m.end()..];
    }
    let trimmed = text.trim_end();
    if let Some(rest) = trimmed.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

pub fn try_normalize<T>(raw: &str) -> Result<T, MalformedResponse>
where
    T: DeserializeOwned + Validate,
{
    let body = strip_fences(raw);
    if body.is_empty() {
        return Err(MalformedResponse::Empty);
    }
    let json: Value = serde_json::from_str(body).map_err(|e| MalformedResponse::Parse(e.to_string()))?;
    let value = match T::deserialize(&json) {
        Ok(v) => v,
        Err(e) => match sole_array(&json) {
            Some(inner) => T::deserialize(inner).map_err(|_| MalformedResponse::Parse(e.to_string()))?,
            None => return Err(MalformedResponse::Parse(e.to_string())),
        },
    };
    value.validate().map_err(MalformedResponse::Invalid)?;
    Ok(value)
}

/// `{"keywords": [...]}` for a list artifact. JSON-object modes cannot emit a
/// bare array, so a single-key object wrapping one is accepted as the array.
fn sole_array(json: &Value) -> Option<&Value> {
    let map = json.as_object()?;
    if map.len() != 1 {
        return None;
    }
    map.values().next().filter(|v| v.is_array())
}

pub fn normalize<T>(raw: &str, fallback: T) -> T
where
    T: DeserializeOwned + Validate,
{
    match try_normalize(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(
                artifact = std::any::type_name::<T>(),
                error = %e,
                preview = %preview(raw),
                "malformed model response, using fallback"
            );
            fallback
        }
    }
}

/// Free-text artifacts (blog posts, fixes). Only a fence that wraps the whole
/// answer is removed; fences inside markdown are content.
pub fn normalize_text(raw: &str, fallback: &str) -> String {
    let text = raw.trim();
    let unwrapped = if text.len() >= 6 && text.starts_with("```") && text.ends_with("```") {
        strip_fences(text)
    } else {
        text
    };
    if unwrapped.is_empty() {
        warn!("empty text response, using fallback");
        return fallback.to_string();
    }
    unwrapped.to_string()
}

fn preview(raw: &str) -> String {
    raw.chars().take(120).collect()
}
