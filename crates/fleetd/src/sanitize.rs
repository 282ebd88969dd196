// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-cutting redaction applied to every key-value map before it is
//! stored in the registry or published to a subscriber.

use serde_json::{Map, Value};

const SENSITIVE_KEY_FRAGMENTS: &[&str] = &[
    "password",
    "token",
    "secret",
    "apikey",
    "api_key",
    "credential",
    "private_key",
    "auth",
];

const REDACTED: &str = "[REDACTED]";
const DEPTH_LIMIT: &str = "[DEPTH-LIMIT]";
const TRUNCATED_SUFFIX: &str = "\u{2026} [TRUNCATED]";

/// Sanitization limits threaded through from [`crate::config::Config`].
#[derive(Debug, Clone, Copy)]
pub struct SanitizeLimits {
    pub max_string_len: usize,
    pub max_depth: usize,
}

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEY_FRAGMENTS
        .iter()
        .any(|fragment| lower.contains(fragment))
}

fn truncate_string(s: &str, limits: SanitizeLimits) -> String {
    if s.ends_with(TRUNCATED_SUFFIX) || s.chars().count() <= limits.max_string_len {
        return s.to_string();
    }
    let head: String = s.chars().take(limits.max_string_len).collect();
    format!("{head}{TRUNCATED_SUFFIX}")
}

fn sanitize_value(value: &Value, limits: SanitizeLimits, depth: usize) -> Value {
    if depth > limits.max_depth {
        return Value::String(DEPTH_LIMIT.to_string());
    }
    match value {
        Value::String(s) => Value::String(truncate_string(s, limits)),
        Value::Object(map) => Value::Object(sanitize_map_at_depth(map, limits, depth)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| sanitize_value(item, limits, depth + 1))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn sanitize_map_at_depth(map: &Map<String, Value>, limits: SanitizeLimits, depth: usize) -> Map<String, Value> {
    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        let sanitized = if is_sensitive_key(key) {
            Value::String(REDACTED.to_string())
        } else {
            sanitize_value(value, limits, depth + 1)
        };
        out.insert(key.clone(), sanitized);
    }
    out
}

/// Sanitize a key-value map: redact sensitive keys, truncate long strings,
/// and replace subtrees beyond `max_depth` with a depth-limit sentinel.
///
/// Idempotent: `sanitize(sanitize(x)) == sanitize(x)`, since redacted and
/// truncated values are themselves short plain strings that re-sanitize to
/// themselves, and depth is measured from the call site each time.
pub fn sanitize_map(map: &Map<String, Value>, limits: SanitizeLimits) -> Map<String, Value> {
    sanitize_map_at_depth(map, limits, 0)
}

#[cfg(test)]
#[path = "sanitize_tests.rs"]
mod tests;
