use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::ScanError;

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```json\s*([\s\S]*?)\s*```").expect("valid fenced-json regex"));

// Greedy: first '{' through the last '}'.
static BARE_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid object regex"));

/// Locate the JSON candidate inside a model reply.
///
/// A ```` ```json ```` fenced block wins; otherwise the widest brace-delimited
/// span is used.
pub fn find_json_block(reply: &str) -> Result<&str, ScanError> {
    if let Some(inner) = FENCED_JSON.captures(reply).and_then(|caps| caps.get(1)) {
        return Ok(inner.as_str());
    }

    if let Some(object) = BARE_OBJECT.find(reply) {
        return Ok(object.as_str());
    }

    Err(ScanError::Extraction {
        raw: reply.to_string(),
    })
}

/// Extract and parse the JSON value embedded in a model reply.
pub fn extract_json(reply: &str) -> Result<Value, ScanError> {
    let candidate = find_json_block(reply)?;
    serde_json::from_str(candidate).map_err(|source| ScanError::Parse {
        raw: reply.to_string(),
        source,
    })
}
