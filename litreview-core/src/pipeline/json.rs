//! Helpers for turning raw completion text into structured data.

use regex::Regex;
use std::sync::LazyLock;

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```json\n?").unwrap());
static PLAIN_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```\n?").unwrap());

/// Remove Markdown code-fence markers and surrounding whitespace.
///
/// Models often wrap JSON in a fenced `json` block even when told not to.
pub fn strip_code_fences(raw: &str) -> String {
    let without_json = JSON_FENCE.replace_all(raw, "");
    PLAIN_FENCE.replace_all(&without_json, "").trim().to_string()
}
