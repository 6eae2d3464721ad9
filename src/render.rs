//! Text cleanup applied before messages are shown to a user.

use regex::Regex;
use std::sync::OnceLock;

fn think_block() -> &'static Regex {
    static THINK: OnceLock<Regex> = OnceLock::new();
    THINK.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"))
}

/// Remove `<think>...</think>` spans and trim the result.
///
/// Matching is non-greedy and spans line breaks. Each opening marker pairs
/// with the first closing marker after it, so for nested markers the outer
/// closing marker and any text before it survive, and an opening marker with
/// no closing marker is left as is.
pub fn strip_reasoning(text: &str) -> String {
    think_block().replace_all(text, "").trim().to_string()
}
