//! In-place token rewriting and canonical text rebuild.

use once_cell::sync::Lazy;
use regex::Regex;

use super::parser::{ParseNode, Token};

pub const PLACEHOLDER: &str = "?";

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));
// two or more comma-separated placeholders
static IN_PLACEHOLDER_LIST: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bIN\s*\(\s*\?\s*(?:,\s*\?\s*)+\)").expect("in-list pattern"));
// run of standalone `?` placeholders; `??` and numbered `?1` never match
static PAREN_PLACEHOLDER_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\s*\?(?:\s+\?)*\s*\)").expect("paren-run pattern"));

/// Overwrite the node's token span with a single placeholder token.
pub fn mask_node(node: &ParseNode, tokens: &mut [Token]) {
    if let Some(span) = tokens.get_mut(node.start..=node.stop) {
        for token in span.iter_mut() { token.text.clear(); }
        if let Some(first) = span.first_mut() { first.text = PLACEHOLDER.to_string(); }
    }
}

/// Join the rendering tokens with single spaces and canonicalize the result.
pub fn rebuild_text(tokens: &[Token]) -> String {
    let joined = tokens.iter().filter(|t| t.renders()).map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ");
    canonicalize_text(&joined)
}

/// Whitespace collapse plus placeholder-list rewrites. Idempotent.
pub fn canonicalize_text(text: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(text.trim(), " ");
    let lists = IN_PLACEHOLDER_LIST.replace_all(&collapsed, "IN ( ?? )");
    PAREN_PLACEHOLDER_RUN.replace_all(&lists, "( ? )").into_owned()
}
