//! Stateless tree walks over `(node, tokens)`. Each walk runs against its own parse.

use super::parser::{ParseNode, RuleKind, Token};
use super::rewrite::mask_node;

fn is_double_quoted(text: &str) -> bool { text.len() >= 2 && text.starts_with('"') && text.ends_with('"') }

fn is_keyword_value(text: &str) -> bool { ["true", "false", "null"].iter().any(|kw| text.eq_ignore_ascii_case(kw)) }

/// Literal values, boolean/null keywords and quoted names in source order.
pub fn extract_literals(tree: &ParseNode, tokens: &[Token]) -> Vec<String> {
    fn visit(node: &ParseNode, tokens: &[Token], out: &mut Vec<String>) {
        match node.kind {
            RuleKind::LiteralValue => out.push(node.text(tokens)),
            RuleKind::Expr => {
                let text = node.text(tokens);
                if is_keyword_value(&text) { out.push(text.to_lowercase()); }
            }
            RuleKind::AnyName => {
                let text = node.text(tokens);
                if is_double_quoted(&text) { out.push(text); }
            }
            _ => {}
        }
        for child in &node.children { visit(child, tokens, out); }
    }
    let mut out = Vec::new();
    visit(tree, tokens, &mut out);
    out
}

/// Mask every literal value, `true`/`false`/`null` expression and quoted name,
/// so each extracted literal has exactly one placeholder.
pub fn mask_literals(node: &ParseNode, tokens: &mut [Token]) {
    let masked = match node.kind {
        RuleKind::LiteralValue => true,
        RuleKind::Expr => is_keyword_value(&node.text(tokens)),
        RuleKind::AnyName => is_double_quoted(&node.text(tokens)),
        _ => false,
    };
    if masked {
        mask_node(node, tokens);
        return;
    }
    for child in &node.children { mask_literals(child, tokens); }
}

/// Verbatim text of every SELECT core with no nested SELECT, in traversal order.
pub fn collect_leaf_selects(tree: &ParseNode, tokens: &[Token]) -> Vec<String> {
    fn visit(node: &ParseNode, tokens: &[Token], out: &mut Vec<String>) {
        if node.kind == RuleKind::SelectCore && !node.has_nested_select() {
            out.push(node.source_text(tokens));
            return;
        }
        for child in &node.children { visit(child, tokens, out); }
    }
    let mut out = Vec::new();
    visit(tree, tokens, &mut out);
    out
}

/// Mask non-leaf SELECT cores, keeping the outermost one and every leaf inline.
pub fn mask_non_leaf_selects(tree: &ParseNode, tokens: &mut [Token]) {
    fn visit(node: &ParseNode, tokens: &mut [Token], seen_outer: &mut bool) {
        if node.kind == RuleKind::SelectCore {
            if !*seen_outer {
                *seen_outer = true;
            } else if node.has_nested_select() {
                mask_node(node, tokens);
                return;
            }
        }
        for child in &node.children { visit(child, tokens, seen_outer); }
    }
    visit(tree, tokens, &mut false);
}

/// Same as [`mask_non_leaf_selects`], then mask every leaf SELECT core still
/// visible (the outermost included when it is itself a leaf). Yields the outer
/// key without re-finding leaves by text.
pub fn mask_selects_for_outer_key(tree: &ParseNode, tokens: &mut [Token]) {
    fn visit(node: &ParseNode, tokens: &mut [Token], seen_outer: &mut bool) {
        if node.kind == RuleKind::SelectCore {
            let is_outer = !*seen_outer;
            *seen_outer = true;
            if !is_outer || !node.has_nested_select() {
                mask_node(node, tokens);
                return;
            }
        }
        for child in &node.children { visit(child, tokens, seen_outer); }
    }
    visit(tree, tokens, &mut false);
}
