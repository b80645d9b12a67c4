//! Canonical text passes and the decomposition pipeline.
//!
//! Masking is destructive to the token stream it runs against, so every pass
//! works on its own fresh parse of the input.

use std::collections::HashSet;

use log::debug;

use super::errors::QueryAstError;
use super::parser::{parse, ParsedQuery};
use super::rewrite::rebuild_text;
use super::walkers;

/// Result of decomposing one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decomposition {
    /// Literal-free canonical text of the whole statement.
    pub full_normalized: String,
    /// Canonical text of each leaf SELECT, deduplicated, first occurrence first.
    pub leaves: Vec<String>,
    /// Canonical text with non-leaf subqueries elided and leaves kept inline.
    pub outer_template: String,
    /// Extracted literal texts in source order.
    pub literals: Vec<String>,
    /// Outer template with the visible leaves masked by position.
    pub outer_key: String,
}

impl Decomposition {
    /// `(full_normalized, leaves, outer_template, literals)`.
    pub fn into_tuple(self) -> (String, Vec<String>, String, Vec<String>) {
        (self.full_normalized, self.leaves, self.outer_template, self.literals)
    }
}

/// Mask every literal / boolean / quoted name and rebuild canonical text.
pub fn normalize_full_query(sql: &str) -> Result<String, QueryAstError> {
    let ParsedQuery { mut tokens, tree } = parse(sql)?;
    walkers::mask_literals(&tree, &mut tokens);
    Ok(rebuild_text(&tokens))
}

/// Canonical leaf SELECTs: each collected leaf is re-normalized on its own.
pub fn leaf_subqueries(sql: &str) -> Result<Vec<String>, QueryAstError> {
    let ParsedQuery { tokens, tree } = parse(sql)?;
    let mut seen = HashSet::new();
    let mut leaves = Vec::new();
    for raw in walkers::collect_leaf_selects(&tree, &tokens) {
        let canonical = normalize_full_query(&raw)?;
        if seen.insert(canonical.clone()) { leaves.push(canonical); }
    }
    Ok(leaves)
}

pub fn outer_template(sql: &str) -> Result<String, QueryAstError> {
    let ParsedQuery { mut tokens, tree } = parse(sql)?;
    walkers::mask_literals(&tree, &mut tokens);
    walkers::mask_non_leaf_selects(&tree, &mut tokens);
    Ok(rebuild_text(&tokens))
}

pub fn outer_key(sql: &str) -> Result<String, QueryAstError> {
    let ParsedQuery { mut tokens, tree } = parse(sql)?;
    walkers::mask_literals(&tree, &mut tokens);
    walkers::mask_selects_for_outer_key(&tree, &mut tokens);
    Ok(rebuild_text(&tokens))
}

pub fn extract_literals(sql: &str) -> Result<Vec<String>, QueryAstError> {
    let ParsedQuery { tokens, tree } = parse(sql)?;
    Ok(walkers::extract_literals(&tree, &tokens))
}

pub fn decompose(sql: &str) -> Result<Decomposition, QueryAstError> {
    let full_normalized = normalize_full_query(sql)?;
    let leaves = leaf_subqueries(sql)?;
    let outer_template = outer_template(sql)?;
    let literals = extract_literals(sql)?;
    let outer_key = outer_key(sql)?;
    debug!("decomposed: full={full_normalized:?} leaves={} template={outer_template:?} literals={}", leaves.len(), literals.len());
    Ok(Decomposition { full_normalized, leaves, outer_template, literals, outer_key })
}
