//! Plan artifacts and the heuristic stand-in for an external query optimizer.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanType {
    #[serde(rename = "Index Scan")] IndexScan,
    #[serde(rename = "Full Table Scan")] FullTableScan,
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanType::IndexScan => f.write_str("Index Scan"),
            PlanType::FullTableScan => f.write_str("Full Table Scan"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanArtifact {
    pub plan_id: String,
    pub plan_type: PlanType,
    pub tables: Vec<String>,
}

/// Cached plan payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Flat(PlanArtifact),
    /// Outer plan keyed by the outer key, plus one entry per leaf key.
    Composite { outer_key: String, outer: PlanArtifact, inner: Vec<(String, Plan)> },
}

pub const INNER_PLANS_KEY: &str = "inner";

impl Plan {
    pub fn is_composite(&self) -> bool { matches!(self, Plan::Composite { .. }) }

    /// Flat plans render as the artifact; composites as `{outer_key: artifact, "inner": {leaf_key: plan}}`.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        match self {
            Plan::Flat(artifact) => serde_json::to_value(artifact),
            Plan::Composite { outer_key, outer, inner } => {
                let inner = inner.iter().map(|(key, plan)| Ok((key.clone(), plan.to_json()?))).collect::<serde_json::Result<Map<String, Value>>>()?;
                let mut out = Map::new();
                out.insert(outer_key.clone(), serde_json::to_value(outer)?);
                out.insert(INNER_PLANS_KEY.to_string(), Value::Object(inner));
                Ok(Value::Object(out))
            }
        }
    }
}

pub trait PlanGenerator {
    fn generate(&self, canonical: &str) -> PlanArtifact;
}

pub const UNKNOWN_TABLE: &str = "unknown_table";

static WHERE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bWHERE\b").expect("where pattern"));
static FROM_TABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)FROM\s+(\w+)").expect("from pattern"));
static JOIN_TABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)JOIN\s+(\w+)").expect("join pattern"));
static AGGREGATE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(sum|count|min|max|avg)\b").expect("aggregate pattern"));

/// Hash id, WHERE-sniffed scan type, FROM/JOIN-sniffed tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicPlanGenerator;

impl PlanGenerator for HeuristicPlanGenerator {
    fn generate(&self, canonical: &str) -> PlanArtifact {
        let digest = format!("{:x}", md5::compute(canonical.as_bytes()));
        let plan_type = if WHERE_WORD.is_match(canonical) { PlanType::IndexScan } else { PlanType::FullTableScan };
        let mut tables: Vec<String> = Vec::new();
        for caps in FROM_TABLE.captures_iter(canonical).chain(JOIN_TABLE.captures_iter(canonical)) {
            if let Some(m) = caps.get(1) && !tables.iter().any(|t| t == m.as_str()) {
                tables.push(m.as_str().to_string());
            }
        }
        if tables.is_empty() { tables.push(UNKNOWN_TABLE.to_string()); }
        PlanArtifact { plan_id: format!("PLN_{}", &digest[..8]), plan_type, tables }
    }
}

/// Keyword-weighted complexity score, never below 1.
pub fn estimate_query_complexity(query: &str) -> u64 {
    let query = query.to_lowercase();
    let weighted: [(&str, u64); 8] = [
        ("where", 3), ("and", 2), ("or", 2), ("join", 5),
        ("group by", 4), ("order by", 4), ("having", 3), ("select", 1),
    ];
    let mut score: u64 = weighted.iter().map(|(kw, w)| query.matches(kw).count() as u64 * w).sum();
    if AGGREGATE_WORD.is_match(&query) { score += 5; }
    score.max(1)
}
