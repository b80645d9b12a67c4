//! SQL normalization and subquery decomposition for plan caching.
//!
//! Pipeline: `parser` (tokens + rule-kinded tree) -> `walkers` (literal extraction,
//! leaf collection, masking) -> `normalize` (canonical text, decomposition)
//! -> `plan_cache` (key selection, lookup, metrics).
//!
//! Known limitation: normalization is lossy by design, so two structurally
//! different statements may share a canonical key and therefore a cached plan.

pub mod errors;
pub mod normalize;
pub mod parser;
pub mod plan;
pub mod plan_cache;
pub mod rewrite;
pub mod walkers;

pub use errors::*;
pub use normalize::{decompose, normalize_full_query, Decomposition};
pub use plan::{estimate_query_complexity, HeuristicPlanGenerator, Plan, PlanArtifact, PlanGenerator, PlanType};
pub use plan_cache::{CacheMetrics, MemoryPlanStore, PlanLookup, PlanStore, QueryPlanManager};
pub use rewrite::{canonicalize_text, PLACEHOLDER};
