//! Canonical plan-cache keys for SQL statements.
//!
//! Literals are stripped into a side channel, leaf subqueries (no nested SELECT)
//! are split out as their own keys, and the remaining outer template keys a
//! composite plan. See [`query_ast::QueryPlanManager`].

pub mod config;
pub mod query_ast;

pub use config::{CacheConfig, LeafSubstitution};
pub use query_ast::{decompose, Decomposition, Plan, PlanLookup, QueryAstError, QueryPlanManager};

/// Install `env_logger` with this crate's level taken from the config.
/// `RUST_LOG` still applies to other modules. Safe to call more than once.
pub fn init_logging(config: &CacheConfig) {
    let _ = env_logger::Builder::from_default_env()
        .filter_module("plankey", config.log_level_filter())
        .is_test(false)
        .try_init();
}
