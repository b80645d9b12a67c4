//! Plan cache orchestration over decomposed statements.
//!
//! Single-threaded by construction: the manager owns its store and counters and
//! every operation takes `&mut self`. The store is unbounded; nothing is evicted.

use std::collections::HashMap;

use log::{debug, info};
use serde::Serialize;

use super::errors::QueryAstError;
use super::normalize::{decompose, Decomposition};
use super::plan::{estimate_query_complexity, HeuristicPlanGenerator, Plan, PlanArtifact, PlanGenerator};
use super::rewrite::PLACEHOLDER;
use crate::config::{CacheConfig, LeafSubstitution};

/// Key -> plan mapping. Entries are written once and never replaced.
pub trait PlanStore {
    fn get(&self, key: &str) -> Option<&Plan>;
    /// Returns false when the key was already present (the stored plan is kept).
    fn insert_if_absent(&mut self, key: String, plan: Plan) -> bool;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool { self.len() == 0 }
    fn contains(&self, key: &str) -> bool { self.get(key).is_some() }
}

#[derive(Debug, Default)]
pub struct MemoryPlanStore { inner: HashMap<String, Plan> }

impl PlanStore for MemoryPlanStore {
    fn get(&self, key: &str) -> Option<&Plan> { self.inner.get(key) }
    fn insert_if_absent(&mut self, key: String, plan: Plan) -> bool {
        if self.inner.contains_key(&key) { return false; }
        self.inner.insert(key, plan);
        true
    }
    fn len(&self) -> usize { self.inner.len() }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    pub requests: u64,
    pub hits: u64,
    pub misses: u64,
}

impl CacheMetrics {
    pub fn hit_ratio(&self) -> f64 { if self.requests == 0 { 0.0 } else { self.hits as f64 / self.requests as f64 } }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanLookup {
    pub plan: Plan,
    pub literals: Vec<String>,
    /// Hits contributed by this call only.
    pub cache_hits_of_current_query: u64,
}

pub struct QueryPlanManager<S: PlanStore = MemoryPlanStore, G: PlanGenerator = HeuristicPlanGenerator> {
    config: CacheConfig,
    store: S,
    generator: G,
    metrics: CacheMetrics,
    total_complexity_score: u64,
}

impl QueryPlanManager {
    pub fn new() -> Self { Self::with_config(CacheConfig::default()) }

    pub fn with_config(config: CacheConfig) -> Self { Self::with_parts(config, MemoryPlanStore::default(), HeuristicPlanGenerator) }
}

impl Default for QueryPlanManager {
    fn default() -> Self { Self::new() }
}

impl<S: PlanStore, G: PlanGenerator> QueryPlanManager<S, G> {
    pub fn with_parts(config: CacheConfig, store: S, generator: G) -> Self {
        Self { config, store, generator, metrics: CacheMetrics::default(), total_complexity_score: 0 }
    }

    pub fn config(&self) -> &CacheConfig { &self.config }
    pub fn metrics(&self) -> &CacheMetrics { &self.metrics }
    pub fn total_complexity_score(&self) -> u64 { self.total_complexity_score }
    pub fn store(&self) -> &S { &self.store }
    pub fn cache_len(&self) -> usize { self.store.len() }

    /// Decompose `sql`, then resolve its plan from the cache or the generator.
    pub fn fetch_or_generate_query_plan(&mut self, sql: &str) -> Result<PlanLookup, QueryAstError> {
        let Decomposition { full_normalized, leaves, outer_template, literals, outer_key } = decompose(sql)?;
        let mut hits = 0u64;

        // trivial: the statement is a single leaf SELECT
        if leaves.len() == 1 && leaves[0] == full_normalized {
            debug!("trivial statement, key={full_normalized:?}");
            let plan = self.get_or_generate(&full_normalized, &mut hits);
            return Ok(PlanLookup { plan, literals, cache_hits_of_current_query: hits });
        }

        if leaves.is_empty() {
            debug!("no leaf SELECT found, falling back to full key");
            let plan = self.get_or_generate(&full_normalized, &mut hits);
            return Ok(PlanLookup { plan, literals, cache_hits_of_current_query: hits });
        }

        let mut substituted = outer_template;
        let mut inner = Vec::with_capacity(leaves.len());
        for leaf in leaves {
            if self.config.leaf_substitution == LeafSubstitution::TextMatch {
                substituted = substituted.replace(leaf.as_str(), PLACEHOLDER);
            }
            let plan = self.get_or_generate(&leaf, &mut hits);
            inner.push((leaf, plan));
        }
        let outer_key = match self.config.leaf_substitution {
            LeafSubstitution::Positional => outer_key,
            LeafSubstitution::TextMatch => substituted.trim().to_string(),
        };
        debug!("nested statement, {} leaves, outer key={outer_key:?}", inner.len());

        if let Some(plan) = self.lookup(&outer_key, &mut hits) {
            return Ok(PlanLookup { plan, literals, cache_hits_of_current_query: hits });
        }
        let outer = self.generate(&outer_key);
        let plan = Plan::Composite { outer_key: outer_key.clone(), outer, inner };
        self.store.insert_if_absent(outer_key, plan.clone());
        Ok(PlanLookup { plan, literals, cache_hits_of_current_query: hits })
    }

    fn get_or_generate(&mut self, key: &str, hits: &mut u64) -> Plan {
        if let Some(plan) = self.lookup(key, hits) { return plan; }
        let plan = Plan::Flat(self.generate(key));
        self.store.insert_if_absent(key.to_string(), plan.clone());
        plan
    }

    /// One counted cache request.
    fn lookup(&mut self, key: &str, hits: &mut u64) -> Option<Plan> {
        self.metrics.requests += 1;
        let cached = if self.config.use_cache { self.store.get(key).cloned() } else { None };
        if cached.is_some() {
            self.metrics.hits += 1;
            *hits += 1;
            debug!("cache hit: {key:?}");
        } else {
            self.metrics.misses += 1;
            debug!("cache miss: {key:?}");
        }
        cached
    }

    fn generate(&mut self, key: &str) -> PlanArtifact {
        let complexity = estimate_query_complexity(key);
        self.total_complexity_score += complexity;
        let artifact = self.generator.generate(key);
        info!("generated plan {} ({}) complexity={complexity}", artifact.plan_id, artifact.plan_type);
        artifact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingGenerator { calls: Cell<u32> }

    impl PlanGenerator for CountingGenerator {
        fn generate(&self, canonical: &str) -> PlanArtifact {
            self.calls.set(self.calls.get() + 1);
            HeuristicPlanGenerator.generate(canonical)
        }
    }

    #[test]
    fn store_is_put_if_absent() {
        let mut store = MemoryPlanStore::default();
        let a = Plan::Flat(HeuristicPlanGenerator.generate("SELECT a FROM t"));
        let b = Plan::Flat(HeuristicPlanGenerator.generate("SELECT b FROM u"));
        assert!(store.insert_if_absent("k".into(), a.clone()));
        assert!(!store.insert_if_absent("k".into(), b));
        assert_eq!(store.get("k"), Some(&a));
        assert_eq!(store.len(), 1);
        assert!(store.contains("k"));
    }

    #[test]
    fn generator_runs_only_on_miss() {
        let generator = CountingGenerator { calls: Cell::new(0) };
        let mut manager = QueryPlanManager::with_parts(CacheConfig::default(), MemoryPlanStore::default(), generator);
        manager.fetch_or_generate_query_plan("SELECT * FROM t WHERE id = 1").expect("plan");
        manager.fetch_or_generate_query_plan("SELECT * FROM t WHERE id = 2").expect("plan");
        assert_eq!(manager.generator.calls.get(), 1);
        assert_eq!(manager.total_complexity_score(), estimate_query_complexity("SELECT * FROM t WHERE id = ?"));
    }

    #[test]
    fn cache_off_always_misses() {
        let config = CacheConfig { use_cache: false, ..CacheConfig::default() };
        let mut manager = QueryPlanManager::with_config(config);
        assert!(!manager.config().use_cache);
        for sql in ["SELECT * FROM t WHERE id = 1", "SELECT * FROM t WHERE id = 2"] {
            let lookup = manager.fetch_or_generate_query_plan(sql).expect("plan");
            assert_eq!(lookup.cache_hits_of_current_query, 0);
        }
        assert_eq!(*manager.metrics(), CacheMetrics { requests: 2, hits: 0, misses: 2 });
        assert_eq!(manager.cache_len(), 1);
        assert!(manager.store().contains("SELECT * FROM t WHERE id = ?"));
    }

    #[test]
    fn hit_ratio_handles_empty() {
        assert_eq!(CacheMetrics::default().hit_ratio(), 0.0);
        assert_eq!(CacheMetrics { requests: 4, hits: 1, misses: 3 }.hit_ratio(), 0.25);
    }
}
