use plankey::{CacheConfig, QueryPlanManager};
use serde_json::json;

const DEMO_QUERIES: &[&str] = &[
    "SELECT * FROM customers WHERE id = 101",
    "SELECT * FROM customers WHERE id = 202;",
];

/// Resolve plans for the SQL statements given as arguments (or a built-in pair
/// that exercises the cache) and print each result as JSON.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CacheConfig::from_env();
    plankey::init_logging(&config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let queries: Vec<&str> = if args.is_empty() { DEMO_QUERIES.to_vec() } else { args.iter().map(String::as_str).collect() };

    let mut manager = QueryPlanManager::with_config(config);
    for sql in queries {
        let lookup = manager.fetch_or_generate_query_plan(sql)?;
        let report = json!({
            "query": sql.trim(),
            "plan": lookup.plan.to_json()?,
            "literals": lookup.literals,
            "cache_hits_of_current_query": lookup.cache_hits_of_current_query,
            "metrics": manager.metrics(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    log::info!("total complexity score: {}", manager.total_complexity_score());
    Ok(())
}
