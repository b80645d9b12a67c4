use log::{LevelFilter, info};
use serde::{Deserialize, Serialize};

pub const ENV_USE_CACHE: &str = "PLANKEY_USE_CACHE";
pub const ENV_LEAF_SUBSTITUTION: &str = "PLANKEY_LEAF_SUBSTITUTION";
pub const ENV_LOG: &str = "PLANKEY_LOG";

/// How leaf subqueries are replaced in the outer template to form the outer key.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafSubstitution {
    /// Mask the leaf token spans in the outer parse.
    #[default]
    Positional,
    /// Replace every textual occurrence of each leaf's canonical text.
    /// Can over-substitute when a leaf's text also appears elsewhere.
    TextMatch,
}

impl LeafSubstitution {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "positional" | "position" => Some(Self::Positional),
            "text" | "text_match" => Some(Self::TextMatch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// When false every lookup is a miss (plans are still generated and stored).
    pub use_cache: bool,
    pub leaf_substitution: LeafSubstitution,
    /// `log` level filter for this crate, e.g. "info" or "debug".
    pub log_level: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { use_cache: true, leaf_substitution: LeafSubstitution::default(), log_level: "info".into() }
    }
}

impl CacheConfig {
    /// Defaults overridden by environment variables (a `.env` file is honored).
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let mut config = Self::default();
        if let Ok(v) = std::env::var(ENV_USE_CACHE) {
            config.use_cache = !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off");
        }
        if let Ok(v) = std::env::var(ENV_LEAF_SUBSTITUTION) {
            match LeafSubstitution::parse(&v) {
                Some(mode) => config.leaf_substitution = mode,
                None => log::warn!("ignoring unknown {ENV_LEAF_SUBSTITUTION} value {v:?}"),
            }
        }
        if let Ok(v) = std::env::var(ENV_LOG) { config.log_level = v; }
        info!("cache config: use_cache={} leaf_substitution={:?}", config.use_cache, config.leaf_substitution);
        config
    }

    pub fn log_level_filter(&self) -> LevelFilter { self.log_level.parse().unwrap_or(LevelFilter::Info) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = CacheConfig::default();
        assert!(c.use_cache);
        assert_eq!(c.leaf_substitution, LeafSubstitution::Positional);
        assert_eq!(c.log_level_filter(), LevelFilter::Info);
    }

    #[test]
    fn substitution_names() {
        assert_eq!(LeafSubstitution::parse("Text"), Some(LeafSubstitution::TextMatch));
        assert_eq!(LeafSubstitution::parse(" positional "), Some(LeafSubstitution::Positional));
        assert_eq!(LeafSubstitution::parse("regex"), None);
    }

    #[test]
    fn bad_log_level_falls_back() {
        let c = CacheConfig { log_level: "chatty".into(), ..CacheConfig::default() };
        assert_eq!(c.log_level_filter(), LevelFilter::Info);
    }

    #[test]
    fn config_roundtrips_through_json() {
        let c = CacheConfig { use_cache: false, leaf_substitution: LeafSubstitution::TextMatch, log_level: "debug".into() };
        let json = serde_json::to_string(&c).expect("serialize");
        assert!(json.contains("\"text_match\""));
        assert_eq!(serde_json::from_str::<CacheConfig>(&json).expect("deserialize"), c);
    }
}
