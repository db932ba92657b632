//! # Configuration Module
//!
//! This module defines configuration structures for the recipe sources,
//! the search pipeline and local storage. Values come from the environment
//! (optionally through a `.env` file) and fall back to the defaults below.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

// Constants for source configuration
pub const DEFAULT_SPOONACULAR_BASE_URL: &str = "https://api.spoonacular.com";
pub const DEFAULT_MEALDB_BASE_URL: &str = "https://www.themealdb.com/api/json/v1/1";
pub const DEFAULT_PRIMARY_TIMEOUT_SECS: u64 = 8;
pub const DEFAULT_FALLBACK_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_BLOCKLIST_TERM: &str = "foodista";

// Constants for the search pipeline
pub const DEFAULT_SEARCH_CANDIDATES: usize = 15;
pub const DEFAULT_SEARCH_MAX_RESULTS: usize = 5;
pub const DEFAULT_HOMEPAGE_RECIPES: usize = 8;
pub const DEFAULT_HOMEPAGE_CACHE_SECS: u64 = 6 * 60 * 60;

/// Circuit breaker settings shared by both recipe sources
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures before the breaker opens
    pub failure_threshold: u32,
    /// Seconds the breaker stays open before letting a request through
    pub reset_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_secs: 60, // 1 minute
        }
    }
}

/// Settings for one HTTP recipe source
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// API key, if the source needs one
    pub api_key: Option<String>,
    /// Breaker settings for this source
    pub breaker: BreakerConfig,
}

impl SourceConfig {
    /// Primary source defaults
    pub fn spoonacular() -> Self {
        Self {
            base_url: DEFAULT_SPOONACULAR_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_PRIMARY_TIMEOUT_SECS),
            api_key: None,
            breaker: BreakerConfig::default(),
        }
    }

    /// Fallback source defaults
    pub fn mealdb() -> Self {
        Self {
            base_url: DEFAULT_MEALDB_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_FALLBACK_TIMEOUT_SECS),
            api_key: None,
            breaker: BreakerConfig::default(),
        }
    }

    /// Point the source at another base URL (trailing slashes are dropped)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Search pipeline settings
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Candidates requested from the aggregator per search
    pub candidates: usize,
    /// Matches kept before the pipeline stops fetching details
    pub max_results: usize,
    /// Shuffle candidates before filtering
    pub shuffle: bool,
    /// Provenance terms that disqualify a primary recipe
    pub blocklist: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_SEARCH_CANDIDATES,
            max_results: DEFAULT_SEARCH_MAX_RESULTS,
            shuffle: true,
            blocklist: vec![DEFAULT_BLOCKLIST_TERM.to_string()],
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub primary: SourceConfig,
    pub fallback: SourceConfig,
    pub search: SearchConfig,
    /// Directory holding settings, meal plan, favorites and history
    pub data_dir: PathBuf,
    /// Directory holding `{lang}/main.ftl` files
    pub locales_dir: PathBuf,
    /// Number of recipes shown on the home view
    pub homepage_recipes: usize,
    /// Lifetime of the home view cache
    pub homepage_cache_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            primary: SourceConfig::spoonacular(),
            fallback: SourceConfig::mealdb(),
            search: SearchConfig::default(),
            data_dir: PathBuf::from("data"),
            locales_dir: PathBuf::from("locales"),
            homepage_recipes: DEFAULT_HOMEPAGE_RECIPES,
            homepage_cache_ttl: Duration::from_secs(DEFAULT_HOMEPAGE_CACHE_SECS),
        }
    }
}

impl AppConfig {
    /// Build the configuration from environment variables
    ///
    /// Call `dotenv::dotenv()` first to pick up a `.env` file. Missing variables
    /// keep their defaults; unparsable numbers are reported and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = env::var("SPOONACULAR_API_KEY") {
            config.primary.api_key = Some(key);
        } else {
            warn!("SPOONACULAR_API_KEY is not set, primary recipe source will be unavailable");
        }
        if let Ok(url) = env::var("SPOONACULAR_BASE_URL") {
            config.primary = config.primary.with_base_url(&url);
        }
        if let Ok(url) = env::var("MEALDB_BASE_URL") {
            config.fallback = config.fallback.with_base_url(&url);
        }

        config.primary.timeout = Duration::from_secs(parse_var(
            "PRIMARY_TIMEOUT_SECS",
            DEFAULT_PRIMARY_TIMEOUT_SECS,
        ));
        config.fallback.timeout = Duration::from_secs(parse_var(
            "FALLBACK_TIMEOUT_SECS",
            DEFAULT_FALLBACK_TIMEOUT_SECS,
        ));
        config.search.candidates = parse_var("SEARCH_CANDIDATES", DEFAULT_SEARCH_CANDIDATES);
        config.search.max_results = parse_var("SEARCH_MAX_RESULTS", DEFAULT_SEARCH_MAX_RESULTS);
        config.homepage_cache_ttl = Duration::from_secs(parse_var(
            "HOMEPAGE_CACHE_SECS",
            DEFAULT_HOMEPAGE_CACHE_SECS,
        ));

        if let Ok(list) = env::var("SOURCE_BLOCKLIST") {
            config.search.blocklist = parse_list(&list);
        }
        if let Ok(dir) = env::var("RECIPE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var("LOCALES_DIR") {
            config.locales_dir = PathBuf::from(dir);
        }

        debug!(
            data_dir = ?config.data_dir,
            locales_dir = ?config.locales_dir,
            "configuration loaded"
        );
        config
    }
}

fn parse_var<T: FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {key} value '{raw}', using default: {default}");
            default
        }),
        Err(_) => default,
    }
}

/// Split a comma separated list into lowercase, non-empty terms
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect()
}
