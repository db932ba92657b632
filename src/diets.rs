//! # Diet Catalog Module
//!
//! The list of diet tags offered for filtering. The list is cached on disk
//! once the primary source has confirmed it is reachable; until then the
//! built-in list is used.

use std::future::Future;
use std::path::Path;
use tracing::{info, warn};

use crate::errors::RecipeError;
use crate::storage::{load_json, save_json};

/// Supported diet tags, in display order
pub const DEFAULT_DIETS: [&str; 6] = [
    "vegetarian",
    "vegan",
    "gluten free",
    "ketogenic",
    "paleo",
    "pescetarian",
];

/// File name of the cached catalog inside the data directory
pub const DIETS_CACHE_FILE: &str = "diets_cache.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DietCatalog {
    diets: Vec<String>,
}

impl Default for DietCatalog {
    fn default() -> Self {
        Self {
            diets: DEFAULT_DIETS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl DietCatalog {
    /// Load the catalog
    ///
    /// Order of preference: a cached list that parses, then the built-in list
    /// once `probe` succeeds (the list is cached in that case), then the
    /// built-in list without caching.
    pub async fn load<F, Fut>(cache_path: &Path, probe: F) -> Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), RecipeError>>,
    {
        let cached: Vec<String> = load_json(cache_path);
        if !cached.is_empty() {
            return Self { diets: cached };
        }

        let catalog = Self::default();
        match probe().await {
            Ok(()) => {
                if let Err(e) = save_json(cache_path, &catalog.diets) {
                    warn!("Could not cache diet list: {e:#}");
                } else {
                    info!("Cached diet list at {}", cache_path.display());
                }
            }
            Err(e) => warn!("Diet probe failed, using built-in list: {e}"),
        }
        catalog
    }

    pub fn diets(&self) -> &[String] {
        &self.diets
    }

    /// True when `tag` is a known diet (case-insensitive)
    pub fn contains(&self, tag: &str) -> bool {
        let tag = tag.trim();
        self.diets.iter().any(|d| d.eq_ignore_ascii_case(tag))
    }
}
