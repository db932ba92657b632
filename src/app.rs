//! # Application Wiring
//!
//! Builds the recipe sources from configuration and connects them to the
//! aggregator, detail fetcher, search pipeline and local storage.

use std::sync::Arc;
use tracing::info;

use crate::aggregator::Aggregator;
use crate::cache::TimedCache;
use crate::config::AppConfig;
use crate::detail::DetailFetcher;
use crate::diets::{DietCatalog, DIETS_CACHE_FILE};
use crate::errors::RecipeError;
use crate::models::{RecipeDetail, RecipeSummary};
use crate::normalizer::IngredientNormalizer;
use crate::search::SearchPipeline;
use crate::shopping_list::ShoppingList;
use crate::sources::{MealDbClient, SpoonacularClient};
use crate::storage::Storage;
use crate::tools::{RecommendedTool, ToolCatalog, TOOLS_FILE};

/// File name of the cached home recipes inside the data directory
pub const HOME_CACHE_FILE: &str = "home_recipes.json";

pub struct RecipeApp {
    config: AppConfig,
    primary: Arc<SpoonacularClient>,
    aggregator: Aggregator,
    details: DetailFetcher,
    pipeline: SearchPipeline,
    storage: Storage,
    normalizer: IngredientNormalizer,
    home_cache: TimedCache<Vec<RecipeSummary>>,
}

impl RecipeApp {
    pub fn new(config: AppConfig) -> Result<Self, RecipeError> {
        let primary = Arc::new(SpoonacularClient::new(config.primary.clone())?);
        let fallback = Arc::new(MealDbClient::new(config.fallback.clone())?);

        let aggregator = Aggregator::new(primary.clone(), fallback.clone());
        let details = DetailFetcher::new(primary.clone(), fallback);
        let pipeline = SearchPipeline::new(aggregator.clone(), details.clone(), config.search.clone());

        info!(
            "Recipe sources ready: {} (primary), {} (fallback)",
            config.primary.base_url, config.fallback.base_url
        );

        Ok(Self {
            storage: Storage::new(config.data_dir.clone()),
            home_cache: TimedCache::persisted(
                config.homepage_cache_ttl,
                config.data_dir.join(HOME_CACHE_FILE),
            ),
            normalizer: IngredientNormalizer::default(),
            config,
            primary,
            aggregator,
            details,
            pipeline,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn details(&self) -> &DetailFetcher {
        &self.details
    }

    pub fn pipeline(&self) -> &SearchPipeline {
        &self.pipeline
    }

    pub fn normalizer(&self) -> &IngredientNormalizer {
        &self.normalizer
    }

    /// Random recipes for the home view, cached on disk for the configured
    /// lifetime. An empty result is returned but not cached.
    pub async fn home_recipes(&self) -> Vec<RecipeSummary> {
        let count = self.config.homepage_recipes;
        self.home_cache
            .get_or_refresh_if(
                || self.aggregator.random_recipes(count),
                |recipes| !recipes.is_empty(),
            )
            .await
    }

    /// Supported diets, probing the primary source when nothing is cached
    pub async fn diet_catalog(&self) -> DietCatalog {
        let cache_path = self.config.data_dir.join(DIETS_CACHE_FILE);
        DietCatalog::load(&cache_path, || self.primary.probe()).await
    }

    /// Tools from the data directory's tool map that the recipe mentions
    pub fn recommended_tools(&self, detail: &RecipeDetail) -> Vec<RecommendedTool> {
        ToolCatalog::load(&self.config.data_dir.join(TOOLS_FILE)).recommend(detail)
    }

    /// Shopping list built from the stored meal plan
    pub fn shopping_list(&self) -> ShoppingList {
        ShoppingList::from_meal_plan(&self.storage.load_meal_plan(), &self.normalizer)
    }
}
