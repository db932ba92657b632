//! # TheMealDB Source Module
//!
//! Fallback recipe source. Its search endpoint returns complete meal records,
//! so hits from here never need a second request. Meals arrive as flat JSON
//! objects with numbered ingredient slots (`strIngredient1..20`) and are
//! validated before conversion; incomplete meals are dropped.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, trace, warn};

use super::{fetch_json, guarded, split_steps, DetailSource, SearchSource};
use crate::circuit_breaker::CircuitBreaker;
use crate::config::SourceConfig;
use crate::errors::RecipeError;
use crate::models::{RecipeDetail, RecipeId, RecipeSource, RecipeSummary, SearchHit};

/// Number of numbered ingredient slots in a meal
pub const INGREDIENT_SLOTS: usize = 20;

/// Preparation time assumed for every fallback recipe
pub const DEFAULT_READY_MINUTES: u32 = 30;

/// Extra `random.php` calls allowed per requested recipe when meals come back invalid
const RANDOM_ATTEMPTS_PER_RECIPE: usize = 3;

#[derive(Debug, Deserialize)]
struct MealsResponse {
    #[serde(default)]
    meals: Option<Vec<Value>>,
}

impl MealsResponse {
    fn into_meals(self) -> Vec<Value> {
        self.meals.unwrap_or_default()
    }
}

fn text_field<'a>(meal: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    meal.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Validate one native meal object and convert it into a detail record
///
/// A meal needs an id, a name, a thumbnail, instructions and at least one
/// non-blank ingredient slot; anything less is a `MalformedRecord`.
///
/// # Examples
///
/// ```rust
/// use recipe_finder::sources::mealdb::meal_to_detail;
/// use serde_json::json;
///
/// let meal = json!({
///     "idMeal": "52772",
///     "strMeal": "Teriyaki Chicken Casserole",
///     "strMealThumb": "https://www.themealdb.com/images/media/meals/wvpsxx1468256321.jpg",
///     "strInstructions": "Preheat oven. Combine sauce.",
///     "strIngredient1": "soy sauce",
///     "strIngredient2": ""
/// });
/// let detail = meal_to_detail(&meal).unwrap();
/// assert_eq!(detail.ready_in_minutes, 30);
/// assert_eq!(detail.instruction_steps.len(), 2);
/// ```
pub fn meal_to_detail(meal: &Value) -> Result<RecipeDetail, RecipeError> {
    let meal = meal
        .as_object()
        .ok_or_else(|| RecipeError::MalformedRecord("meal is not an object".to_string()))?;

    let missing = |field: &str| RecipeError::MalformedRecord(format!("meal without {field}"));
    let id = text_field(meal, "idMeal").ok_or_else(|| missing("idMeal"))?;
    let title = text_field(meal, "strMeal").ok_or_else(|| missing("strMeal"))?;
    let thumb = text_field(meal, "strMealThumb").ok_or_else(|| missing("strMealThumb"))?;
    let instructions =
        text_field(meal, "strInstructions").ok_or_else(|| missing("strInstructions"))?;

    let ingredients: Vec<&str> = (1..=INGREDIENT_SLOTS)
        .filter_map(|slot| text_field(meal, &format!("strIngredient{slot}")))
        .collect();
    if ingredients.is_empty() {
        return Err(missing("ingredients"));
    }

    let mut detail = RecipeDetail::new(id, title, RecipeSource::Fallback)
        .with_image(thumb)
        .with_summary(instructions)
        .with_ready_in_minutes(DEFAULT_READY_MINUTES)
        .with_servings(1)
        .with_source_url(text_field(meal, "strSource").unwrap_or(""));

    for ingredient in ingredients {
        detail = detail.with_ingredient(ingredient);
    }
    for (_, step) in split_steps(instructions) {
        detail = detail.with_step(&step);
    }
    Ok(detail)
}

/// Convert every valid meal, dropping the malformed ones
fn valid_details(meals: Vec<Value>) -> Vec<RecipeDetail> {
    meals
        .iter()
        .filter_map(|meal| match meal_to_detail(meal) {
            Ok(detail) => Some(detail),
            Err(e) => {
                trace!("Dropping fallback meal: {e}");
                None
            }
        })
        .collect()
}

/// HTTP client for TheMealDB
pub struct MealDbClient {
    http: reqwest::Client,
    config: SourceConfig,
    breaker: CircuitBreaker,
}

impl MealDbClient {
    pub fn new(config: SourceConfig) -> Result<Self, RecipeError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let breaker = CircuitBreaker::new("mealdb", config.breaker.clone());
        Ok(Self {
            http,
            config,
            breaker,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn meals(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<Value>, RecipeError> {
        let request = self.http.get(self.url(path)).query(query);
        let response: Option<MealsResponse> = guarded(&self.breaker, async {
            fetch_json(request, RecipeSource::Fallback).await
        })
        .await?;
        Ok(response.map(MealsResponse::into_meals).unwrap_or_default())
    }

    /// Free-text search with the ingredient names joined by commas
    pub async fn search_meals(
        &self,
        ingredients: &[String],
        count: usize,
    ) -> Result<Vec<RecipeDetail>, RecipeError> {
        let query = ingredients.join(",");
        let meals = self.meals("/search.php", &[("s", query.as_str())]).await?;
        let total = meals.len();

        let mut details = valid_details(meals);
        details.truncate(count);
        info!(
            "TheMealDB returned {} meals for '{}', {} usable",
            total,
            query,
            details.len()
        );
        Ok(details)
    }

    /// Look up one meal by id
    pub async fn lookup(&self, id: &RecipeId) -> Result<Option<RecipeDetail>, RecipeError> {
        let meals = self.meals("/lookup.php", &[("i", id.as_str())]).await?;
        let detail = valid_details(meals).into_iter().next();
        debug!("TheMealDB lookup for {id}: found={}", detail.is_some());
        Ok(detail)
    }

    /// Collect up to `count` valid random meals, one `random.php` call at a time
    pub async fn random_meals(&self, count: usize) -> Result<Vec<RecipeSummary>, RecipeError> {
        let mut picked: Vec<RecipeSummary> = Vec::with_capacity(count);
        let mut attempts = 0;

        while picked.len() < count && attempts < count * RANDOM_ATTEMPTS_PER_RECIPE {
            attempts += 1;
            let meals = match self.meals("/random.php", &[]).await {
                Ok(meals) => meals,
                Err(e) if picked.is_empty() => return Err(e),
                Err(e) => {
                    warn!("Stopping random fallback picks after error: {e}");
                    break;
                }
            };
            for detail in valid_details(meals) {
                if picked.len() < count && !picked.iter().any(|s| s.id == detail.id) {
                    picked.push(detail.to_summary());
                }
            }
        }
        Ok(picked)
    }
}

#[async_trait]
impl SearchSource for MealDbClient {
    fn kind(&self) -> RecipeSource {
        RecipeSource::Fallback
    }

    async fn search(
        &self,
        ingredients: &[String],
        count: usize,
    ) -> Result<Vec<SearchHit>, RecipeError> {
        let details = self.search_meals(ingredients, count).await?;
        Ok(details.into_iter().map(SearchHit::complete).collect())
    }

    async fn random(&self, count: usize) -> Result<Vec<RecipeSummary>, RecipeError> {
        self.random_meals(count).await
    }
}

#[async_trait]
impl DetailSource for MealDbClient {
    async fn fetch_detail(&self, id: &RecipeId) -> Result<Option<RecipeDetail>, RecipeError> {
        self.lookup(id).await
    }
}
