//! # Spoonacular Source Module
//!
//! Primary recipe source. Its ingredient search only returns listing rows, so
//! every hit needs a detail lookup before it can be filtered. The detail
//! payload also carries the provenance used by the contributor blocklist.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::{fetch_json, guarded, split_steps, DetailSource, SearchSource};
use crate::circuit_breaker::CircuitBreaker;
use crate::config::SourceConfig;
use crate::diets::DEFAULT_DIETS;
use crate::errors::RecipeError;
use crate::models::{
    strip_html, IngredientLine, InstructionStep, Nutrient, RecipeDetail, RecipeId, RecipeSource,
    RecipeSummary, SearchHit,
};

/// Listing row of `/recipes/findByIngredients`
#[derive(Debug, Deserialize)]
struct IngredientSearchRow {
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RandomResponse {
    #[serde(default)]
    recipes: Vec<SpoonacularRecipe>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NativeIngredient {
    original: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NativeStep {
    number: u32,
    step: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NativeInstructionBlock {
    steps: Vec<NativeStep>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NativeNutrient {
    name: String,
    amount: f64,
    unit: String,
    percent_of_daily_needs: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NativeNutrition {
    nutrients: Vec<NativeNutrient>,
}

/// Native payload of `/recipes/{id}/information` and `/recipes/random`
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpoonacularRecipe {
    id: u64,
    title: String,
    image: Option<String>,
    summary: Option<String>,
    instructions: Option<String>,
    extended_ingredients: Vec<NativeIngredient>,
    analyzed_instructions: Vec<NativeInstructionBlock>,
    ready_in_minutes: Option<u32>,
    servings: Option<u32>,
    source_url: Option<String>,
    source_name: Option<String>,
    vegetarian: bool,
    vegan: bool,
    gluten_free: bool,
    ketogenic: bool,
    diets: Vec<String>,
    dish_types: Vec<String>,
    nutrition: Option<NativeNutrition>,
}

impl SpoonacularRecipe {
    /// Diet flags derived from the boolean flags and the `diets` list
    ///
    /// Only the supported diet tags are kept; other labels such as
    /// "dairy free" are dropped.
    fn diet_flags(&self) -> BTreeSet<String> {
        let mut flags = BTreeSet::new();
        let booleans = [
            (self.vegetarian, "vegetarian"),
            (self.vegan, "vegan"),
            (self.gluten_free, "gluten free"),
            (self.ketogenic, "ketogenic"),
        ];
        for (set, flag) in booleans {
            if set {
                flags.insert(flag.to_string());
            }
        }
        for diet in &self.diets {
            let diet = diet.trim().to_lowercase();
            let flag = match diet.as_str() {
                "" => continue,
                "paleolithic" => "paleo".to_string(),
                "pescatarian" => "pescetarian".to_string(),
                _ => diet,
            };
            if DEFAULT_DIETS.contains(&flag.as_str()) {
                flags.insert(flag);
            }
        }
        flags
    }

    fn to_summary(&self) -> RecipeSummary {
        RecipeSummary {
            id: RecipeId::from(self.id),
            title: self.title.clone(),
            image: self.image.clone(),
            source: RecipeSource::Primary,
        }
    }
}

impl From<SpoonacularRecipe> for RecipeDetail {
    fn from(native: SpoonacularRecipe) -> Self {
        let diet_flags = native.diet_flags();

        let mut instruction_steps: Vec<InstructionStep> = native
            .analyzed_instructions
            .into_iter()
            .next()
            .map(|block| {
                block
                    .steps
                    .into_iter()
                    .filter(|step| !step.step.trim().is_empty())
                    .map(|step| InstructionStep {
                        number: step.number,
                        text: step.step.trim().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        // Some recipes only have free-text instructions
        if instruction_steps.is_empty() {
            if let Some(text) = native.instructions.as_deref() {
                instruction_steps = split_steps(&strip_html(text))
                    .into_iter()
                    .map(|(number, text)| InstructionStep { number, text })
                    .collect();
            }
        }

        RecipeDetail {
            id: RecipeId::from(native.id),
            title: native.title,
            image: native.image.filter(|url| !url.trim().is_empty()),
            summary: native.summary.unwrap_or_default(),
            ingredients: native
                .extended_ingredients
                .into_iter()
                .filter_map(|ingredient| ingredient.original)
                .map(|original| IngredientLine { original })
                .collect(),
            instruction_steps,
            ready_in_minutes: native.ready_in_minutes.unwrap_or(0),
            servings: native.servings.unwrap_or(1),
            source_url: native.source_url.unwrap_or_default(),
            source_name: native.source_name.filter(|name| !name.trim().is_empty()),
            diet_flags,
            dish_types: native
                .dish_types
                .iter()
                .map(|dish| dish.trim().to_lowercase())
                .collect(),
            nutrients: native
                .nutrition
                .map(|nutrition| {
                    nutrition
                        .nutrients
                        .into_iter()
                        .map(|n| Nutrient {
                            name: n.name,
                            amount: n.amount,
                            unit: n.unit,
                            percent_daily: n.percent_of_daily_needs,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            source: RecipeSource::Primary,
        }
    }
}

/// True when the recipe's contributor name or URL contains a blocklisted term
///
/// # Examples
///
/// ```rust
/// use recipe_finder::models::{RecipeDetail, RecipeSource};
/// use recipe_finder::sources::spoonacular::is_blocklisted;
///
/// let detail = RecipeDetail::new("1", "Soup", RecipeSource::Primary)
///     .with_source_url("http://www.Foodista.com/recipe/soup");
/// assert!(is_blocklisted(&detail, &["foodista".to_string()]));
/// ```
pub fn is_blocklisted(detail: &RecipeDetail, blocklist: &[String]) -> bool {
    let name = detail.source_name.as_deref().unwrap_or("").to_lowercase();
    let url = detail.source_url.to_lowercase();
    blocklist.iter().any(|term| {
        let term = term.to_lowercase();
        !term.is_empty() && (name.contains(&term) || url.contains(&term))
    })
}

/// HTTP client for the Spoonacular API
pub struct SpoonacularClient {
    http: reqwest::Client,
    config: SourceConfig,
    breaker: CircuitBreaker,
}

impl SpoonacularClient {
    /// Create a client with the configured timeout
    pub fn new(config: SourceConfig) -> Result<Self, RecipeError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let breaker = CircuitBreaker::new("spoonacular", config.breaker.clone());
        Ok(Self {
            http,
            config,
            breaker,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn api_key(&self) -> Result<&str, RecipeError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| RecipeError::SourceUnavailable("missing Spoonacular API key".into()))
    }

    /// Listing rows for an ingredient search, best match first
    pub async fn find_by_ingredients(
        &self,
        ingredients: &[String],
        count: usize,
    ) -> Result<Vec<RecipeSummary>, RecipeError> {
        let api_key = self.api_key()?;
        let joined = ingredients.join(",");
        let number = count.to_string();
        let request = self.http.get(self.url("/recipes/findByIngredients")).query(&[
            ("ingredients", joined.as_str()),
            ("number", number.as_str()),
            ("ranking", "1"),
            ("ignorePantry", "true"),
            ("apiKey", api_key),
        ]);

        let rows: Vec<IngredientSearchRow> = guarded(&self.breaker, async {
            fetch_json(request, RecipeSource::Primary).await
        })
        .await?
        .unwrap_or_default();

        info!("Spoonacular returned {} rows for '{}'", rows.len(), joined);
        Ok(rows
            .into_iter()
            .take(count)
            .map(|row| RecipeSummary {
                id: RecipeId::from(row.id),
                title: row.title,
                image: row.image,
                source: RecipeSource::Primary,
            })
            .collect())
    }

    /// Full recipe information including nutrition
    pub async fn information(&self, id: &RecipeId) -> Result<Option<RecipeDetail>, RecipeError> {
        let api_key = self.api_key()?;
        let numeric = id.as_numeric().ok_or_else(|| {
            RecipeError::RecordUnresolvable(format!("'{id}' is not a Spoonacular id"))
        })?;
        let request = self
            .http
            .get(self.url(&format!("/recipes/{numeric}/information")))
            .query(&[
                ("includeNutrition", "true"),
                ("includeIngredients", "true"),
                ("apiKey", api_key),
            ]);

        let native: Option<SpoonacularRecipe> = guarded(&self.breaker, async {
            fetch_json(request, RecipeSource::Primary).await
        })
        .await?;

        debug!("Spoonacular detail for {id}: found={}", native.is_some());
        Ok(native.map(RecipeDetail::from))
    }

    /// Random recipes from `/recipes/random`
    pub async fn random_recipes(&self, count: usize) -> Result<Vec<RecipeSummary>, RecipeError> {
        let api_key = self.api_key()?;
        let number = count.to_string();
        let request = self
            .http
            .get(self.url("/recipes/random"))
            .query(&[("number", number.as_str()), ("apiKey", api_key)]);

        let response: Option<RandomResponse> = guarded(&self.breaker, async {
            fetch_json(request, RecipeSource::Primary).await
        })
        .await?;

        Ok(response
            .map(|r| r.recipes)
            .unwrap_or_default()
            .iter()
            .take(count)
            .map(SpoonacularRecipe::to_summary)
            .collect())
    }

    /// Check that the API answers a minimal complex search
    pub async fn probe(&self) -> Result<(), RecipeError> {
        let api_key = self.api_key()?;
        let request = self
            .http
            .get(self.url("/recipes/complexSearch"))
            .query(&[("number", "1"), ("apiKey", api_key)]);

        let body: Option<serde_json::Value> = fetch_json(request, RecipeSource::Primary).await?;
        body.map(|_| ())
            .ok_or_else(|| RecipeError::SourceUnavailable("complex search not found".into()))
    }
}

#[async_trait]
impl SearchSource for SpoonacularClient {
    fn kind(&self) -> RecipeSource {
        RecipeSource::Primary
    }

    async fn search(
        &self,
        ingredients: &[String],
        count: usize,
    ) -> Result<Vec<SearchHit>, RecipeError> {
        let summaries = self.find_by_ingredients(ingredients, count).await?;
        Ok(summaries.into_iter().map(SearchHit::summary_only).collect())
    }

    async fn random(&self, count: usize) -> Result<Vec<RecipeSummary>, RecipeError> {
        self.random_recipes(count).await
    }
}

#[async_trait]
impl DetailSource for SpoonacularClient {
    async fn fetch_detail(&self, id: &RecipeId) -> Result<Option<RecipeDetail>, RecipeError> {
        self.information(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn native(value: serde_json::Value) -> SpoonacularRecipe {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_diet_flags_from_booleans_and_diets() {
        let recipe = native(json!({
            "id": 1,
            "title": "Bowl",
            "vegetarian": true,
            "vegan": false,
            "glutenFree": true,
            "diets": ["paleolithic", "Pescatarian", "dairy free"]
        }));
        let flags = recipe.diet_flags();
        assert!(flags.contains("vegetarian"));
        assert!(flags.contains("gluten free"));
        assert!(flags.contains("paleo"));
        assert!(flags.contains("pescetarian"));
        assert!(!flags.contains("dairy free"));
        assert!(!flags.contains("vegan"));
    }

    #[test]
    fn test_missing_time_and_servings_use_defaults() {
        let detail = RecipeDetail::from(native(json!({"id": 7, "title": "Mystery"})));
        assert_eq!(detail.ready_in_minutes, 0);
        assert_eq!(detail.servings, 1);
        assert_eq!(detail.id.as_str(), "7");
        assert_eq!(detail.source, RecipeSource::Primary);
    }

    #[test]
    fn test_conversion_keeps_lines_steps_and_nutrients() {
        let detail = RecipeDetail::from(native(json!({
            "id": 716429,
            "title": "Pasta with Garlic",
            "readyInMinutes": 45,
            "servings": 2,
            "sourceName": "Full Belly Sisters",
            "dishTypes": ["Lunch", "main course"],
            "extendedIngredients": [{"original": "1 tbsp butter"}, {"name": "no original"}],
            "analyzedInstructions": [{"name": "", "steps": [
                {"number": 1, "step": "Boil pasta."},
                {"number": 2, "step": "  "}
            ]}],
            "nutrition": {"nutrients": [
                {"name": "Calories", "amount": 543.36, "unit": "kcal", "percentOfDailyNeeds": 27.17}
            ]}
        })));
        assert_eq!(detail.ingredient_lines(), vec!["1 tbsp butter".to_string()]);
        assert_eq!(detail.instruction_steps.len(), 1);
        assert_eq!(detail.dish_types, vec!["lunch", "main course"]);
        assert_eq!(detail.nutrients[0].percent_daily, Some(27.17));
        assert_eq!(detail.source_name.as_deref(), Some("Full Belly Sisters"));
    }

    #[test]
    fn test_free_text_instructions_fill_missing_steps() {
        let detail = RecipeDetail::from(native(json!({
            "id": 3,
            "title": "Toast",
            "instructions": "<ol><li>Toast bread. Butter it.</li></ol>"
        })));
        let steps: Vec<&str> = detail
            .instruction_steps
            .iter()
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(steps, vec!["Toast bread", "Butter it."]);
    }

    #[test]
    fn test_blocklist_matches_name_or_url_case_insensitively() {
        let terms = vec!["foodista".to_string()];
        let by_name = RecipeDetail::new("1", "A", RecipeSource::Primary).with_source_name("FOODISTA");
        let clean = RecipeDetail::new("2", "B", RecipeSource::Primary)
            .with_source_name("Serious Eats")
            .with_source_url("https://www.seriouseats.com/b");
        assert!(is_blocklisted(&by_name, &terms));
        assert!(!is_blocklisted(&clean, &terms));
        assert!(!is_blocklisted(&by_name, &[]));
    }
}
