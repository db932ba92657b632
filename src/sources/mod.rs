//! Recipe source adapters
//!
//! Each adapter talks to one external recipe API and converts its native
//! payloads into the common records in [`crate::models`]:
//! - `spoonacular`: primary ingredient search, detail lookups, random picks
//! - `mealdb`: fallback free-text search whose records are complete on arrival
//!
//! Adapters report failures as [`RecipeError::SourceUnavailable`]; the
//! aggregator turns those into an empty branch result.

pub mod mealdb;
pub mod spoonacular;

pub use mealdb::MealDbClient;
pub use spoonacular::SpoonacularClient;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::{debug, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::errors::RecipeError;
use crate::models::{RecipeDetail, RecipeId, RecipeSource, RecipeSummary, SearchHit};

/// Ingredient search contract shared by both sources
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Which source this is
    fn kind(&self) -> RecipeSource;

    /// Search by ingredient names; at most `count` hits, in the source's ranking order
    async fn search(&self, ingredients: &[String], count: usize)
        -> Result<Vec<SearchHit>, RecipeError>;

    /// Up to `count` random recipes
    async fn random(&self, count: usize) -> Result<Vec<RecipeSummary>, RecipeError>;
}

/// Detail resolution for sources whose search results are not complete
#[async_trait]
pub trait DetailSource: Send + Sync {
    /// Full detail for `id`, `Ok(None)` when the source does not know it
    async fn fetch_detail(&self, id: &RecipeId) -> Result<Option<RecipeDetail>, RecipeError>;
}

/// Trim, lowercase and drop empty ingredient names
///
/// # Examples
///
/// ```rust
/// use recipe_finder::sources::normalize_query;
///
/// assert_eq!(normalize_query(&[" Chicken ", "", "RICE"]), vec!["chicken", "rice"]);
/// ```
pub fn normalize_query<S: AsRef<str>>(ingredients: &[S]) -> Vec<String> {
    ingredients
        .iter()
        .map(|name| name.as_ref().trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Split free-text instructions into numbered steps on ". "
pub fn split_steps(text: &str) -> Vec<(u32, String)> {
    text.split(". ")
        .map(str::trim)
        .filter(|step| !step.is_empty())
        .enumerate()
        .map(|(idx, step)| (idx as u32 + 1, step.to_string()))
        .collect()
}

/// Send a GET request and decode its JSON body
///
/// 404 maps to `Ok(None)`; any other non-2xx status, transport error or
/// undecodable body maps to `SourceUnavailable`.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    source: RecipeSource,
) -> Result<Option<T>, RecipeError> {
    let response = request.send().await?;
    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        debug!("{source} responded 404");
        return Ok(None);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("{source} responded with {status}: {body}");
        return Err(RecipeError::SourceUnavailable(format!(
            "{source} responded with {status}"
        )));
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map(Some).map_err(|e| {
        warn!("{source} returned a malformed payload: {e}");
        RecipeError::SourceUnavailable(format!("{source} returned a malformed payload: {e}"))
    })
}

/// Run a source call behind its circuit breaker
pub(crate) async fn guarded<T, F>(breaker: &CircuitBreaker, call: F) -> Result<T, RecipeError>
where
    F: Future<Output = Result<T, RecipeError>>,
{
    if breaker.is_open() {
        return Err(RecipeError::SourceUnavailable(
            "circuit breaker open".to_string(),
        ));
    }
    match call.await {
        Ok(value) => {
            breaker.record_success();
            Ok(value)
        }
        Err(e) => {
            if matches!(e, RecipeError::SourceUnavailable(_)) {
                breaker.record_failure();
            }
            Err(e)
        }
    }
}
