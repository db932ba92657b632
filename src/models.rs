//! # Recipe Data Model
//!
//! This module defines the source-agnostic records that flow through the
//! recipe pipeline. Both recipe sources are normalized into these shapes by
//! their adapters, so nothing downstream ever looks at a source's native
//! payload.
//!
//! ## Core Concepts
//!
//! - **RecipeSummary**: the listing row an adapter returns for a search
//! - **RecipeDetail**: the full record (ingredients, steps, diet flags, nutrition)
//! - **SearchHit**: a summary plus the detail when the source already had it
//!
//! ## Usage
//!
//! ```rust
//! use recipe_finder::models::{RecipeDetail, RecipeSource};
//!
//! let detail = RecipeDetail::new("716429", "Pasta with Garlic", RecipeSource::Primary)
//!     .with_ready_in_minutes(45)
//!     .with_diet_flag("vegetarian")
//!     .with_ingredient("1 tbsp olive oil");
//!
//! assert!(detail.diet_flags.contains("vegetarian"));
//! assert_eq!(detail.ingredient_lines(), vec!["1 tbsp olive oil".to_string()]);
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").expect("HTML tag pattern should be valid");
}

/// Identifier of a recipe within its source
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(String);

impl RecipeId {
    pub fn new(id: &str) -> Self {
        Self(id.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric form of the id, as required by the primary source's detail endpoint
    pub fn as_numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl From<u64> for RecipeId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for RecipeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which external source produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecipeSource {
    /// Commercial recipe-search API
    #[serde(rename = "spoonacular")]
    Primary,
    /// Free community recipe database
    #[serde(rename = "mealdb")]
    Fallback,
}

impl RecipeSource {
    pub fn label(&self) -> &'static str {
        match self {
            RecipeSource::Primary => "spoonacular",
            RecipeSource::Fallback => "mealdb",
        }
    }
}

impl fmt::Display for RecipeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Listing row produced by a source adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: RecipeId,
    pub title: String,
    pub image: Option<String>,
    pub source: RecipeSource,
}

/// One ingredient line exactly as the source wrote it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub original: String,
}

/// One numbered instruction step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionStep {
    pub number: u32,
    pub text: String,
}

/// One nutrient value, as reported per serving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
    /// Share of the daily requirement, when the source reports it
    pub percent_daily: Option<f64>,
}

/// Full recipe record in the common shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub id: RecipeId,
    pub title: String,
    pub image: Option<String>,
    /// Free text summary; may contain HTML markup from the primary source
    pub summary: String,
    pub ingredients: Vec<IngredientLine>,
    pub instruction_steps: Vec<InstructionStep>,
    /// Preparation time in minutes, 0 when the source does not say
    pub ready_in_minutes: u32,
    pub servings: u32,
    pub source_url: String,
    /// Attributed contributor, used for the provenance blocklist
    pub source_name: Option<String>,
    pub diet_flags: BTreeSet<String>,
    /// Dish-type tags ("breakfast", "main course", ...); empty for the fallback source
    pub dish_types: Vec<String>,
    pub nutrients: Vec<Nutrient>,
    pub source: RecipeSource,
}

impl RecipeDetail {
    /// Create an empty detail record with source defaults
    pub fn new(id: impl Into<RecipeId>, title: &str, source: RecipeSource) -> Self {
        Self {
            id: id.into(),
            title: title.to_string(),
            image: None,
            summary: String::new(),
            ingredients: Vec::new(),
            instruction_steps: Vec::new(),
            ready_in_minutes: 0,
            servings: 1,
            source_url: String::new(),
            source_name: None,
            diet_flags: BTreeSet::new(),
            dish_types: Vec::new(),
            nutrients: Vec::new(),
            source,
        }
    }

    pub fn with_image(mut self, image: &str) -> Self {
        self.image = Some(image.to_string());
        self
    }

    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }

    pub fn with_ingredient(mut self, original: &str) -> Self {
        self.ingredients.push(IngredientLine {
            original: original.to_string(),
        });
        self
    }

    pub fn with_step(mut self, text: &str) -> Self {
        let number = self.instruction_steps.len() as u32 + 1;
        self.instruction_steps.push(InstructionStep {
            number,
            text: text.to_string(),
        });
        self
    }

    pub fn with_ready_in_minutes(mut self, minutes: u32) -> Self {
        self.ready_in_minutes = minutes;
        self
    }

    pub fn with_servings(mut self, servings: u32) -> Self {
        self.servings = servings;
        self
    }

    pub fn with_source_url(mut self, url: &str) -> Self {
        self.source_url = url.to_string();
        self
    }

    pub fn with_source_name(mut self, name: &str) -> Self {
        self.source_name = Some(name.to_string());
        self
    }

    /// Add a diet flag (stored lowercase)
    pub fn with_diet_flag(mut self, flag: &str) -> Self {
        self.diet_flags.insert(flag.trim().to_lowercase());
        self
    }

    /// Add a dish-type tag (stored lowercase)
    pub fn with_dish_type(mut self, dish_type: &str) -> Self {
        self.dish_types.push(dish_type.trim().to_lowercase());
        self
    }

    pub fn with_nutrient(mut self, nutrient: Nutrient) -> Self {
        self.nutrients.push(nutrient);
        self
    }

    /// The listing row for this record
    pub fn to_summary(&self) -> RecipeSummary {
        RecipeSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            image: self.image.clone(),
            source: self.source,
        }
    }

    /// Ingredient lines as plain strings, in recipe order
    pub fn ingredient_lines(&self) -> Vec<String> {
        self.ingredients
            .iter()
            .map(|line| line.original.clone())
            .collect()
    }

    /// Summary text with HTML tags removed
    pub fn plain_summary(&self) -> String {
        strip_html(&self.summary)
    }
}

/// Remove HTML tags and surrounding whitespace from source-provided text
pub fn strip_html(text: &str) -> String {
    HTML_TAG.replace_all(text, "").trim().to_string()
}

impl fmt::Display for RecipeDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (ready in {} min, serves {})",
            self.title, self.ready_in_minutes, self.servings
        )?;
        if !self.diet_flags.is_empty() {
            let flags: Vec<&str> = self.diet_flags.iter().map(String::as_str).collect();
            write!(f, " [{}]", flags.join(", "))?;
        }
        Ok(())
    }
}

/// What a source adapter returns for one search result
///
/// Hits from the fallback source already carry their full detail; hits from
/// the primary source only carry the listing row and need a detail fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub summary: RecipeSummary,
    pub detail: Option<RecipeDetail>,
}

impl SearchHit {
    /// A hit that still needs its detail resolved
    pub fn summary_only(summary: RecipeSummary) -> Self {
        Self {
            summary,
            detail: None,
        }
    }

    /// A hit whose detail is already complete
    pub fn complete(detail: RecipeDetail) -> Self {
        Self {
            summary: detail.to_summary(),
            detail: Some(detail),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.detail.is_some()
    }
}
