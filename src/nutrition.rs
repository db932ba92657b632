//! # Nutrition Module
//!
//! Headline nutrition values and display lines for a recipe's nutrient list.

use serde::Serialize;

use crate::models::{Nutrient, RecipeDetail};

/// Number of nutrient lines shown for a recipe
pub const DISPLAY_LIMIT: usize = 10;

/// The values shown at the top of a recipe view
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NutritionSummary {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub sugar: Option<f64>,
    pub fiber: Option<f64>,
}

impl NutritionSummary {
    pub fn from_detail(detail: &RecipeDetail) -> Self {
        let amount = |name: &str| {
            detail
                .nutrients
                .iter()
                .find(|n| n.name.eq_ignore_ascii_case(name))
                .map(|n| n.amount)
        };
        Self {
            calories: amount("Calories"),
            protein: amount("Protein"),
            fat: amount("Fat"),
            carbohydrates: amount("Carbohydrates"),
            sugar: amount("Sugar"),
            fiber: amount("Fiber"),
        }
    }

    /// True when the source reported none of the headline values
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// `"{name}: {amount} {unit} ({percent}% daily)"`, with `?` for an unknown percent
pub fn format_nutrient(nutrient: &Nutrient) -> String {
    let percent = match nutrient.percent_daily {
        Some(percent) => format!("{percent:.0}"),
        None => "?".to_string(),
    };
    format!(
        "{}: {:.1} {} ({percent}% daily)",
        nutrient.name, nutrient.amount, nutrient.unit
    )
}

/// The first [`DISPLAY_LIMIT`] nutrients of a recipe, formatted
pub fn summary_lines(detail: &RecipeDetail) -> Vec<String> {
    detail
        .nutrients
        .iter()
        .take(DISPLAY_LIMIT)
        .map(format_nutrient)
        .collect()
}
