//! # Filter Engine Module
//!
//! Predicates applied to fully resolved recipes: diet, preparation time and
//! meal type. All of them only look at the common [`RecipeDetail`] fields, so
//! they behave the same for both sources.
//!
//! ```rust
//! use recipe_finder::filters::{MealTypeFilter, SearchFilters, TimeWindow};
//! use recipe_finder::models::{RecipeDetail, RecipeSource};
//!
//! let filters = SearchFilters::default()
//!     .with_diets(["vegan"])
//!     .with_time(TimeWindow::new(10, 30))
//!     .with_meal_type(MealTypeFilter::Only("lunch".into()));
//!
//! let detail = RecipeDetail::new("1", "Bowl", RecipeSource::Primary)
//!     .with_diet_flag("vegan")
//!     .with_dish_type("Lunch")
//!     .with_ready_in_minutes(25);
//! assert!(filters.accepts(&detail));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::models::RecipeDetail;

pub const DEFAULT_MIN_MINUTES: u32 = 0;
pub const DEFAULT_MAX_MINUTES: u32 = 60;

/// Diet tags a recipe must all carry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietSelection(BTreeSet<String>);

impl DietSelection {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            tags.into_iter()
                .map(|tag| tag.as_ref().trim().to_lowercase())
                .filter(|tag| !tag.is_empty())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// True iff every selected tag is among the record's diet flags
///
/// An empty selection matches everything.
pub fn matches_diet(detail: &RecipeDetail, selection: &DietSelection) -> bool {
    selection.tags().all(|tag| detail.diet_flags.contains(tag))
}

/// Inclusive preparation-time window in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub min: u32,
    pub max: u32,
}

impl TimeWindow {
    /// Window between two bounds; swapped bounds are put in order
    pub fn new(min: u32, max: u32) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    /// Recipes with unknown time (0) only pass windows that start at 0
    pub fn contains(&self, detail: &RecipeDetail) -> bool {
        (self.min..=self.max).contains(&detail.ready_in_minutes)
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_MINUTES, DEFAULT_MAX_MINUTES)
    }
}

/// Dish-type restriction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MealTypeFilter {
    #[default]
    Any,
    Only(String),
}

impl MealTypeFilter {
    /// Parse a user choice; empty or "any" means no restriction
    pub fn parse(raw: &str) -> Self {
        let tag = raw.trim().to_lowercase();
        if tag.is_empty() || tag == "any" {
            MealTypeFilter::Any
        } else {
            MealTypeFilter::Only(tag)
        }
    }

    pub fn accepts(&self, detail: &RecipeDetail) -> bool {
        match self {
            MealTypeFilter::Any => true,
            MealTypeFilter::Only(tag) => {
                let tag = tag.to_lowercase();
                detail.dish_types.iter().any(|dish| *dish == tag)
            }
        }
    }
}

impl fmt::Display for MealTypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MealTypeFilter::Any => f.write_str("any"),
            MealTypeFilter::Only(tag) => f.write_str(tag),
        }
    }
}

/// All filters of one search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub diets: DietSelection,
    pub time: TimeWindow,
    pub meal_type: MealTypeFilter,
}

impl SearchFilters {
    pub fn with_diets<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.diets = DietSelection::new(tags);
        self
    }

    pub fn with_time(mut self, time: TimeWindow) -> Self {
        self.time = time;
        self
    }

    pub fn with_meal_type(mut self, meal_type: MealTypeFilter) -> Self {
        self.meal_type = meal_type;
        self
    }

    pub fn accepts(&self, detail: &RecipeDetail) -> bool {
        matches_diet(detail, &self.diets)
            && self.time.contains(detail)
            && self.meal_type.accepts(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecipeSource;

    fn recipe(minutes: u32) -> RecipeDetail {
        RecipeDetail::new("1", "Dish", RecipeSource::Primary).with_ready_in_minutes(minutes)
    }

    #[test]
    fn test_empty_selection_matches_everything() {
        assert!(matches_diet(&recipe(10), &DietSelection::default()));
        assert!(matches_diet(&recipe(10), &DietSelection::new(["", "  "])));
    }

    #[test]
    fn test_every_selected_diet_is_required() {
        let detail = recipe(10).with_diet_flag("vegan").with_diet_flag("gluten free");
        assert!(matches_diet(&detail, &DietSelection::new(["Vegan"])));
        assert!(matches_diet(&detail, &DietSelection::new(["vegan", "gluten free"])));
        assert!(!matches_diet(&detail, &DietSelection::new(["vegan", "ketogenic"])));
    }

    #[test]
    fn test_time_window_is_inclusive() {
        let window = TimeWindow::new(10, 30);
        assert!(window.contains(&recipe(10)));
        assert!(window.contains(&recipe(30)));
        assert!(!window.contains(&recipe(31)));
        assert!(!window.contains(&recipe(9)));
    }

    #[test]
    fn test_unknown_time_only_passes_windows_from_zero() {
        assert!(TimeWindow::default().contains(&recipe(0)));
        assert!(!TimeWindow::new(5, 60).contains(&recipe(0)));
    }

    #[test]
    fn test_swapped_bounds_are_ordered() {
        assert_eq!(TimeWindow::new(40, 20), TimeWindow { min: 20, max: 40 });
    }

    #[test]
    fn test_meal_type_filter() {
        let lunch = recipe(10).with_dish_type("Lunch").with_dish_type("main course");
        let fallback = RecipeDetail::new("2", "Stew", RecipeSource::Fallback);
        assert!(MealTypeFilter::Any.accepts(&lunch));
        assert!(MealTypeFilter::parse("LUNCH").accepts(&lunch));
        assert!(!MealTypeFilter::parse("breakfast").accepts(&lunch));
        assert!(MealTypeFilter::Any.accepts(&fallback));
        assert!(!MealTypeFilter::parse("dinner").accepts(&fallback));
        assert_eq!(MealTypeFilter::parse(" any "), MealTypeFilter::Any);
    }

    #[test]
    fn test_combined_filters() {
        let filters = SearchFilters::default().with_diets(["vegetarian"]);
        assert!(filters.accepts(&recipe(45).with_diet_flag("vegetarian")));
        assert!(!filters.accepts(&recipe(75).with_diet_flag("vegetarian")));
        assert!(!filters.accepts(&recipe(45)));
    }
}
