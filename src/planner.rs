//! # Meal Planner Module
//!
//! A weekly grid of meal slots. Each `(day, meal type)` slot holds at most one
//! entry; entries remember which recipe they came from so their ingredient
//! lines can be fetched later and fed into the shopping list.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::detail::DetailFetcher;
use crate::errors::RecipeError;
use crate::models::{RecipeDetail, RecipeId, RecipeSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Weekday::ALL
            .into_iter()
            .find(|day| day.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown day '{wanted}'"))
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    pub const ALL: [MealType; 3] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner];

    pub fn name(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
        }
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        MealType::ALL
            .into_iter()
            .find(|meal| meal.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown meal type '{wanted}'"))
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One planned meal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanEntry {
    pub day: Weekday,
    #[serde(rename = "meal")]
    pub meal_type: MealType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<RecipeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<RecipeSource>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Ingredient lines, filled in once the recipe detail was fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<String>>,
}

impl MealPlanEntry {
    /// A free-text entry not linked to any recipe
    pub fn titled(day: Weekday, meal_type: MealType, title: &str) -> Self {
        Self {
            day,
            meal_type,
            recipe_id: None,
            source: None,
            title: title.trim().to_string(),
            source_url: None,
            ingredients: None,
        }
    }

    /// An entry for a resolved recipe, ingredients included
    pub fn from_detail(day: Weekday, meal_type: MealType, detail: &RecipeDetail) -> Self {
        Self {
            day,
            meal_type,
            recipe_id: Some(detail.id.clone()),
            source: Some(detail.source),
            title: detail.title.clone(),
            source_url: Some(detail.source_url.clone()).filter(|url| !url.is_empty()),
            ingredients: Some(detail.ingredient_lines()),
        }
    }

    pub fn with_recipe(mut self, id: RecipeId, source: RecipeSource) -> Self {
        self.recipe_id = Some(id);
        self.source = Some(source);
        self
    }

    pub fn slot(&self) -> (Weekday, MealType) {
        (self.day, self.meal_type)
    }
}

/// The weekly plan, at most one entry per slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MealPlan {
    entries: Vec<MealPlanEntry>,
}

impl MealPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a plan from stored entries; later entries win on slot clashes
    pub fn from_entries(entries: impl IntoIterator<Item = MealPlanEntry>) -> Self {
        let mut plan = Self::new();
        for entry in entries {
            plan.assign(entry);
        }
        plan
    }

    /// Put an entry in its slot, replacing whatever was there
    ///
    /// Returns the replaced entry, if any.
    pub fn assign(&mut self, entry: MealPlanEntry) -> Option<MealPlanEntry> {
        let slot = entry.slot();
        let replaced = self.remove(slot.0, slot.1);
        debug!("Planned '{}' for {} {}", entry.title, slot.0, slot.1);
        self.entries.push(entry);
        self.entries.sort_by_key(MealPlanEntry::slot);
        replaced
    }

    pub fn get(&self, day: Weekday, meal_type: MealType) -> Option<&MealPlanEntry> {
        self.entries.iter().find(|e| e.slot() == (day, meal_type))
    }

    pub fn remove(&mut self, day: Weekday, meal_type: MealType) -> Option<MealPlanEntry> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.slot() == (day, meal_type))?;
        Some(self.entries.remove(idx))
    }

    /// Store fetched ingredient lines on an entry; false when the slot is empty
    pub fn attach_ingredients(
        &mut self,
        day: Weekday,
        meal_type: MealType,
        ingredients: Vec<String>,
    ) -> bool {
        match self.entries.iter_mut().find(|e| e.slot() == (day, meal_type)) {
            Some(entry) => {
                entry.ingredients = Some(ingredients);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries ordered by day, then meal type
    pub fn entries(&self) -> &[MealPlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetch the recipe behind a planned slot and store its ingredient lines
///
/// Returns the number of lines attached. Entries without a linked recipe
/// cannot be hydrated.
pub async fn hydrate_entry(
    plan: &mut MealPlan,
    day: Weekday,
    meal_type: MealType,
    fetcher: &DetailFetcher,
) -> Result<usize, RecipeError> {
    let entry = plan.get(day, meal_type).ok_or_else(|| {
        RecipeError::RecordUnresolvable(format!("nothing planned for {day} {meal_type}"))
    })?;
    let id = entry.recipe_id.clone().ok_or_else(|| {
        RecipeError::RecordUnresolvable(format!("'{}' is not linked to a recipe", entry.title))
    })?;
    let source = entry.source.unwrap_or(RecipeSource::Primary);

    let detail = fetcher.try_get_detail(source, &id).await?;
    let lines = detail.ingredient_lines();
    let count = lines.len();
    plan.attach_ingredients(day, meal_type, lines);
    info!("Attached {count} ingredient lines to {day} {meal_type}");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("monday".parse::<Weekday>(), Ok(Weekday::Monday));
        assert_eq!(" SUNDAY ".parse::<Weekday>(), Ok(Weekday::Sunday));
        assert_eq!("dinner".parse::<MealType>(), Ok(MealType::Dinner));
        assert!("brunch".parse::<MealType>().is_err());
        assert!("Someday".parse::<Weekday>().is_err());
    }

    #[test]
    fn test_assign_replaces_occupied_slot() {
        let mut plan = MealPlan::new();
        plan.assign(MealPlanEntry::titled(Weekday::Monday, MealType::Lunch, "Soup"));
        let replaced = plan.assign(MealPlanEntry::titled(Weekday::Monday, MealType::Lunch, "Salad"));
        assert_eq!(replaced.map(|e| e.title), Some("Soup".to_string()));
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.get(Weekday::Monday, MealType::Lunch).unwrap().title, "Salad");
    }

    #[test]
    fn test_entries_are_ordered_by_slot() {
        let mut plan = MealPlan::new();
        plan.assign(MealPlanEntry::titled(Weekday::Friday, MealType::Breakfast, "Eggs"));
        plan.assign(MealPlanEntry::titled(Weekday::Monday, MealType::Dinner, "Stew"));
        plan.assign(MealPlanEntry::titled(Weekday::Monday, MealType::Breakfast, "Toast"));
        let titles: Vec<&str> = plan.entries().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Toast", "Stew", "Eggs"]);
    }

    #[test]
    fn test_attach_ingredients_and_remove() {
        let mut plan = MealPlan::new();
        plan.assign(MealPlanEntry::titled(Weekday::Tuesday, MealType::Dinner, "Curry"));
        assert!(plan.attach_ingredients(
            Weekday::Tuesday,
            MealType::Dinner,
            vec!["1 onion".to_string()]
        ));
        assert!(!plan.attach_ingredients(Weekday::Tuesday, MealType::Lunch, vec![]));
        assert_eq!(
            plan.get(Weekday::Tuesday, MealType::Dinner).unwrap().ingredients,
            Some(vec!["1 onion".to_string()])
        );
        assert!(plan.remove(Weekday::Tuesday, MealType::Dinner).is_some());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_from_detail_links_recipe() {
        let detail = RecipeDetail::new("52772", "Casserole", RecipeSource::Fallback)
            .with_ingredient("soy sauce")
            .with_source_url("");
        let entry = MealPlanEntry::from_detail(Weekday::Sunday, MealType::Dinner, &detail);
        assert_eq!(entry.recipe_id, Some(RecipeId::new("52772")));
        assert_eq!(entry.source, Some(RecipeSource::Fallback));
        assert_eq!(entry.source_url, None);
        assert_eq!(entry.ingredients, Some(vec!["soy sauce".to_string()]));
    }

    #[test]
    fn test_serialized_shape_uses_meal_key() {
        let entry = MealPlanEntry::titled(Weekday::Monday, MealType::Lunch, "Soup");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["day"], "Monday");
        assert_eq!(json["meal"], "Lunch");
        assert!(json.get("ingredients").is_none());
    }
}
