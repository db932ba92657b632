//! # Shopping List Module
//!
//! Collects the ingredient lines of every planned meal, groups them by
//! canonical ingredient and writes the result in one of the export formats.
//!
//! ## Usage
//!
//! ```rust
//! use recipe_finder::normalizer::IngredientNormalizer;
//! use recipe_finder::planner::{MealPlan, MealPlanEntry, MealType, Weekday};
//! use recipe_finder::shopping_list::ShoppingList;
//!
//! let mut plan = MealPlan::new();
//! let mut entry = MealPlanEntry::titled(Weekday::Monday, MealType::Dinner, "Omelette");
//! entry.ingredients = Some(vec!["2 large eggs".into(), "1 egg".into()]);
//! plan.assign(entry);
//!
//! let list = ShoppingList::from_meal_plan(&plan, &IngredientNormalizer::default());
//! assert_eq!(list.groups().len(), 1);
//! assert_eq!(list.groups()[0].canonical_key, "eggs");
//! ```

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

use crate::errors::RecipeError;
use crate::export::{self, ExportFormat, ExportRow};
use crate::normalizer::{IngredientGroup, IngredientNormalizer};
use crate::planner::MealPlan;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShoppingList {
    groups: Vec<IngredientGroup>,
}

impl ShoppingList {
    /// Group every ingredient line of the plan; entries not yet fetched are skipped
    pub fn from_meal_plan(plan: &MealPlan, normalizer: &IngredientNormalizer) -> Self {
        let lines: Vec<&str> = plan
            .entries()
            .iter()
            .filter_map(|entry| entry.ingredients.as_ref())
            .flatten()
            .map(String::as_str)
            .collect();
        Self::from_lines(&lines, normalizer)
    }

    pub fn from_lines<S: AsRef<str>>(lines: &[S], normalizer: &IngredientNormalizer) -> Self {
        Self {
            groups: normalizer.normalize(lines),
        }
    }

    pub fn groups(&self) -> &[IngredientGroup] {
        &self.groups
    }

    /// True when no planned meal has ingredients yet
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }

    pub fn rows(&self) -> Vec<ExportRow> {
        export::rows(&self.groups)
    }

    pub fn export(&self, format: ExportFormat) -> Vec<u8> {
        format.render(&self.groups)
    }

    /// Write the list to `path` in the format its extension names
    ///
    /// The file is written next to the target first and then moved into
    /// place, so a failed export never leaves a truncated file behind.
    pub fn write_to(&self, path: &Path) -> Result<ExportFormat, RecipeError> {
        let format = ExportFormat::from_path(path)?;
        let bytes = self.export(format);

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(path)
            .map_err(|e| RecipeError::Export(format!("{}: {}", path.display(), e.error)))?;

        info!(
            "Exported {} items in {} groups to {}",
            self.item_count(),
            self.groups.len(),
            path.display()
        );
        Ok(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{MealPlanEntry, MealType, Weekday};
    use std::fs;
    use tempfile::TempDir;

    fn plan() -> MealPlan {
        let mut plan = MealPlan::new();
        let mut pasta = MealPlanEntry::titled(Weekday::Monday, MealType::Dinner, "Pasta");
        pasta.ingredients = Some(vec![
            "2 cloves garlic, minced".to_string(),
            "1 tbsp extra virgin olive oil".to_string(),
        ]);
        let mut soup = MealPlanEntry::titled(Weekday::Tuesday, MealType::Lunch, "Soup");
        soup.ingredients = Some(vec!["1 onion, chopped".to_string(), "garlic clove".to_string()]);
        plan.assign(pasta);
        plan.assign(soup);
        plan.assign(MealPlanEntry::titled(Weekday::Friday, MealType::Dinner, "Not fetched"));
        plan
    }

    #[test]
    fn test_groups_across_entries() {
        let list = ShoppingList::from_meal_plan(&plan(), &IngredientNormalizer::default());
        let keys: Vec<&str> = list.groups().iter().map(|g| g.canonical_key.as_str()).collect();
        assert_eq!(keys, vec!["garlic", "olive oil", "onions"]);
        assert_eq!(list.groups()[0].members.len(), 2);
        assert_eq!(list.item_count(), 4);
    }

    #[test]
    fn test_plan_without_ingredients_is_empty() {
        let mut plan = MealPlan::new();
        plan.assign(MealPlanEntry::titled(Weekday::Monday, MealType::Lunch, "Soup"));
        assert!(ShoppingList::from_meal_plan(&plan, &IngredientNormalizer::default()).is_empty());
    }

    #[test]
    fn test_write_to_picks_format_from_extension() {
        let dir = TempDir::new().unwrap();
        let list = ShoppingList::from_meal_plan(&plan(), &IngredientNormalizer::default());

        let path = dir.path().join("list.csv");
        assert_eq!(list.write_to(&path).unwrap(), ExportFormat::Csv);
        let written = fs::read(&path).unwrap();
        assert_eq!(ExportFormat::Csv.read_back(&written).unwrap(), list.rows());

        let bad = dir.path().join("list.docx");
        assert!(matches!(list.write_to(&bad), Err(RecipeError::Export(_))));
        assert!(!bad.exists());
    }
}
