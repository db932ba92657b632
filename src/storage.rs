//! # Local Storage Module
//!
//! JSON files in the data directory: settings, meal plan, favorites and
//! search history. Loading never fails: a missing or unreadable file yields
//! the default value. Saving goes through a temporary file in the same
//! directory that is then renamed over the target.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::models::{RecipeDetail, RecipeId, RecipeSource};
use crate::planner::{MealPlan, MealPlanEntry};

pub const SETTINGS_FILE: &str = "settings.json";
pub const MEALPLAN_FILE: &str = "mealplan.json";
pub const FAVORITES_FILE: &str = "favorites.json";
pub const HISTORY_FILE: &str = "history.json";

/// Searches kept in the history
pub const HISTORY_LIMIT: usize = 10;

/// Accept either a list of strings or a single bare string
fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
        None => Vec::new(),
    })
}

/// User preferences remembered between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub language: String,
    #[serde(deserialize_with = "string_or_list")]
    pub last_ingredients: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub last_diets: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            last_ingredients: Vec::new(),
            last_diets: Vec::new(),
        }
    }
}

/// A saved recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: RecipeId,
    pub source: RecipeSource,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    pub saved_at: DateTime<Utc>,
}

impl Favorite {
    pub fn from_detail(detail: &RecipeDetail) -> Self {
        Self {
            id: detail.id.clone(),
            source: detail.source,
            title: detail.title.clone(),
            image: detail.image.clone(),
            saved_at: Utc::now(),
        }
    }
}

/// Paths of every stored file under one data directory
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    pub fn load_settings(&self) -> Settings {
        load_json(&self.path(SETTINGS_FILE))
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        save_json(&self.path(SETTINGS_FILE), settings)
    }

    /// Stored meal plan; entries that do not parse are skipped
    pub fn load_meal_plan(&self) -> MealPlan {
        let raw: Vec<Value> = load_list(&self.path(MEALPLAN_FILE));
        let entries = raw.into_iter().filter_map(|value| {
            serde_json::from_value::<MealPlanEntry>(value)
                .map_err(|e| debug!("Skipping stored meal plan entry: {e}"))
                .ok()
        });
        MealPlan::from_entries(entries)
    }

    pub fn save_meal_plan(&self, plan: &MealPlan) -> Result<()> {
        save_json(&self.path(MEALPLAN_FILE), plan)
    }

    pub fn load_favorites(&self) -> Vec<Favorite> {
        let raw: Vec<Value> = load_list(&self.path(FAVORITES_FILE));
        raw.into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect()
    }

    pub fn save_favorites(&self, favorites: &[Favorite]) -> Result<()> {
        save_json(&self.path(FAVORITES_FILE), &favorites)
    }

    /// Add a favorite unless one with the same source and id exists
    ///
    /// Returns whether the list changed.
    pub fn add_favorite(&self, favorite: Favorite) -> Result<bool> {
        let mut favorites = self.load_favorites();
        if favorites
            .iter()
            .any(|f| f.id == favorite.id && f.source == favorite.source)
        {
            debug!("Recipe {} already a favorite", favorite.id);
            return Ok(false);
        }
        info!("Saving favorite '{}'", favorite.title);
        favorites.push(favorite);
        self.save_favorites(&favorites)?;
        Ok(true)
    }

    /// Remove every favorite with this id; returns whether anything was removed
    pub fn remove_favorite(&self, id: &RecipeId) -> Result<bool> {
        let mut favorites = self.load_favorites();
        let before = favorites.len();
        favorites.retain(|f| &f.id != id);
        if favorites.len() == before {
            return Ok(false);
        }
        self.save_favorites(&favorites)?;
        Ok(true)
    }

    /// Past searches, newest first
    pub fn load_history(&self) -> Vec<String> {
        load_list(&self.path(HISTORY_FILE))
    }

    /// Record a search at the top of the history
    pub fn push_history(&self, query: &str) -> Result<Vec<String>> {
        let history = push_history(self.load_history(), query);
        save_json(&self.path(HISTORY_FILE), &history)?;
        Ok(history)
    }
}

/// Put `query` first, drop older duplicates and keep [`HISTORY_LIMIT`] entries
pub fn push_history(mut history: Vec<String>, query: &str) -> Vec<String> {
    let query = query.trim();
    if query.is_empty() {
        return history;
    }
    history.retain(|past| !past.eq_ignore_ascii_case(query));
    history.insert(0, query.to_string());
    history.truncate(HISTORY_LIMIT);
    history
}

/// Read a JSON value, falling back to the default on any problem
pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => {
            debug!("No stored data at {}", path.display());
            return T::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!("Unexpected format in {}, using defaults: {e}", path.display());
            T::default()
        }
    }
}

/// Read a JSON list; a bare value is treated as a one-element list
pub fn load_list<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    match load_json::<Value>(path) {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        single => match serde_json::from_value(single) {
            Ok(item) => vec![item],
            Err(_) => {
                warn!("Unexpected format in {}, resetting", path.display());
                Vec::new()
            }
        },
    }
}

/// Write a value as pretty JSON, atomically
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create data directory {}", dir.display()))?;

    let json = serde_json::to_string_pretty(value).context("Failed to serialize data")?;
    let mut tmp = NamedTempFile::new_in(&dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(json.as_bytes())
        .context("Failed to write temporary file")?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    debug!("Saved {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{MealType, Weekday};
    use tempfile::TempDir;

    fn storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path());
        (dir, storage)
    }

    #[test]
    fn test_missing_files_give_defaults() {
        let (_dir, storage) = storage();
        assert_eq!(storage.load_settings(), Settings::default());
        assert!(storage.load_meal_plan().is_empty());
        assert!(storage.load_favorites().is_empty());
        assert!(storage.load_history().is_empty());
    }

    #[test]
    fn test_malformed_files_give_defaults() {
        let (dir, storage) = storage();
        fs::write(dir.path().join(SETTINGS_FILE), "{not json").unwrap();
        fs::write(dir.path().join(HISTORY_FILE), "42").unwrap();
        assert_eq!(storage.load_settings().language, "en");
        assert!(storage.load_history().is_empty());
    }

    #[test]
    fn test_bare_string_becomes_list() {
        let (dir, storage) = storage();
        fs::write(dir.path().join(HISTORY_FILE), "\"chicken, rice\"").unwrap();
        assert_eq!(storage.load_history(), vec!["chicken, rice".to_string()]);

        fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"language": "fi", "last_ingredients": "egg"}"#,
        )
        .unwrap();
        let settings = storage.load_settings();
        assert_eq!(settings.language, "fi");
        assert_eq!(settings.last_ingredients, vec!["egg".to_string()]);
    }

    #[test]
    fn test_history_is_newest_first_deduplicated_and_capped() {
        let mut history = Vec::new();
        for i in 0..12 {
            history = push_history(history, &format!("query {i}"));
        }
        history = push_history(history, "QUERY 5");
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0], "QUERY 5");
        assert_eq!(history.iter().filter(|q| q.to_lowercase() == "query 5").count(), 1);
        assert_eq!(history[1], "query 11");
        assert_eq!(push_history(history.clone(), "  "), history);
    }

    #[test]
    fn test_meal_plan_round_trip_skips_bad_entries() {
        let (dir, storage) = storage();
        let mut plan = MealPlan::new();
        plan.assign(MealPlanEntry::titled(Weekday::Monday, MealType::Lunch, "Soup"));
        storage.save_meal_plan(&plan).unwrap();
        assert_eq!(storage.load_meal_plan(), plan);

        fs::write(
            dir.path().join(MEALPLAN_FILE),
            r#"[{"day": "Monday", "meal": "Lunch", "title": "Soup"}, {"day": "Someday"}]"#,
        )
        .unwrap();
        assert_eq!(storage.load_meal_plan().len(), 1);
    }

    #[test]
    fn test_favorites_are_deduplicated() {
        let (_dir, storage) = storage();
        let detail = RecipeDetail::new("716429", "Pasta", RecipeSource::Primary);
        assert!(storage.add_favorite(Favorite::from_detail(&detail)).unwrap());
        assert!(!storage.add_favorite(Favorite::from_detail(&detail)).unwrap());
        assert_eq!(storage.load_favorites().len(), 1);
        assert!(storage.remove_favorite(&RecipeId::new("716429")).unwrap());
        assert!(!storage.remove_favorite(&RecipeId::new("716429")).unwrap());
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("nested").join("data"));
        storage.save_settings(&Settings::default()).unwrap();
        assert!(storage.data_dir().join(SETTINGS_FILE).exists());
    }
}
