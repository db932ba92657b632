//! # Ingredient Normalizer Module
//!
//! This module turns raw ingredient lines ("2 cups chopped onions",
//! "1 onion, diced") into canonical grouping keys so a shopping list can
//! gather the same ingredient from several recipes.
//!
//! ## Features
//!
//! - An explicit, ordered list of regex stripping rules
//! - Quantity and unit removal (fractions, decimals, integers)
//! - Descriptor removal (chopped, fresh, to taste, ...)
//! - A synonym table passed in by the caller, so regional and brand variants
//!   collapse onto one key
//! - Deterministic grouping: groups sorted by key, members in input order

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

// Quantity followed by an optional unit name
const QUANTITY_UNIT_PATTERN: &str = r"\b(\d+/\d+|\d+\.\d+|\d+)\s*(cup|cups|tbsp|tsp|teaspoon|tablespoon|package|slice|pieces|oz|ml|g|kg|pound|lb|clove|dash|pinch|quart|liter|stick|can|pkg|bunch|handful|boxes)?\b";

// Preparation and size words that do not change what has to be bought
const DESCRIPTOR_PATTERN: &str = r"\b(chopped|sliced|minced|diced|fresh|optional|to taste|large|small|medium|extra|firm|soft|finely|roughly|thinly|ground|crushed|real|size|rinsed|cut|high grade|korean|baby|cooked|uncooked|prepared|regular|julienned|into 1 inch cubes|available at asian markets)\b";

const PARENTHESIS_PATTERN: &str = r"\(.*?\)";
const PUNCTUATION_PATTERN: &str = r"[^\w\s]";
const WHITESPACE_PATTERN: &str = r"\s+";

lazy_static! {
    static ref PARENTHESIS_REGEX: Regex =
        Regex::new(PARENTHESIS_PATTERN).expect("Parenthesis pattern should be valid");
    static ref QUANTITY_UNIT_REGEX: Regex =
        Regex::new(QUANTITY_UNIT_PATTERN).expect("Quantity pattern should be valid");
    static ref DESCRIPTOR_REGEX: Regex =
        Regex::new(DESCRIPTOR_PATTERN).expect("Descriptor pattern should be valid");
    static ref PUNCTUATION_REGEX: Regex =
        Regex::new(PUNCTUATION_PATTERN).expect("Punctuation pattern should be valid");
    static ref WHITESPACE_REGEX: Regex =
        Regex::new(WHITESPACE_PATTERN).expect("Whitespace pattern should be valid");
}

/// Built-in synonym entries: cleaned string -> canonical key
const DEFAULT_SYNONYMS: &[(&str, &str)] = &[
    ("onion", "onions"),
    ("yellow onion", "onions"),
    ("white onion", "onions"),
    ("green onion", "green onions"),
    ("spring onion", "green onions"),
    ("spring onions", "green onions"),
    ("scallion", "green onions"),
    ("scallions", "green onions"),
    ("virgin olive oil", "olive oil"),
    ("extra virgin olive oil", "olive oil"),
    ("garlic clove", "garlic"),
    ("garlic cloves", "garlic"),
    ("cloves garlic", "garlic"),
    ("cloves of garlic", "garlic"),
    ("egg", "eggs"),
    ("tomato", "tomatoes"),
    ("potato", "potatoes"),
    ("coriander", "cilantro"),
    ("coriander leaves", "cilantro"),
    ("garbanzo beans", "chickpeas"),
    ("aubergine", "eggplant"),
    ("courgette", "zucchini"),
    ("courgettes", "zucchini"),
    ("kosher salt", "salt"),
    ("sea salt", "salt"),
    ("table salt", "salt"),
    ("allpurpose flour", "flour"),
    ("plain flour", "flour"),
    ("unsalted butter", "butter"),
    ("salted butter", "butter"),
    ("soya sauce", "soy sauce"),
    ("caster sugar", "sugar"),
    ("granulated sugar", "sugar"),
];

/// One named regex rewrite applied to an ingredient line
#[derive(Debug, Clone)]
pub struct StripRule {
    /// Short name used in trace output
    pub name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

impl StripRule {
    pub fn new(name: &'static str, pattern: Regex, replacement: &'static str) -> Self {
        Self {
            name,
            pattern,
            replacement,
        }
    }

    pub fn apply(&self, text: &str) -> String {
        self.pattern.replace_all(text, self.replacement).into_owned()
    }

    pub fn pattern_str(&self) -> &str {
        self.pattern.as_str()
    }
}

/// The default stripping rules, in the order they must run
pub fn default_rules() -> Vec<StripRule> {
    vec![
        StripRule::new("parenthesis", PARENTHESIS_REGEX.clone(), ""),
        StripRule::new("quantity", QUANTITY_UNIT_REGEX.clone(), ""),
        StripRule::new("descriptor", DESCRIPTOR_REGEX.clone(), ""),
        StripRule::new("punctuation", PUNCTUATION_REGEX.clone(), ""),
        StripRule::new("whitespace", WHITESPACE_REGEX.clone(), " "),
    ]
}

/// Mapping from cleaned ingredient strings to canonical keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynonymTable {
    entries: HashMap<String, String>,
}

impl SynonymTable {
    /// A table with no entries: every cleaned string is its own key
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in table of regional and variant names
    pub fn builtin() -> Self {
        DEFAULT_SYNONYMS
            .iter()
            .fold(Self::empty(), |table, (from, to)| table.with_entry(from, to))
    }

    /// Add or replace one mapping (both sides are lowercased and trimmed)
    pub fn with_entry(mut self, from: &str, to: &str) -> Self {
        self.entries
            .insert(from.trim().to_lowercase(), to.trim().to_lowercase());
        self
    }

    pub fn lookup(&self, cleaned: &str) -> Option<&str> {
        self.entries.get(cleaned).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Original ingredient lines sharing one canonical key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientGroup {
    pub canonical_key: String,
    pub members: Vec<String>,
}

/// Ingredient normalizer with an ordered rule list and a synonym table
///
/// # Examples
///
/// ```rust
/// use recipe_finder::normalizer::IngredientNormalizer;
///
/// let normalizer = IngredientNormalizer::default();
/// let groups = normalizer.normalize(&["2 cups chopped onions", "1 onion, diced", "Onions"]);
///
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups[0].canonical_key, "onions");
/// assert_eq!(groups[0].members.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct IngredientNormalizer {
    rules: Vec<StripRule>,
    synonyms: SynonymTable,
}

impl IngredientNormalizer {
    /// Create a normalizer with the default rules and the given synonym table
    pub fn new(synonyms: SynonymTable) -> Self {
        Self::with_rules(default_rules(), synonyms)
    }

    /// Create a normalizer with a custom rule list
    pub fn with_rules(rules: Vec<StripRule>, synonyms: SynonymTable) -> Self {
        debug!(
            "Creating IngredientNormalizer with {} rules and {} synonyms",
            rules.len(),
            synonyms.len()
        );
        Self { rules, synonyms }
    }

    pub fn rules(&self) -> &[StripRule] {
        &self.rules
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    /// Lowercase the line and run every stripping rule, without synonyms
    pub fn clean(&self, raw: &str) -> String {
        let mut cleaned = raw.to_lowercase();
        for rule in &self.rules {
            let next = rule.apply(&cleaned);
            if next != cleaned {
                trace!("Rule '{}': '{}' -> '{}'", rule.name, cleaned, next);
            }
            cleaned = next;
        }
        cleaned.trim().to_string()
    }

    /// Canonical grouping key for one raw ingredient line
    pub fn canonical_key(&self, raw: &str) -> String {
        let cleaned = self.clean(raw);
        match self.synonyms.lookup(&cleaned) {
            Some(canonical) => {
                trace!("Synonym '{}' -> '{}'", cleaned, canonical);
                canonical.to_string()
            }
            None => cleaned,
        }
    }

    /// Group raw ingredient lines by canonical key
    ///
    /// Groups come back sorted by key; members keep their input order and are
    /// trimmed. Blank lines are skipped.
    pub fn normalize<S: AsRef<str>>(&self, raw_items: &[S]) -> Vec<IngredientGroup> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for item in raw_items {
            let original = item.as_ref().trim();
            if original.is_empty() {
                continue;
            }
            let key = self.canonical_key(original);
            grouped.entry(key).or_default().push(original.to_string());
        }

        debug!(
            "Normalized {} ingredient lines into {} groups",
            raw_items.len(),
            grouped.len()
        );

        grouped
            .into_iter()
            .map(|(canonical_key, members)| IngredientGroup {
                canonical_key,
                members,
            })
            .collect()
    }
}

impl Default for IngredientNormalizer {
    fn default() -> Self {
        Self::new(SynonymTable::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> IngredientNormalizer {
        IngredientNormalizer::new(SynonymTable::empty())
    }

    #[test]
    fn test_rules_run_in_declared_order() {
        let names: Vec<&str> = default_rules().iter().map(|rule| rule.name).collect();
        assert_eq!(
            names,
            vec!["parenthesis", "quantity", "descriptor", "punctuation", "whitespace"]
        );
    }

    #[test]
    fn test_quantity_and_unit_stripping() {
        let normalizer = plain();
        assert_eq!(normalizer.clean("2 cups flour"), "flour");
        assert_eq!(normalizer.clean("1/2 cup sugar"), "sugar");
        assert_eq!(normalizer.clean("1.5 kg potatoes"), "potatoes");
        assert_eq!(normalizer.clean("500g butter"), "butter");
        assert_eq!(normalizer.clean("3 eggs"), "eggs");
    }

    #[test]
    fn test_unit_must_be_a_whole_word() {
        // "g" must not eat the first letter of "garlic"
        assert_eq!(plain().clean("2 garlic bulbs"), "garlic bulbs");
    }

    #[test]
    fn test_parenthesis_stripping() {
        assert_eq!(plain().clean("1 can tomatoes (14 oz)"), "tomatoes");
    }

    #[test]
    fn test_descriptor_stripping() {
        let normalizer = plain();
        assert_eq!(normalizer.clean("2 large eggs"), "eggs");
        assert_eq!(normalizer.clean("salt to taste"), "salt");
        assert_eq!(normalizer.clean("Finely chopped fresh parsley"), "parsley");
        assert_eq!(normalizer.clean("ground cinnamon, optional"), "cinnamon");
    }

    #[test]
    fn test_punctuation_and_whitespace() {
        assert_eq!(plain().clean("  onion,   diced!  "), "onion");
        assert_eq!(plain().clean("all-purpose flour"), "allpurpose flour");
    }

    #[test]
    fn test_synonym_lookup_applies_after_cleaning() {
        let normalizer = IngredientNormalizer::default();
        assert_eq!(normalizer.canonical_key("1 onion, diced"), "onions");
        assert_eq!(normalizer.canonical_key("2 cloves garlic, minced"), "garlic");
        assert_eq!(plain().canonical_key("1 onion, diced"), "onion");
    }

    #[test]
    fn test_groups_sorted_and_members_in_input_order() {
        let groups = IngredientNormalizer::default().normalize(&[
            "1 tsp salt",
            "2 cups flour",
            "sea salt",
            "1 cup plain flour",
        ]);
        let keys: Vec<&str> = groups.iter().map(|g| g.canonical_key.as_str()).collect();
        assert_eq!(keys, vec!["flour", "salt"]);
        assert_eq!(groups[0].members, vec!["2 cups flour", "1 cup plain flour"]);
        assert_eq!(groups[1].members, vec!["1 tsp salt", "sea salt"]);
    }

    #[test]
    fn test_olive_oil_variants_share_one_group() {
        let groups = IngredientNormalizer::default()
            .normalize(&["1 tbsp olive oil", "2 tbsp extra virgin olive oil"]);
        assert_eq!(
            groups,
            vec![IngredientGroup {
                canonical_key: "olive oil".to_string(),
                members: vec![
                    "1 tbsp olive oil".to_string(),
                    "2 tbsp extra virgin olive oil".to_string()
                ],
            }]
        );
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let groups = plain().normalize(&["", "   ", "1 lemon"]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec!["1 lemon"]);
    }

    #[test]
    fn test_custom_synonym_entry() {
        let table = SynonymTable::empty().with_entry("Gochujang Paste", "gochujang");
        let normalizer = IngredientNormalizer::new(table);
        assert_eq!(normalizer.canonical_key("2 tbsp gochujang paste"), "gochujang");
    }
}
