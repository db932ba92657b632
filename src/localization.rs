//! # Localization Module
//!
//! Fluent-based message lookup for the supported interface languages.
//! Each language lives in `{locales_dir}/{lang}/main.ftl`.
//!
//! Lookups never fail: an unsupported language falls back to English, and a
//! key missing from both the requested language and English comes back as the
//! key itself.

use anyhow::{Context, Result};
use fluent_bundle::{FluentArgs, FluentBundle, FluentResource, FluentValue};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use unic_langid::LanguageIdentifier;

/// Languages with a translation file
pub const SUPPORTED_LANGUAGES: [&str; 5] = ["en", "es", "fr", "de", "fi"];

pub const DEFAULT_LANGUAGE: &str = "en";

/// Map a locale code such as `fr-CA` or `de_DE.UTF-8` onto a supported language
///
/// # Examples
///
/// ```rust
/// use recipe_finder::localization::detect_language;
///
/// assert_eq!(detect_language("fr-CA"), "fr");
/// assert_eq!(detect_language("de_DE.UTF-8"), "de");
/// assert_eq!(detect_language("ja"), "en");
/// ```
pub fn detect_language(code: &str) -> &'static str {
    let primary = code
        .split(['-', '_', '.'])
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();
    SUPPORTED_LANGUAGES
        .into_iter()
        .find(|lang| *lang == primary)
        .unwrap_or(DEFAULT_LANGUAGE)
}

pub fn is_supported(lang: &str) -> bool {
    SUPPORTED_LANGUAGES.iter().any(|supported| *supported == lang)
}

/// Localization manager holding one Fluent bundle per loaded language
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Load every supported language found under `locales_dir`
    ///
    /// Missing files are skipped with a warning; a file with syntax errors is
    /// an error.
    pub fn new(locales_dir: &Path) -> Result<Self> {
        let mut bundles = HashMap::new();

        for lang in SUPPORTED_LANGUAGES {
            let path = locales_dir.join(lang).join("main.ftl");
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("No translations for '{lang}' at {}: {e}", path.display());
                    continue;
                }
            };
            let bundle = Self::create_bundle(lang, content)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            bundles.insert(lang.to_string(), bundle);
        }

        debug!("Loaded {} localization bundles", bundles.len());
        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(lang: &str, content: String) -> Result<FluentBundle<FluentResource>> {
        let locale: LanguageIdentifier = lang.parse()?;
        let mut bundle = FluentBundle::new(vec![locale]);
        // Plain terminal output, no bidi isolation marks around arguments
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(content)
            .map_err(|(_, errors)| anyhow::anyhow!("{} syntax errors", errors.len()))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow::anyhow!("{} conflicting messages", errors.len()))?;
        Ok(bundle)
    }

    /// Languages actually loaded
    pub fn loaded_languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.bundles.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }

    fn format(
        bundle: &FluentBundle<FluentResource>,
        key: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> Option<String> {
        let pattern = bundle.get_message(key)?.value()?;
        let fluent_args = args.map(|args| {
            FluentArgs::from_iter(args.iter().map(|(k, v)| (*k, FluentValue::from(*v))))
        });

        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, fluent_args.as_ref(), &mut errors);
        if !errors.is_empty() {
            debug!("Formatting '{key}' reported {} errors", errors.len());
        }
        Some(value.into_owned())
    }

    /// Get a localized message
    pub fn get_message(&self, key: &str, lang: &str, args: Option<&HashMap<&str, &str>>) -> String {
        let requested = self.bundles.get(lang);
        let english = self.bundles.get(DEFAULT_LANGUAGE);

        requested
            .and_then(|bundle| Self::format(bundle, key, args))
            .or_else(|| english.and_then(|bundle| Self::format(bundle, key, args)))
            .unwrap_or_else(|| key.to_string())
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, lang: &str, args: &[(&str, &str)]) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message(key, lang, Some(&args_map))
    }

    /// Shorthand for a message without arguments
    pub fn t(&self, key: &str, lang: &str) -> String {
        self.get_message(key, lang, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager_with(files: &[(&str, &str)]) -> (TempDir, LocalizationManager) {
        let dir = TempDir::new().unwrap();
        for (lang, content) in files {
            let lang_dir = dir.path().join(lang);
            fs::create_dir_all(&lang_dir).unwrap();
            fs::write(lang_dir.join("main.ftl"), content).unwrap();
        }
        let manager = LocalizationManager::new(dir.path()).unwrap();
        (dir, manager)
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("FI"), "fi");
        assert_eq!(detect_language("es_MX"), "es");
        assert_eq!(detect_language(""), "en");
    }

    #[test]
    fn test_fallbacks() {
        let (_dir, manager) = manager_with(&[
            ("en", "greeting = Hello\nonly-en = English only\n"),
            ("fr", "greeting = Bonjour\n"),
        ]);
        assert_eq!(manager.t("greeting", "fr"), "Bonjour");
        assert_eq!(manager.t("only-en", "fr"), "English only");
        assert_eq!(manager.t("greeting", "xx"), "Hello");
        assert_eq!(manager.t("missing-key", "fr"), "missing-key");
        assert_eq!(manager.loaded_languages(), vec!["en", "fr"]);
    }

    #[test]
    fn test_arguments_without_isolation_marks() {
        let (_dir, manager) = manager_with(&[("en", "saved = Saved to { $path }\n")]);
        assert_eq!(
            manager.get_message_with_args("saved", "en", &[("path", "list.csv")]),
            "Saved to list.csv"
        );
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let dir = TempDir::new().unwrap();
        let lang_dir = dir.path().join("en");
        fs::create_dir_all(&lang_dir).unwrap();
        fs::write(lang_dir.join("main.ftl"), "broken = { \n").unwrap();
        assert!(LocalizationManager::new(dir.path()).is_err());
    }
}
