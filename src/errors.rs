//! # Recipe Error Types Module
//!
//! This module defines the error taxonomy of the recipe pipeline. None of these
//! errors is fatal: every failure path ends in an empty collection, a `None`,
//! or a filtered-out record.

/// Custom error types for recipe operations
#[derive(Debug, Clone, PartialEq)]
pub enum RecipeError {
    /// Network failure, timeout, non-2xx status or undecodable body from a source
    SourceUnavailable(String),
    /// A detail lookup produced nothing usable
    RecordUnresolvable(String),
    /// A source record missing required fields
    MalformedRecord(String),
    /// The filter stage kept no candidates
    NoMatches,
    /// Unsupported export format or failed write
    Export(String),
}

impl std::fmt::Display for RecipeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipeError::SourceUnavailable(msg) => write!(f, "Source unavailable: {msg}"),
            RecipeError::RecordUnresolvable(msg) => write!(f, "Recipe unavailable: {msg}"),
            RecipeError::MalformedRecord(msg) => write!(f, "Malformed record: {msg}"),
            RecipeError::NoMatches => write!(f, "No matching recipes found"),
            RecipeError::Export(msg) => write!(f, "Export error: {msg}"),
        }
    }
}

impl std::error::Error for RecipeError {}

impl From<reqwest::Error> for RecipeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RecipeError::SourceUnavailable(format!("request timed out: {err}"))
        } else if err.is_decode() {
            RecipeError::SourceUnavailable(format!("malformed payload: {err}"))
        } else {
            RecipeError::SourceUnavailable(err.to_string())
        }
    }
}

impl From<std::io::Error> for RecipeError {
    fn from(err: std::io::Error) -> Self {
        RecipeError::Export(err.to_string())
    }
}

impl RecipeError {
    /// Localization key used when the error has to be shown to an end user
    pub fn message_key(&self) -> &'static str {
        match self {
            RecipeError::SourceUnavailable(_) => "error-source-unavailable",
            RecipeError::RecordUnresolvable(_) => "error-recipe-unavailable",
            RecipeError::MalformedRecord(_) => "error-recipe-unavailable",
            RecipeError::NoMatches => "no-results",
            RecipeError::Export(_) => "export-failed",
        }
    }
}
