//! # Shopping List Export
//!
//! Renders grouped ingredients into one of four file formats and parses
//! those files back into `(group, item)` rows.
//!
//! | Format        | Extensions      | Layout                                   |
//! |---------------|-----------------|------------------------------------------|
//! | `Text`        | `.txt`          | `key:` line, indented `- item` lines     |
//! | `Csv`         | `.csv`          | `Group,Item` header, one row per item    |
//! | `Spreadsheet` | `.xml`          | SpreadsheetML 2003 workbook              |
//! | `Document`    | `.pdf`          | PDF 1.5, Helvetica, paginated            |
//!
//! `.xlsx` is rejected: the spreadsheet format is XML, not an OOXML archive,
//! and Excel refuses XML content under that extension.

pub mod csv;
pub mod pdf;
pub mod spreadsheet;
pub mod text;

use std::fmt;
use std::path::Path;

use crate::errors::RecipeError;
use crate::normalizer::IngredientGroup;

/// One exported `(group, item)` pair
pub type ExportRow = (String, String);

/// Title written into formats that carry one
pub const LIST_TITLE: &str = "Shopping List";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Csv,
    Spreadsheet,
    Document,
}

impl ExportFormat {
    /// Pick the format from a file extension (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recipe_finder::export::ExportFormat;
    /// use std::path::Path;
    ///
    /// assert_eq!(ExportFormat::from_path(Path::new("list.XML")).unwrap(), ExportFormat::Spreadsheet);
    /// assert!(ExportFormat::from_path(Path::new("list.xlsx")).is_err());
    /// ```
    pub fn from_path(path: &Path) -> Result<Self, RecipeError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "txt" => Ok(ExportFormat::Text),
            "csv" => Ok(ExportFormat::Csv),
            "xml" => Ok(ExportFormat::Spreadsheet),
            "pdf" => Ok(ExportFormat::Document),
            other => Err(RecipeError::Export(format!(
                "unsupported export format '.{other}'"
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Spreadsheet => "xml",
            ExportFormat::Document => "pdf",
        }
    }

    /// Render grouped ingredients into file contents
    pub fn render(&self, groups: &[IngredientGroup]) -> Vec<u8> {
        match self {
            ExportFormat::Text => text::render(groups).into_bytes(),
            ExportFormat::Csv => csv::render(groups).into_bytes(),
            ExportFormat::Spreadsheet => spreadsheet::render(groups).into_bytes(),
            ExportFormat::Document => pdf::render(groups),
        }
    }

    /// Parse file contents produced by [`render`](Self::render)
    pub fn read_back(&self, bytes: &[u8]) -> Result<Vec<ExportRow>, RecipeError> {
        match self {
            ExportFormat::Text => text::read_back(utf8(bytes)?),
            ExportFormat::Csv => csv::read_back(utf8(bytes)?),
            ExportFormat::Spreadsheet => spreadsheet::read_back(utf8(bytes)?),
            ExportFormat::Document => pdf::read_back(bytes),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, RecipeError> {
    std::str::from_utf8(bytes).map_err(|e| RecipeError::Export(format!("not UTF-8 text: {e}")))
}

/// Flatten groups into rows, in group then member order
pub fn rows(groups: &[IngredientGroup]) -> Vec<ExportRow> {
    groups
        .iter()
        .flat_map(|group| {
            group
                .members
                .iter()
                .map(move |member| (group.canonical_key.clone(), member.clone()))
        })
        .collect()
}
