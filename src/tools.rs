//! # Recommended Tools
//!
//! Kitchen tools a recipe mentions, each with a shop link. The tool names
//! and links come from a JSON object in the data directory; a recipe
//! "mentions" a tool when its summary or steps contain the tool's name.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::models::RecipeDetail;
use crate::storage::load_json;

/// File name of the tool map inside the data directory
pub const TOOLS_FILE: &str = "tools_map.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendedTool {
    /// Display name, each word capitalized
    pub name: String,
    pub link: String,
}

/// Lowercased tool name to shop link
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCatalog {
    links: BTreeMap<String, String>,
}

impl ToolCatalog {
    /// Load the map; a missing or malformed file gives an empty catalog
    pub fn load(path: &Path) -> Self {
        let links: BTreeMap<String, String> = load_json(path);
        let catalog = links
            .into_iter()
            .fold(Self::default(), |catalog, (name, link)| catalog.with_tool(&name, &link));
        debug!("Loaded {} tools from {}", catalog.len(), path.display());
        catalog
    }

    pub fn with_tool(mut self, name: &str, link: &str) -> Self {
        let name = name.trim().to_lowercase();
        if !name.is_empty() {
            self.links.insert(name, link.trim().to_string());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Tools named in the recipe's summary or steps, in name order
    pub fn recommend(&self, detail: &RecipeDetail) -> Vec<RecommendedTool> {
        if self.links.is_empty() {
            return Vec::new();
        }

        let mut content = detail.plain_summary();
        for step in &detail.instruction_steps {
            content.push(' ');
            content.push_str(&step.text);
        }
        let content = content.to_lowercase();

        self.links
            .iter()
            .filter(|(name, _)| content.contains(name.as_str()))
            .map(|(name, link)| RecommendedTool {
                name: title_case(name),
                link: link.clone(),
            })
            .collect()
    }
}

fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
