//! Plain text shopping list

use super::ExportRow;
use crate::errors::RecipeError;
use crate::normalizer::IngredientGroup;

const ITEM_PREFIX: &str = "  - ";

pub fn render(groups: &[IngredientGroup]) -> String {
    let mut out = String::new();
    for group in groups {
        out.push_str(&group.canonical_key);
        out.push_str(":\n");
        for member in &group.members {
            out.push_str(ITEM_PREFIX);
            out.push_str(member);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

pub fn read_back(content: &str) -> Result<Vec<ExportRow>, RecipeError> {
    let mut rows = Vec::new();
    let mut group: Option<String> = None;

    for (number, line) in content.lines().enumerate() {
        if let Some(item) = line.strip_prefix(ITEM_PREFIX) {
            let key = group.clone().ok_or_else(|| {
                RecipeError::Export(format!("line {}: item outside of a group", number + 1))
            })?;
            rows.push((key, item.to_string()));
        } else if let Some(key) = line.strip_suffix(':') {
            group = Some(key.to_string());
        } else if !line.trim().is_empty() {
            return Err(RecipeError::Export(format!(
                "line {}: unexpected text '{line}'",
                number + 1
            )));
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let groups = vec![IngredientGroup {
            canonical_key: "eggs".to_string(),
            members: vec!["2 eggs".to_string(), "1 egg".to_string()],
        }];
        assert_eq!(render(&groups), "eggs:\n  - 2 eggs\n  - 1 egg\n\n");
    }

    #[test]
    fn test_item_without_group_is_rejected() {
        assert!(read_back("  - orphan\n").is_err());
        assert!(read_back("eggs:\nstray\n").is_err());
    }
}
