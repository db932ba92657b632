//! CSV shopping list with RFC 4180 quoting

use super::{rows, ExportRow};
use crate::errors::RecipeError;
use crate::normalizer::IngredientGroup;

const HEADER: [&str; 2] = ["Group", "Item"];

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn render(groups: &[IngredientGroup]) -> String {
    let mut out = format!("{},{}\r\n", HEADER[0], HEADER[1]);
    for (group, item) in rows(groups) {
        out.push_str(&quote(&group));
        out.push(',');
        out.push_str(&quote(&item));
        out.push_str("\r\n");
    }
    out
}

/// Split CSV content into records of fields
fn parse_records(content: &str) -> Result<Vec<Vec<String>>, RecipeError> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(RecipeError::Export("unterminated quoted field".to_string()));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

pub fn read_back(content: &str) -> Result<Vec<ExportRow>, RecipeError> {
    let mut records = parse_records(content)?.into_iter();
    match records.next() {
        Some(header) if header == HEADER => {}
        _ => return Err(RecipeError::Export("missing Group,Item header".to_string())),
    }

    records
        .enumerate()
        .map(|(idx, record)| match <[String; 2]>::try_from(record) {
            Ok([group, item]) => Ok((group, item)),
            Err(record) => Err(RecipeError::Export(format!(
                "row {}: expected 2 fields, found {}",
                idx + 2,
                record.len()
            ))),
        })
        .collect()
}
