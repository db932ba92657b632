//! SpreadsheetML 2003 workbook, readable by Excel and LibreOffice

use lazy_static::lazy_static;
use regex::Regex;

use super::{rows, ExportRow, LIST_TITLE};
use crate::errors::RecipeError;
use crate::normalizer::IngredientGroup;

lazy_static! {
    static ref ROW: Regex = Regex::new(r"(?s)<Row>(.*?)</Row>").expect("row pattern should be valid");
    static ref DATA: Regex = Regex::new(r#"(?s)<Data ss:Type="String">(.*?)</Data>"#)
        .expect("data pattern should be valid");
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn row(cells: [&str; 2]) -> String {
    let cells: String = cells
        .iter()
        .map(|cell| format!("<Cell><Data ss:Type=\"String\">{}</Data></Cell>", escape(cell)))
        .collect();
    format!("   <Row>{cells}</Row>\n")
}

pub fn render(groups: &[IngredientGroup]) -> String {
    let mut out = String::from(concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
        "<?mso-application progid=\"Excel.Sheet\"?>\n",
        "<Workbook xmlns=\"urn:schemas-microsoft-com:office:spreadsheet\"\n",
        " xmlns:ss=\"urn:schemas-microsoft-com:office:spreadsheet\">\n",
    ));
    out.push_str(&format!(" <Worksheet ss:Name=\"{}\">\n  <Table>\n", escape(LIST_TITLE)));
    out.push_str(&row(["Group", "Item"]));
    for (group, item) in rows(groups) {
        out.push_str(&row([&group, &item]));
    }
    out.push_str("  </Table>\n </Worksheet>\n</Workbook>\n");
    out
}

pub fn read_back(content: &str) -> Result<Vec<ExportRow>, RecipeError> {
    if !content.contains("<Workbook") {
        return Err(RecipeError::Export("not a SpreadsheetML workbook".to_string()));
    }

    let mut parsed = Vec::new();
    for (idx, captures) in ROW.captures_iter(content).enumerate() {
        let cells: Vec<String> = DATA
            .captures_iter(&captures[1])
            .map(|cell| unescape(&cell[1]))
            .collect();
        if idx == 0 {
            continue;
        }
        match <[String; 2]>::try_from(cells) {
            Ok([group, item]) => parsed.push((group, item)),
            Err(cells) => {
                return Err(RecipeError::Export(format!(
                    "row {}: expected 2 cells, found {}",
                    idx + 1,
                    cells.len()
                )))
            }
        }
    }
    Ok(parsed)
}
