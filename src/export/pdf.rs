//! Minimal PDF 1.5 shopping list
//!
//! One Helvetica text block per page, laid out with the same lines as the
//! text export. Glyphs are drawn in WinAnsi, so characters outside it show
//! as `?`, but every line also carries its exact text as a UTF-16
//! `/ActualText` span. Copy-paste and [`read_back`] use that text.
//! Lines wider than the page wrap onto indented continuation lines, which
//! are marked as artifacts.

use lazy_static::lazy_static;
use regex::Regex;

use super::{text, ExportRow, LIST_TITLE};
use crate::errors::RecipeError;
use crate::normalizer::IngredientGroup;

/// Drawn lines on one page, the title included
pub const LINES_PER_PAGE: usize = 50;

/// Characters per drawn line before wrapping
pub const WRAP_COLUMNS: usize = 80;

const CONTINUATION: &str = "      ";

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN_LEFT: u32 = 50;
const FIRST_BASELINE: u32 = 800;
const FONT_SIZE: u32 = 11;
const TITLE_SIZE: u32 = 16;
const LEADING: u32 = 14;

lazy_static! {
    static ref ACTUAL_TEXT: Regex =
        Regex::new(r"(?m)^/Span << /ActualText <FEFF([0-9A-Fa-f]*)> >> BDC \(")
            .expect("actual text pattern should be valid");
}

/// WinAnsi code for characters outside Latin-1 that Helvetica can draw
fn win_ansi(c: char) -> Option<u8> {
    let code = match c {
        '€' => 0x80,
        '‚' => 0x82,
        '„' => 0x84,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        'œ' => 0x9C,
        'Œ' => 0x8C,
        c if c.is_ascii() || ('\u{A0}'..='\u{FF}').contains(&c) => c as u32 as u8,
        _ => return None,
    };
    Some(code)
}

/// PDF literal string body for drawing, with `\`, `(` and `)` escaped
fn literal(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            '\r' | '\n' => out.push(b' '),
            c => out.push(win_ansi(c).unwrap_or(b'?')),
        }
    }
    out
}

/// UTF-16BE hex string body, byte order mark included
fn utf16_hex(text: &str) -> String {
    let mut out = String::from("FEFF");
    for unit in text.encode_utf16() {
        out.push_str(&format!("{unit:04X}"));
    }
    out
}

fn decode_utf16_hex(hex: &str) -> Result<String, RecipeError> {
    if hex.len() % 4 != 0 {
        return Err(RecipeError::Export(format!("truncated UTF-16 text '{hex}'")));
    }
    let units = (0..hex.len())
        .step_by(4)
        .map(|at| u16::from_str_radix(&hex[at..at + 4], 16))
        .collect::<Result<Vec<u16>, _>>()
        .map_err(|e| RecipeError::Export(format!("bad UTF-16 text: {e}")))?;
    String::from_utf16(&units).map_err(|e| RecipeError::Export(format!("bad UTF-16 text: {e}")))
}

/// One drawn line; `actual` is set on the first piece of a source line
struct DrawnLine {
    shown: String,
    actual: Option<String>,
}

/// Split a line into pieces of at most [`WRAP_COLUMNS`] characters
///
/// Breaks at whitespace; words longer than a line are cut.
fn wrap(line: &str) -> Vec<String> {
    if line.chars().count() <= WRAP_COLUMNS {
        return vec![line.to_string()];
    }

    let body = line.trim_start();
    let mut pieces = Vec::new();
    let mut current = line[..line.len() - body.len()].to_string();
    let mut has_word = false;

    for word in body.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for chunk in chars.chunks(WRAP_COLUMNS - CONTINUATION.len()) {
            let needed = chunk.len() + usize::from(has_word);
            if has_word && current.chars().count() + needed > WRAP_COLUMNS {
                pieces.push(std::mem::replace(&mut current, CONTINUATION.to_string()));
                has_word = false;
            }
            if has_word {
                current.push(' ');
            }
            current.extend(chunk);
            has_word = true;
        }
    }
    pieces.push(current);
    pieces
}

fn layout(content: &str) -> Vec<DrawnLine> {
    content
        .lines()
        .flat_map(|line| {
            wrap(line).into_iter().enumerate().map(move |(i, shown)| DrawnLine {
                shown,
                actual: (i == 0).then(|| line.to_string()),
            })
        })
        .collect()
}

fn shown_line(stream: &mut Vec<u8>, line: &DrawnLine) {
    match &line.actual {
        Some(actual) => stream.extend_from_slice(
            format!("/Span << /ActualText <{}> >> BDC (", utf16_hex(actual)).as_bytes(),
        ),
        None => stream.extend_from_slice(b"/Artifact BMC ("),
    }
    stream.extend(literal(&line.shown));
    stream.extend_from_slice(b") Tj EMC T*\n");
}

/// Content stream for one page of lines
fn page_stream(lines: &[DrawnLine], with_title: bool) -> Vec<u8> {
    let mut stream = format!(
        "BT\n{LEADING} TL\n{MARGIN_LEFT} {FIRST_BASELINE} Td\n"
    )
    .into_bytes();
    if with_title {
        stream.extend_from_slice(format!("/F1 {TITLE_SIZE} Tf\n").as_bytes());
        shown_line(
            &mut stream,
            &DrawnLine {
                shown: LIST_TITLE.to_string(),
                actual: Some(LIST_TITLE.to_string()),
            },
        );
    }
    stream.extend_from_slice(format!("/F1 {FONT_SIZE} Tf\n").as_bytes());
    for line in lines {
        shown_line(&mut stream, line);
    }
    stream.extend_from_slice(b"ET");
    stream
}

struct PdfWriter {
    buffer: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        Self {
            buffer: b"%PDF-1.5\n%\xE2\xE3\xCF\xD3\n".to_vec(),
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, body: &[u8]) {
        self.offsets.push(self.buffer.len());
        let number = self.offsets.len();
        self.buffer
            .extend_from_slice(format!("{number} 0 obj\n").as_bytes());
        self.buffer.extend_from_slice(body);
        self.buffer.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, content: &[u8]) {
        let mut body = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(b"\nendstream");
        self.object(&body);
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_at = self.buffer.len();
        let count = self.offsets.len() + 1;
        let mut xref = format!("xref\n0 {count}\n0000000000 65535 f \n");
        for offset in &self.offsets {
            xref.push_str(&format!("{offset:010} 00000 n \n"));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {count} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n"
        ));
        self.buffer.extend_from_slice(xref.as_bytes());
        self.buffer
    }
}

pub fn render(groups: &[IngredientGroup]) -> Vec<u8> {
    let lines = layout(&text::render(groups));

    // The title takes the first line of the first page
    let mut pages: Vec<&[DrawnLine]> = Vec::new();
    let first_len = lines.len().min(LINES_PER_PAGE - 1);
    pages.push(&lines[..first_len]);
    pages.extend(lines[first_len..].chunks(LINES_PER_PAGE));

    let page_count = pages.len();
    // Objects: 1 catalog, 2 page tree, 3 font, then a page and its content per page
    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect();

    let mut pdf = PdfWriter::new();
    pdf.object(b"<< /Type /Catalog /Pages 2 0 R /MarkInfo << /Marked true >> >>");
    pdf.object(
        format!(
            "<< /Type /Pages /Kids [{}] /Count {page_count} >>",
            kids.join(" ")
        )
        .as_bytes(),
    );
    pdf.object(b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>");

    for (i, page_lines) in pages.iter().enumerate() {
        let contents = 5 + 2 * i;
        pdf.object(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {contents} 0 R >>"
            )
            .as_bytes(),
        );
        pdf.stream(&page_stream(page_lines, i == 0));
    }
    pdf.finish()
}

pub fn read_back(bytes: &[u8]) -> Result<Vec<ExportRow>, RecipeError> {
    if !bytes.starts_with(b"%PDF-") {
        return Err(RecipeError::Export("not a PDF document".to_string()));
    }

    // Latin-1 maps every byte to the char with the same code point
    let latin1: String = bytes.iter().map(|&b| b as char).collect();
    let mut lines = ACTUAL_TEXT
        .captures_iter(&latin1)
        .map(|captures| decode_utf16_hex(&captures[1]));

    match lines.next().transpose()? {
        Some(title) if title == LIST_TITLE => {}
        _ => {
            return Err(RecipeError::Export(
                "document has no shopping list title".to_string(),
            ))
        }
    }
    let body = lines.collect::<Result<Vec<String>, _>>()?;
    text::read_back(&body.join("\n"))
}
