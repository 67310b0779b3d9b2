use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::UTF_16BE;
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use crate::error::ExtractError;
use crate::model::Fragment;
use crate::options::PageSelection;

/// `TJ` adjustments below this (thousandths of an em) read as a word gap.
const TJ_SPACE_THRESHOLD: f64 = -100.0;

fn looks_decoding_broken(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();

    replacement * 8 > total || control * 5 > total
}

/// Decodes a string operand, retrying as UTF-16BE when the font encoding
/// yields garbage.
fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    let has_bom = bytes.starts_with(&[0xFE, 0xFF]);
    let wide_encoding = encoding.is_some_and(|name| {
        let lower = name.to_ascii_lowercase();
        ["utf16", "ucs2", "identity-h", "unicode"]
            .iter()
            .any(|hint| lower.contains(hint))
    });

    if has_bom || wide_encoding {
        let payload = if has_bom { &bytes[2..] } else { bytes };
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(payload);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    String::from_utf8_lossy(bytes).into_owned()
}

fn number(operand: &Object) -> Option<f64> {
    match operand {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

/// Affine matrix `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values = operands.iter().map(number).collect::<Option<Vec<_>>>()?;
        let [a, b, c, d, e, f] = values.as_slice() else {
            return None;
        };
        Some(Self {
            a: *a,
            b: *b,
            c: *c,
            d: *d,
            e: *e,
            f: *f,
        })
    }

    fn translation(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// `self × other`.
    fn then(self, other: Self) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn origin(self) -> (f64, f64) {
        (self.e, self.f)
    }
}

#[derive(Debug, Default)]
struct Run {
    text: String,
    x: f64,
    y: f64,
}

/// Text state while walking one page's content stream.
struct PageWalker<'a> {
    page: u32,
    encodings: BTreeMap<Vec<u8>, &'a str>,
    encoding: Option<&'a str>,
    ctm: Matrix,
    saved: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    leading: f64,
    run: Run,
    fragments: Vec<Fragment>,
}

impl<'a> PageWalker<'a> {
    fn new(page: u32, encodings: BTreeMap<Vec<u8>, &'a str>) -> Self {
        Self {
            page,
            encodings,
            encoding: None,
            ctm: Matrix::IDENTITY,
            saved: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            leading: 0.0,
            run: Run::default(),
            fragments: Vec::new(),
        }
    }

    fn flush(&mut self) {
        let run = std::mem::take(&mut self.run);
        let text = run.text.trim();
        if !text.is_empty() {
            self.fragments
                .push(Fragment::new(text, run.x, run.y, self.page));
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.flush();
        self.line_matrix = Matrix::translation(tx, ty).then(self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn show(&mut self, operands: &[Object]) {
        if self.run.text.is_empty() {
            let (x, y) = self.text_matrix.then(self.ctm).origin();
            self.run.x = x;
            self.run.y = y;
        }
        let mut text = std::mem::take(&mut self.run.text);
        collect_text(&mut text, self.encoding, operands);
        self.run.text = text;
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "q" => self.saved.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.saved.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    self.ctm = matrix.then(self.ctm);
                }
            }
            "BT" => {
                self.flush();
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "ET" => self.flush(),
            "Tf" => {
                if let Some(font_name) = operands.first().and_then(|operand| operand.as_name().ok())
                {
                    self.encoding = self.encodings.get(font_name).copied();
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    self.leading = leading;
                }
            }
            "Tm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    self.flush();
                    self.line_matrix = matrix;
                    self.text_matrix = matrix;
                }
            }
            "Td" | "TD" => {
                if let [tx, ty] = operands
                    && let (Some(tx), Some(ty)) = (number(tx), number(ty))
                {
                    if operator == "TD" {
                        self.leading = -ty;
                    }
                    self.move_line(tx, ty);
                }
            }
            "T*" => self.next_line(),
            "Tj" | "TJ" => self.show(operands),
            "'" => {
                self.next_line();
                self.show(operands);
            }
            "\"" => {
                self.next_line();
                self.show(operands.get(2..).unwrap_or_default());
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Fragment> {
        self.flush();
        self.fragments
    }
}

fn collect_text(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
    for operand in operands {
        match operand {
            Object::String(bytes, _) => {
                text.push_str(&decode_pdf_bytes(encoding, bytes));
            }
            Object::Array(items) => {
                collect_text(text, encoding, items);
            }
            Object::Integer(_) | Object::Real(_) => {
                if number(operand).is_some_and(|adjust| adjust < TJ_SPACE_THRESHOLD)
                    && !text.ends_with(' ')
                {
                    text.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn page_fragments(
    document: &Document,
    page_no: u32,
    page_id: ObjectId,
) -> Result<Vec<Fragment>, ExtractError> {
    let content_error = |error: lopdf::Error| ExtractError::PdfContent {
        page: page_no,
        message: error.to_string(),
    };

    let raw_content = document.get_page_content(page_id).map_err(content_error)?;
    let content = Content::decode(&raw_content).map_err(content_error)?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut walker = PageWalker::new(page_no, encodings);
    for operation in &content.operations {
        walker.apply(operation.operator.as_str(), &operation.operands);
    }
    Ok(walker.finish())
}

/// Positioned text of every selected page, in page then content order.
pub(crate) fn read_fragments(
    document: &Document,
    page_selection: Option<&PageSelection>,
) -> Result<Vec<Fragment>, ExtractError> {
    let mut fragments = Vec::new();
    let mut selected = 0_usize;

    for (page_no, page_id) in document.get_pages() {
        if page_selection.is_some_and(|selection| !selection.contains(page_no)) {
            continue;
        }
        selected += 1;

        let page = page_fragments(document, page_no, page_id)?;
        tracing::debug!(page = page_no, fragments = page.len(), "page decoded");
        fragments.extend(page);
    }

    if selected == 0 {
        return Err(ExtractError::NoPagesSelected);
    }

    Ok(fragments)
}

pub fn read_fragments_from_bytes(
    input_pdf: &[u8],
    page_selection: Option<&PageSelection>,
) -> Result<Vec<Fragment>, ExtractError> {
    let document = Document::load_mem(input_pdf)?;
    read_fragments(&document, page_selection)
}

pub fn read_fragments_from_path(
    input_pdf: &Path,
    page_selection: Option<&PageSelection>,
) -> Result<Vec<Fragment>, ExtractError> {
    let document = Document::load(input_pdf)?;
    read_fragments(&document, page_selection)
}
