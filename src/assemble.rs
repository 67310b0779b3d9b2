use std::collections::BTreeMap;

use regex::Regex;

use crate::columns::assign_column;
use crate::model::{CellValue, HeaderPosition, ParsedRow, Row};
use crate::reconcile::CanonicalMap;
use crate::section::starts_with_keyword;

const STRIPPED_SYMBOLS: [char; 4] = ['£', '$', '€', ','];

/// Turns cell text into a number when it reads as one.
///
/// Currency symbols, thousands separators and one trailing `%` are
/// ignored; anything else keeps the trimmed text.
#[must_use]
pub fn coerce_value(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    let stripped = trimmed
        .chars()
        .filter(|ch| !STRIPPED_SYMBOLS.contains(ch))
        .collect::<String>();
    let stripped = stripped.trim();
    let cleaned = stripped.strip_suffix('%').unwrap_or(stripped).trim_end();

    match cleaned.parse::<f64>() {
        Ok(value) if !cleaned.is_empty() && value.is_finite() => CellValue::Numeric(value),
        _ => CellValue::Text(trimmed.to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct AssemblyRules {
    pub totals_keyword: String,
    pub footers: Vec<Regex>,
}

impl AssemblyRules {
    fn is_excluded(&self, row: &Row<'_>) -> bool {
        let text = row.text();
        starts_with_keyword(&text, &self.totals_keyword)
            || row.fragments().iter().any(|fragment| {
                fragment
                    .text
                    .trim()
                    .eq_ignore_ascii_case(&self.totals_keyword)
            })
            || self.footers.iter().any(|footer| footer.is_match(text.trim()))
    }

    /// Builds one output row per surviving data row.
    #[must_use]
    pub fn assemble(
        &self,
        rows: &[Row<'_>],
        data_start: usize,
        headers: &[HeaderPosition],
        canonical: &CanonicalMap,
    ) -> Vec<ParsedRow> {
        rows.iter()
            .skip(data_start)
            .filter(|row| !self.is_excluded(row))
            .map(|row| collect_cells(row, headers, canonical))
            .filter(|cells| cells.values().any(|value| !value.trim().is_empty()))
            .map(|cells| {
                cells
                    .into_iter()
                    .map(|(name, value)| (name, coerce_value(&value)))
                    .collect()
            })
            .collect()
    }
}

fn collect_cells(
    row: &Row<'_>,
    headers: &[HeaderPosition],
    canonical: &CanonicalMap,
) -> BTreeMap<String, String> {
    let mut cells = BTreeMap::<String, String>::new();

    for fragment in row.fragments() {
        let text = fragment.text.trim();
        if text.is_empty() {
            continue;
        }
        let Some(header) = assign_column(fragment.x, fragment.page, headers) else {
            continue;
        };

        let name = canonical.resolve(&header.name);
        match cells.get_mut(name) {
            Some(existing) if existing.as_str() == text => {}
            Some(existing) => {
                existing.push(' ');
                existing.push_str(text);
            }
            None => {
                cells.insert(name.to_string(), text.to_string());
            }
        }
    }

    cells
}
