use regex::Regex;

use crate::model::{HeaderPosition, Row};

const CURRENCY_AND_PERCENT: [char; 5] = ['£', '$', '€', '%', ','];

pub(crate) fn is_numeric(value: &str) -> bool {
    let cleaned = value
        .trim()
        .chars()
        .filter(|ch| !CURRENCY_AND_PERCENT.contains(ch))
        .collect::<String>();
    !cleaned.is_empty() && cleaned.parse::<f64>().is_ok_and(f64::is_finite)
}

fn non_numeric_ratio(row: &Row<'_>) -> f32 {
    if row.is_empty() {
        return 0.0;
    }

    let non_numeric = row
        .fragments()
        .iter()
        .filter(|fragment| !is_numeric(&fragment.text))
        .count();
    non_numeric as f32 / row.len() as f32
}

/// Header cells of the section and the index of its first data row.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLayout {
    pub positions: Vec<HeaderPosition>,
    pub data_start: usize,
}

/// Finds the header row and an optional overflow continuation after it.
///
/// The row right after the header counts as a continuation when it shares
/// no page with the header row and is mostly text; its cells become extra
/// header positions on their own page.
#[must_use]
pub fn resolve_header(rows: &[Row<'_>], header_anchor: &Regex) -> Option<HeaderLayout> {
    let header_index = rows
        .iter()
        .position(|row| header_anchor.is_match(&row.text()))?;
    let header_row = &rows[header_index];

    let mut positions = header_row
        .fragments()
        .iter()
        .map(|fragment| HeaderPosition::from(*fragment))
        .collect::<Vec<_>>();
    let mut data_start = header_index + 1;

    if let Some(next) = rows.get(data_start)
        && next.is_on_other_pages(header_row)
        && non_numeric_ratio(next) > 0.5
    {
        tracing::debug!(
            pages = ?next.pages(),
            cells = next.len(),
            "overflow header continuation"
        );
        positions.extend(
            next.fragments()
                .iter()
                .map(|fragment| HeaderPosition::from(*fragment)),
        );
        data_start += 1;
    }

    Some(HeaderLayout {
        positions,
        data_start,
    })
}
