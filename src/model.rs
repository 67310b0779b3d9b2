use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// A positioned text run. `y` grows upward, pages are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub page: u32,
}

impl Fragment {
    #[must_use]
    pub fn new(text: impl Into<String>, x: f64, y: f64, page: u32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            page,
        }
    }

    /// True when `self` lies below `reference` in reading order.
    #[must_use]
    pub fn is_below(&self, reference: &Fragment) -> bool {
        self.page > reference.page || (self.page == reference.page && self.y < reference.y)
    }
}

/// Fragments sharing a vertical band, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<'a> {
    fragments: Vec<&'a Fragment>,
}

impl<'a> Row<'a> {
    pub(crate) fn new(mut fragments: Vec<&'a Fragment>) -> Self {
        fragments.sort_by(|left, right| left.x.total_cmp(&right.x));
        Self { fragments }
    }

    #[must_use]
    pub fn fragments(&self) -> &[&'a Fragment] {
        &self.fragments
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|fragment| fragment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Every page the row has fragments on.
    ///
    /// Rows are grouped by height alone, so an overflow cell printed at the
    /// same height on a later page makes the row span both pages.
    #[must_use]
    pub fn pages(&self) -> BTreeSet<u32> {
        self.fragments.iter().map(|fragment| fragment.page).collect()
    }

    /// True when the two rows have no page in common.
    #[must_use]
    pub fn is_on_other_pages(&self, other: &Row<'_>) -> bool {
        self.pages().is_disjoint(&other.pages())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderPosition {
    pub name: String,
    pub x: f64,
    pub page: u32,
}

impl HeaderPosition {
    #[must_use]
    pub fn new(name: impl Into<String>, x: f64, page: u32) -> Self {
        Self {
            name: name.into(),
            x,
            page,
        }
    }
}

impl From<&Fragment> for HeaderPosition {
    fn from(fragment: &Fragment) -> Self {
        Self::new(fragment.text.trim(), fragment.x, fragment.page)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Numeric(f64),
    Text(String),
}

impl CellValue {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Numeric(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Numeric(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

pub type ParsedRow = BTreeMap<String, CellValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub rows: Vec<ParsedRow>,
    pub detected_week_number: Option<u32>,
}
