use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

pub const DEFAULT_ROW_TOLERANCE: f64 = 3.0;

/// What the section isolator keeps once a totals row has started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalsPolicy {
    /// Keep collecting until a terminator or the end of the stream.
    #[default]
    ContinueToTerminator,
    /// Keep the totals row band plus anything on later pages.
    TotalsBandAndLaterPages,
    /// Keep only the rest of the totals row.
    TotalsBandOnly,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ReconcileStrategy {
    #[default]
    Prefix,
    EditDistance {
        max_distance: usize,
    },
    AliasTable {
        aliases: BTreeMap<String, String>,
    },
}

/// Textual anchors and tolerances for one report layout.
///
/// Every pattern is a `regex` string. The defaults describe the weekly staff
/// capture report; a JSON file can override any subset of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutProfile {
    pub section_anchor: String,
    /// Must contain one capture group around the 4-6 digit week token.
    pub week_pattern: String,
    pub header_anchor: String,
    pub terminators: Vec<String>,
    pub footers: Vec<String>,
    pub totals_keyword: String,
    pub row_tolerance: f64,
    pub totals_policy: TotalsPolicy,
    pub reconcile: ReconcileStrategy,
}

impl Default for LayoutProfile {
    fn default() -> Self {
        Self {
            section_anchor: r"(?i)\bweek\s+to\s+date\b".to_string(),
            week_pattern: r"(?i)\bfiscal\s+week\s*:?\s*(\d{4,6})\b".to_string(),
            header_anchor: r"(?i)\bstaff\s+member\b".to_string(),
            terminators: vec![
                r"(?i)\bmonth\s+to\s+date\b".to_string(),
                r"(?i)\byear\s+to\s+date\b".to_string(),
            ],
            footers: vec![
                r"(?i)^page\s+\d+(\s+of\s+\d+)?$".to_string(),
                r"(?i)\bconfidential\b".to_string(),
                r"(?i)^report\s+generated\b".to_string(),
            ],
            totals_keyword: "Total".to_string(),
            row_tolerance: DEFAULT_ROW_TOLERANCE,
            totals_policy: TotalsPolicy::default(),
            reconcile: ReconcileStrategy::default(),
        }
    }
}

impl LayoutProfile {
    pub fn from_json_str(json: &str) -> Result<Self, ExtractError> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ExtractError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub(crate) fn validate(&self) -> Result<(), ExtractError> {
        if !self.row_tolerance.is_finite() || self.row_tolerance < 0.0 {
            return Err(ExtractError::InvalidOption(format!(
                "row_tolerance must be a non-negative number, got {}",
                self.row_tolerance
            )));
        }
        if self.totals_keyword.trim().is_empty() {
            return Err(ExtractError::InvalidOption(
                "totals_keyword cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl FromStr for PageSelection {
    type Err = ExtractError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = |message: String| ExtractError::InvalidPageSelection(message);

        let mut pages = BTreeSet::new();
        for token in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start: u32 = start
                    .trim()
                    .parse()
                    .map_err(|_| invalid(format!("invalid page range start: '{start}'")))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| invalid(format!("invalid page range end: '{end}'")))?;
                if start == 0 || end == 0 {
                    return Err(invalid("pages are 1-based".to_string()));
                }
                if end < start {
                    return Err(invalid(format!(
                        "invalid range '{token}': end is smaller than start"
                    )));
                }
                pages.extend(start..=end);
            } else {
                let page: u32 = token
                    .parse()
                    .map_err(|_| invalid(format!("invalid page number: '{token}'")))?;
                if page == 0 {
                    return Err(invalid("pages are 1-based".to_string()));
                }
                pages.insert(page);
            }
        }

        if pages.is_empty() {
            return Err(invalid("page selection cannot be empty".to_string()));
        }

        Ok(Self { pages })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub pages: Option<PageSelection>,
    pub profile: LayoutProfile,
    pub delimiter: u8,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pages: None,
            profile: LayoutProfile::default(),
            delimiter: b',',
        }
    }
}
