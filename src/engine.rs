use regex::Regex;
use serde::Serialize;

use crate::assemble::AssemblyRules;
use crate::error::ExtractError;
use crate::header::resolve_header;
use crate::markers::{detect_week_number, detect_week_number_in_text, find_section_anchor};
use crate::model::{Fragment, HeaderPosition, ParseResult};
use crate::options::LayoutProfile;
use crate::reconcile::{CanonicalMap, ColumnReconciler};
use crate::rows::group_rows;
use crate::section::SectionRules;
use crate::warning::{ExtractWarning, WarningCode};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionReport {
    pub result: ParseResult,
    /// Canonical column names in header order.
    pub columns: Vec<String>,
    pub warnings: Vec<ExtractWarning>,
    pub fragment_count: usize,
}

impl ExtractionReport {
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.result.rows.len()
    }
}

/// Rebuilds a table from positioned text.
///
/// `HeuristicLayout` is the anchor-and-geometry implementation; other
/// backends can be swapped in behind this trait.
pub trait LayoutEngine {
    fn reconstruct(&self, fragments: &[Fragment]) -> ExtractionReport;
}

fn compile(field: &'static str, pattern: &str) -> Result<Regex, ExtractError> {
    Regex::new(pattern).map_err(|source| ExtractError::InvalidPattern {
        field,
        pattern: pattern.to_string(),
        source,
    })
}

/// Canonical names ordered by page, then left to right.
fn column_order(positions: &[HeaderPosition], canonical: &CanonicalMap) -> Vec<String> {
    let mut ordered = positions.iter().collect::<Vec<_>>();
    ordered.sort_by(|left, right| {
        left.page
            .cmp(&right.page)
            .then(left.x.total_cmp(&right.x))
    });

    let mut columns: Vec<String> = Vec::new();
    for position in ordered {
        let name = canonical.resolve(&position.name);
        if !columns.iter().any(|column| column == name) {
            columns.push(name.to_string());
        }
    }
    columns
}

pub struct HeuristicLayout {
    week_pattern: Regex,
    header_anchor: Regex,
    tolerance: f64,
    section: SectionRules,
    assembly: AssemblyRules,
    reconciler: Box<dyn ColumnReconciler + Send + Sync>,
}

impl HeuristicLayout {
    pub fn new(profile: &LayoutProfile) -> Result<Self, ExtractError> {
        profile.validate()?;
        let terminators = profile
            .terminators
            .iter()
            .map(|pattern| compile("terminator", pattern))
            .collect::<Result<Vec<_>, _>>()?;
        let footers = profile
            .footers
            .iter()
            .map(|pattern| compile("footer", pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            week_pattern: compile("week", &profile.week_pattern)?,
            header_anchor: compile("header anchor", &profile.header_anchor)?,
            tolerance: profile.row_tolerance,
            section: SectionRules {
                anchor: compile("section anchor", &profile.section_anchor)?,
                terminators,
                totals_keyword: profile.totals_keyword.clone(),
                tolerance: profile.row_tolerance,
                policy: profile.totals_policy,
            },
            assembly: AssemblyRules {
                totals_keyword: profile.totals_keyword.clone(),
                footers,
            },
            reconciler: profile.reconcile.reconciler(),
        })
    }

    /// Replaces the reconciler chosen by the profile.
    #[must_use]
    pub fn with_reconciler<R>(mut self, reconciler: R) -> Self
    where
        R: ColumnReconciler + Send + Sync + 'static,
    {
        self.reconciler = Box::new(reconciler);
        self
    }

    /// Week lookup over unpositioned text, for documents without fragments.
    #[must_use]
    pub fn detect_week_in_text(&self, text: &str) -> Option<u32> {
        detect_week_number_in_text(text, &self.week_pattern)
    }
}

impl LayoutEngine for HeuristicLayout {
    fn reconstruct(&self, fragments: &[Fragment]) -> ExtractionReport {
        let mut report = ExtractionReport {
            fragment_count: fragments.len(),
            ..ExtractionReport::default()
        };

        report.result.detected_week_number = detect_week_number(fragments, &self.week_pattern);
        if report.result.detected_week_number.is_none() {
            report.warnings.push(ExtractWarning::new(
                WarningCode::WeekNumberMissing,
                "no week identifier found in the document",
            ));
        }

        let Some(anchor) = find_section_anchor(fragments, &self.section.anchor) else {
            report.warnings.push(ExtractWarning::new(
                WarningCode::SectionAnchorMissing,
                "section anchor not found; no rows extracted",
            ));
            return report;
        };

        let section = self.section.isolate_from(fragments, anchor);
        let rows = group_rows(section.iter().copied(), self.tolerance);
        tracing::debug!(
            anchor_page = anchor.page,
            fragments = section.len(),
            rows = rows.len(),
            "section isolated"
        );

        let Some(header) = resolve_header(&rows, &self.header_anchor) else {
            report.warnings.push(
                ExtractWarning::new(
                    WarningCode::HeaderRowMissing,
                    "no header row found below the section anchor",
                )
                .with_page(anchor.page),
            );
            return report;
        };

        let canonical = self.reconciler.reconcile(&header.positions);
        report.columns = column_order(&header.positions, &canonical);
        report.result.rows =
            self.assembly
                .assemble(&rows, header.data_start, &header.positions, &canonical);

        if report.result.rows.is_empty() {
            report.warnings.push(
                ExtractWarning::new(WarningCode::NoDataRows, "header found but no data rows")
                    .with_page(anchor.page),
            );
        }
        tracing::debug!(
            columns = report.columns.len(),
            rows = report.result.rows.len(),
            "rows assembled"
        );

        report
    }
}
