//! Rebuilds the staff table of a weekly capture report from the positioned
//! text of its PDF.
//!
//! The report has no table structure, only glyph positions. The engine finds
//! the target section between a textual anchor and a terminator, groups
//! fragments into rows by height, resolves the header row (including header
//! cells that overflow onto a later page), unifies truncated column names and
//! assigns every cell to its nearest header on the same page.

pub mod assemble;
pub mod columns;
mod csv_out;
pub mod engine;
mod error;
pub mod header;
pub mod markers;
pub mod model;
pub mod options;
mod pdf_reader;
pub mod reconcile;
pub mod rows;
pub mod section;
mod warning;

use std::path::Path;

use lopdf::Document;

use crate::csv_out::{write_csv, write_csv_to_string};
use crate::pdf_reader::read_fragments;

pub use csv_out::write_fragments;
pub use engine::{ExtractionReport, HeuristicLayout, LayoutEngine};
pub use error::ExtractError;
pub use model::{CellValue, Fragment, HeaderPosition, ParseResult, ParsedRow};
pub use options::{ExtractOptions, LayoutProfile, PageSelection, ReconcileStrategy, TotalsPolicy};
pub use pdf_reader::{read_fragments_from_bytes, read_fragments_from_path};
pub use warning::{ExtractWarning, WarningCode as ExtractWarningCode};

fn reconstruct_document(
    document: &Document,
    plain_text: impl FnOnce() -> Option<String>,
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    let engine = HeuristicLayout::new(&options.profile)?;
    let fragments = read_fragments(document, options.pages.as_ref())?;
    let mut report = engine.reconstruct(&fragments);

    if fragments.is_empty() {
        report.warnings.push(ExtractWarning::new(
            warning::WarningCode::NoPositionedText,
            "no positioned text found; only the week number can be recovered",
        ));
        if report.result.detected_week_number.is_none()
            && let Some(week) = plain_text().and_then(|text| engine.detect_week_in_text(&text))
        {
            report.result.detected_week_number = Some(week);
            report
                .warnings
                .retain(|warning| warning.code != warning::WarningCode::WeekNumberMissing);
        }
    }

    Ok(report)
}

/// Parses a report held in memory.
pub fn parse_report_bytes(
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    let document = Document::load_mem(input_pdf)?;
    reconstruct_document(
        &document,
        || pdf_extract::extract_text_from_mem(input_pdf).ok(),
        options,
    )
}

pub fn parse_report_file(
    input_pdf: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    let document = Document::load(input_pdf)?;
    reconstruct_document(
        &document,
        || pdf_extract::extract_text(input_pdf).ok(),
        options,
    )
}

pub fn extract_report_to_csv(
    input_pdf: &Path,
    output_csv: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    let report = parse_report_file(input_pdf, options)?;
    write_csv(output_csv, &report, options.delimiter)?;
    Ok(report)
}

pub fn extract_report_bytes_to_csv_string(
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<(String, ExtractionReport), ExtractError> {
    let report = parse_report_bytes(input_pdf, options)?;
    let csv = write_csv_to_string(&report, options.delimiter)?;
    Ok((csv, report))
}
