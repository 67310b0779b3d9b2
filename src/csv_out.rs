use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;

use crate::engine::ExtractionReport;
use crate::error::ExtractError;
use crate::model::Fragment;

fn write_rows<W: Write>(
    writer: &mut csv::Writer<W>,
    report: &ExtractionReport,
) -> Result<(), ExtractError> {
    writer.write_record(&report.columns)?;
    for row in &report.result.rows {
        let record = report
            .columns
            .iter()
            .map(|column| row.get(column).map(ToString::to_string).unwrap_or_default());
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_csv(
    path: &Path,
    report: &ExtractionReport,
    delimiter: u8,
) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    write_rows(&mut writer, report)
}

pub(crate) fn write_csv_to_string(
    report: &ExtractionReport,
    delimiter: u8,
) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    write_rows(&mut writer, report)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}

/// Dumps the raw fragment stream, one fragment per record.
pub fn write_fragments<W: Write>(
    target: W,
    fragments: &[Fragment],
    delimiter: u8,
) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_writer(target);
    writer.write_record(["page", "x", "y", "text"])?;
    for fragment in fragments {
        writer.write_record([
            fragment.page.to_string(),
            format!("{:.2}", fragment.x),
            format!("{:.2}", fragment.y),
            fragment.text.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
