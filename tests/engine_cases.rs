mod common;

use pretty_assertions::assert_eq;
use weekly_report_extract::{
    CellValue, Fragment, HeuristicLayout, LayoutEngine, LayoutProfile, TotalsPolicy,
};

fn engine() -> HeuristicLayout {
    HeuristicLayout::new(&LayoutProfile::default()).expect("default profile compiles")
}

fn text(value: &str) -> Option<CellValue> {
    Some(CellValue::Text(value.to_string()))
}

fn number(value: f64) -> Option<CellValue> {
    Some(CellValue::Numeric(value))
}

#[test]
fn two_page_report_merges_overflow_column() {
    let fragments = common::to_fragments(&common::two_page_report());
    let report = engine().reconstruct(&fragments);

    assert_eq!(report.result.detected_week_number, Some(47));
    assert_eq!(
        report.columns,
        vec!["Staff Member", "Captured", "Total", "Pct Of Total"]
    );
    assert_eq!(report.result.rows.len(), 2);

    let alice = &report.result.rows[0];
    assert_eq!(alice.len(), 4);
    assert_eq!(alice.get("Staff Member").cloned(), text("Alice Smith"));
    assert_eq!(alice.get("Captured").cloned(), number(12.0));
    assert_eq!(alice.get("Total").cloned(), number(30.0));
    assert_eq!(alice.get("Pct Of Total").cloned(), number(40.0));

    let bob = &report.result.rows[1];
    assert_eq!(bob.len(), 4);
    assert_eq!(bob.get("Staff Member").cloned(), text("Bob"));
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
}

#[test]
fn week_is_null_without_week_phrase() {
    let mut pages = common::two_page_report();
    pages[0].retain(|(text, _, _)| !text.contains("Fiscal Week"));
    let report = engine().reconstruct(&common::to_fragments(&pages));
    assert_eq!(report.result.detected_week_number, None);
    assert_eq!(report.result.rows.len(), 2);
}

#[test]
fn repeated_value_in_truncated_column_is_kept_once() {
    let fragments = vec![
        Fragment::new("Week To Date", 50.0, 770.0, 1),
        Fragment::new("Staff Member", 50.0, 740.0, 1),
        Fragment::new("Pct O", 380.0, 740.0, 1),
        Fragment::new("Alice", 50.0, 720.0, 1),
        Fragment::new("41%", 380.0, 720.0, 1),
        Fragment::new("Pct Of Total", 60.0, 740.0, 2),
        Fragment::new("41%", 60.0, 720.0, 2),
    ];
    let report = engine().reconstruct(&fragments);
    assert_eq!(report.result.rows.len(), 1);
    assert_eq!(report.result.rows[0].get("Pct Of Total").cloned(), number(41.0));
    assert_eq!(report.columns, vec!["Staff Member", "Pct Of Total"]);
}

#[test]
fn header_continuation_on_lower_band_of_next_page() {
    let fragments = vec![
        Fragment::new("Week To Date", 50.0, 770.0, 1),
        Fragment::new("Staff Member", 50.0, 740.0, 1),
        Fragment::new("Captured", 200.0, 740.0, 1),
        Fragment::new("Alice", 50.0, 700.0, 1),
        Fragment::new("12", 200.0, 700.0, 1),
        Fragment::new("N PS", 40.0, 725.0, 2),
        Fragment::new("Avg Spend", 140.0, 725.0, 2),
        Fragment::new("61", 40.0, 700.0, 2),
        Fragment::new("£1,234", 140.0, 700.0, 2),
    ];
    let report = engine().reconstruct(&fragments);
    assert_eq!(
        report.columns,
        vec!["Staff Member", "Captured", "NPS", "Avg Spend"]
    );
    assert_eq!(report.result.rows.len(), 1);
    let alice = &report.result.rows[0];
    assert_eq!(alice.get("NPS").cloned(), number(61.0));
    assert_eq!(alice.get("Avg Spend").cloned(), number(1234.0));
    assert_eq!(alice.get("Captured").cloned(), number(12.0));
}

#[test]
fn overflow_cell_left_of_header_keeps_first_data_row() {
    let fragments = vec![
        Fragment::new("Week To Date", 50.0, 770.0, 1),
        Fragment::new("Staff Member", 50.0, 740.0, 1),
        Fragment::new("Captured", 200.0, 740.0, 1),
        Fragment::new("Alice", 50.0, 720.0, 1),
        Fragment::new("Smith", 90.0, 720.0, 1),
        Fragment::new("12", 200.0, 720.0, 1),
        Fragment::new("Bob", 50.0, 700.0, 1),
        Fragment::new("8", 200.0, 700.0, 1),
        Fragment::new("N PS", 40.0, 740.0, 2),
        Fragment::new("61", 40.0, 700.0, 2),
    ];
    let report = engine().reconstruct(&fragments);

    assert_eq!(report.columns, vec!["Staff Member", "Captured", "NPS"]);
    assert_eq!(report.result.rows.len(), 2);
    let alice = &report.result.rows[0];
    assert_eq!(alice.get("Staff Member").cloned(), text("Alice Smith"));
    assert_eq!(alice.get("Captured").cloned(), number(12.0));
    assert_eq!(alice.get("NPS"), None);
    let bob = &report.result.rows[1];
    assert_eq!(bob.get("Staff Member").cloned(), text("Bob"));
    assert_eq!(bob.get("NPS").cloned(), number(61.0));
}

#[test]
fn totals_rows_never_reach_the_output() {
    let fragments = common::to_fragments(&common::two_page_report());
    let report = engine().reconstruct(&fragments);
    assert!(report.result.rows.iter().all(|row| {
        row.get("Staff Member")
            .and_then(CellValue::as_text)
            .is_none_or(|name| !name.eq_ignore_ascii_case("total"))
    }));
}

#[test]
fn band_only_policy_still_yields_the_data_rows() {
    let profile = LayoutProfile {
        totals_policy: TotalsPolicy::TotalsBandOnly,
        ..LayoutProfile::default()
    };
    let fragments = common::to_fragments(&common::two_page_report());
    let report = HeuristicLayout::new(&profile)
        .expect("profile compiles")
        .reconstruct(&fragments);

    // Page 2 is cut off, so the overflow column is missing.
    assert_eq!(report.result.rows.len(), 2);
    assert_eq!(report.columns, vec!["Staff Member", "Captured", "Total", "Pct O"]);
    assert_eq!(report.result.rows[0].get("Pct O"), None);
}

#[test]
fn content_after_terminator_is_ignored() {
    let fragments = common::to_fragments(&common::two_page_report());
    let report = engine().reconstruct(&fragments);
    assert!(
        report
            .result
            .rows
            .iter()
            .all(|row| row.get("Staff Member").cloned() != text("Carol"))
    );
}
