use std::cmp::Ordering;

use crate::model::{Fragment, Row};

fn reading_order(left: &Fragment, right: &Fragment) -> Ordering {
    right
        .y
        .total_cmp(&left.y)
        .then(left.x.total_cmp(&right.x))
        .then(left.page.cmp(&right.page))
        .then_with(|| left.text.cmp(&right.text))
}

/// Clusters fragments into rows, top to bottom.
///
/// A row is anchored on the y of its first (highest) fragment; a fragment
/// further than `tolerance` below that reference starts the next row. Page
/// is ignored, so overflow cells printed at the same height on a later page
/// join the row they belong to.
pub fn group_rows<'a, I>(fragments: I, tolerance: f64) -> Vec<Row<'a>>
where
    I: IntoIterator<Item = &'a Fragment>,
{
    let mut sorted = fragments.into_iter().collect::<Vec<_>>();
    sorted.sort_by(|left, right| reading_order(left, right));

    let mut rows = Vec::new();
    let mut current: Vec<&Fragment> = Vec::new();
    let mut reference_y = f64::NAN;

    for fragment in sorted {
        if !current.is_empty() && (reference_y - fragment.y).abs() <= tolerance {
            current.push(fragment);
            continue;
        }

        if !current.is_empty() {
            rows.push(Row::new(std::mem::take(&mut current)));
        }
        reference_y = fragment.y;
        current.push(fragment);
    }

    if !current.is_empty() {
        rows.push(Row::new(current));
    }

    rows
}
