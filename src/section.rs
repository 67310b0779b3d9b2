use regex::Regex;

use crate::model::Fragment;
use crate::options::TotalsPolicy;

/// Case-insensitive prefix test used for totals rows.
pub(crate) fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    let text = text.trim_start();
    text.get(..keyword.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(keyword))
}

/// Compiled bounds of the target section.
#[derive(Debug, Clone)]
pub struct SectionRules {
    pub anchor: Regex,
    pub terminators: Vec<Regex>,
    pub totals_keyword: String,
    pub tolerance: f64,
    pub policy: TotalsPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TotalsBoundary {
    page: u32,
    y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Keep,
    Skip,
    Stop,
}

impl TotalsPolicy {
    fn admit(self, boundary: TotalsBoundary, fragment: &Fragment, tolerance: f64) -> Admission {
        let in_band =
            fragment.page == boundary.page && (fragment.y - boundary.y).abs() <= tolerance;
        match self {
            Self::ContinueToTerminator => Admission::Keep,
            Self::TotalsBandAndLaterPages => {
                if in_band || fragment.page > boundary.page {
                    Admission::Keep
                } else {
                    Admission::Skip
                }
            }
            Self::TotalsBandOnly => {
                if in_band {
                    Admission::Keep
                } else if fragment.page > boundary.page {
                    Admission::Stop
                } else {
                    Admission::Skip
                }
            }
        }
    }
}

impl SectionRules {
    fn is_terminator(&self, fragment: &Fragment) -> bool {
        self.terminators
            .iter()
            .any(|terminator| terminator.is_match(&fragment.text))
    }

    fn begins_totals_row(&self, fragment: &Fragment, collected: &[&Fragment]) -> bool {
        starts_with_keyword(&fragment.text, &self.totals_keyword)
            && !collected.iter().any(|other| {
                other.page == fragment.page
                    && (other.y - fragment.y).abs() <= self.tolerance
                    && other.x < fragment.x
            })
    }

    /// Fragments of the section that follows `anchor`, in extraction order.
    ///
    /// Fragments above the anchor (earlier pages, or higher on the anchor's
    /// page) are skipped before the terminator test, so a terminator phrase
    /// printed above the section never closes it.
    #[must_use]
    pub fn isolate_from<'a>(&self, fragments: &'a [Fragment], anchor: &Fragment) -> Vec<&'a Fragment> {
        let mut section: Vec<&Fragment> = Vec::new();
        let mut boundary: Option<TotalsBoundary> = None;

        for fragment in fragments {
            if !fragment.is_below(anchor) {
                continue;
            }
            if self.is_terminator(fragment) {
                tracing::debug!(
                    page = fragment.page,
                    text = %fragment.text,
                    "section terminated"
                );
                break;
            }

            if let Some(boundary) = boundary {
                match self.policy.admit(boundary, fragment, self.tolerance) {
                    Admission::Keep => section.push(fragment),
                    Admission::Skip => {}
                    Admission::Stop => break,
                }
                continue;
            }

            if self.begins_totals_row(fragment, &section) {
                tracing::debug!(page = fragment.page, y = fragment.y, "totals boundary");
                boundary = Some(TotalsBoundary {
                    page: fragment.page,
                    y: fragment.y,
                });
            }
            section.push(fragment);
        }

        section
    }

    /// Locates the anchor and isolates its section; empty when there is none.
    #[must_use]
    pub fn isolate<'a>(&self, fragments: &'a [Fragment]) -> Vec<&'a Fragment> {
        crate::markers::find_section_anchor(fragments, &self.anchor)
            .map(|anchor| self.isolate_from(fragments, anchor))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use regex::Regex;

    use super::{SectionRules, starts_with_keyword};
    use crate::model::Fragment;
    use crate::options::{LayoutProfile, TotalsPolicy};

    fn rules(policy: TotalsPolicy) -> SectionRules {
        let profile = LayoutProfile::default();
        SectionRules {
            anchor: Regex::new(&profile.section_anchor).expect("compiles"),
            terminators: profile
                .terminators
                .iter()
                .map(|pattern| Regex::new(pattern).expect("compiles"))
                .collect(),
            totals_keyword: profile.totals_keyword,
            tolerance: profile.row_tolerance,
            policy,
        }
    }

    fn texts(section: &[&Fragment]) -> Vec<String> {
        section.iter().map(|fragment| fragment.text.clone()).collect()
    }

    fn report() -> Vec<Fragment> {
        vec![
            Fragment::new("Month To Date Summary", 50.0, 820.0, 1),
            Fragment::new("Week To Date", 50.0, 780.0, 1),
            Fragment::new("Staff Member", 50.0, 740.0, 1),
            Fragment::new("Captured", 200.0, 740.0, 1),
            Fragment::new("Total", 300.0, 740.0, 1),
            Fragment::new("Alice", 50.0, 720.0, 1),
            Fragment::new("12", 200.0, 720.0, 1),
            Fragment::new("Total", 50.0, 700.0, 1),
            Fragment::new("12", 200.0, 700.0, 1),
            Fragment::new("Note: excludes returns", 50.0, 660.0, 1),
            Fragment::new("40%", 420.0, 720.0, 2),
            Fragment::new("Month To Date", 50.0, 500.0, 2),
            Fragment::new("Bob", 50.0, 480.0, 2),
        ]
    }

    #[test]
    fn keyword_prefix_is_case_insensitive() {
        assert!(starts_with_keyword("TOTAL stores", "Total"));
        assert!(starts_with_keyword("  total", "Total"));
        assert!(!starts_with_keyword("Tot", "Total"));
        assert!(!starts_with_keyword("Grand Total", "Total"));
    }

    #[test]
    fn continue_policy_collects_until_terminator() {
        let fragments = report();
        let section = rules(TotalsPolicy::ContinueToTerminator).isolate(&fragments);
        assert_eq!(
            texts(&section),
            vec![
                "Staff Member",
                "Captured",
                "Total",
                "Alice",
                "12",
                "Total",
                "12",
                "Note: excludes returns",
                "40%",
            ]
        );
    }

    #[test]
    fn band_and_later_pages_policy_drops_trailing_notes() {
        let fragments = report();
        let section = rules(TotalsPolicy::TotalsBandAndLaterPages).isolate(&fragments);
        assert_eq!(
            texts(&section),
            vec!["Staff Member", "Captured", "Total", "Alice", "12", "Total", "12", "40%"]
        );
    }

    #[test]
    fn band_only_policy_stops_after_totals_row() {
        let fragments = report();
        let section = rules(TotalsPolicy::TotalsBandOnly).isolate(&fragments);
        assert_eq!(
            texts(&section),
            vec!["Staff Member", "Captured", "Total", "Alice", "12", "Total", "12"]
        );
    }

    #[test]
    fn missing_anchor_yields_empty_section() {
        let fragments = vec![Fragment::new("Staff Member", 50.0, 700.0, 1)];
        assert!(rules(TotalsPolicy::default()).isolate(&fragments).is_empty());
    }

    #[test]
    fn earlier_pages_are_discarded() {
        let fragments = vec![
            Fragment::new("Alice", 50.0, 100.0, 1),
            Fragment::new("Week To Date", 50.0, 780.0, 2),
            Fragment::new("Bob", 50.0, 700.0, 2),
        ];
        let section = rules(TotalsPolicy::default()).isolate(&fragments);
        assert_eq!(texts(&section), vec!["Bob"]);
    }
}
