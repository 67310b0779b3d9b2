use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::model::HeaderPosition;
use crate::options::ReconcileStrategy;

static SPACED_CAPS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|\s)([A-Z]) ([A-Z]{1,3})(\s|$)").expect("valid spaced caps regex")
});

/// Raw header spelling to canonical column name. Unknown names resolve to
/// themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalMap {
    names: BTreeMap<String, String>,
}

impl CanonicalMap {
    #[must_use]
    pub fn resolve<'a>(&'a self, raw: &'a str) -> &'a str {
        self.names.get(raw).map_or(raw, String::as_str)
    }

    #[must_use]
    pub fn canonical_names(&self) -> BTreeSet<&str> {
        self.names.values().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .map(|(raw, canonical)| (raw.as_str(), canonical.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for CanonicalMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        Self {
            names: pairs.into_iter().collect(),
        }
    }
}

/// Decides which header spellings denote the same column.
pub trait ColumnReconciler {
    fn reconcile(&self, headers: &[HeaderPosition]) -> CanonicalMap;
}

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Joins a short all-caps token split by a stray space, e.g. `N PS` -> `NPS`.
#[must_use]
pub fn collapse_spaced_caps(name: &str) -> String {
    SPACED_CAPS
        .replace_all(name, "${1}${2}${3}${4}")
        .into_owned()
}

fn unique_names(headers: &[HeaderPosition]) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    headers
        .iter()
        .map(|header| header.name.as_str())
        .filter(|name| seen.insert(*name))
        .collect()
}

/// Longest candidate wins; equal lengths fall back to the smallest spelling
/// so the choice does not depend on discovery order.
fn pick_canonical<'a>(candidates: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    candidates.max_by(|left, right| {
        normalize(left)
            .len()
            .cmp(&normalize(right).len())
            .then_with(|| right.cmp(left))
    })
}

fn build_map<F>(headers: &[HeaderPosition], same_column: F) -> CanonicalMap
where
    F: Fn(&str, &str) -> bool,
{
    let raw_names = unique_names(headers);
    raw_names
        .iter()
        .map(|&raw| {
            let canonical = pick_canonical(
                raw_names
                    .iter()
                    .copied()
                    .filter(|&other| same_column(raw, other)),
            )
            .unwrap_or(raw);
            (raw.to_string(), collapse_spaced_caps(canonical))
        })
        .collect()
}

/// Unifies names that are prefixes of one another after normalisation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixReconciler;

impl ColumnReconciler for PrefixReconciler {
    fn reconcile(&self, headers: &[HeaderPosition]) -> CanonicalMap {
        build_map(headers, |raw, other| {
            normalize(other).starts_with(&normalize(raw))
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EditDistanceReconciler {
    pub max_distance: usize,
}

impl ColumnReconciler for EditDistanceReconciler {
    fn reconcile(&self, headers: &[HeaderPosition]) -> CanonicalMap {
        build_map(headers, |raw, other| {
            strsim::levenshtein(&normalize(raw), &normalize(other)) <= self.max_distance
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct AliasTableReconciler {
    aliases: BTreeMap<String, String>,
}

impl AliasTableReconciler {
    /// Alias keys are matched after normalisation.
    #[must_use]
    pub fn new(aliases: &BTreeMap<String, String>) -> Self {
        Self {
            aliases: aliases
                .iter()
                .map(|(raw, canonical)| (normalize(raw), canonical.clone()))
                .collect(),
        }
    }
}

impl ColumnReconciler for AliasTableReconciler {
    fn reconcile(&self, headers: &[HeaderPosition]) -> CanonicalMap {
        unique_names(headers)
            .into_iter()
            .map(|raw| {
                let canonical = self
                    .aliases
                    .get(&normalize(raw))
                    .map_or(raw, String::as_str);
                (raw.to_string(), collapse_spaced_caps(canonical))
            })
            .collect()
    }
}

impl ReconcileStrategy {
    #[must_use]
    pub fn reconciler(&self) -> Box<dyn ColumnReconciler + Send + Sync> {
        match self {
            Self::Prefix => Box::new(PrefixReconciler),
            Self::EditDistance { max_distance } => Box::new(EditDistanceReconciler {
                max_distance: *max_distance,
            }),
            Self::AliasTable { aliases } => Box::new(AliasTableReconciler::new(aliases)),
        }
    }
}
