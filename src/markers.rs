use regex::Regex;

use crate::model::Fragment;

/// Finds the week identifier anywhere in the document.
///
/// Fragment text is space-joined in extraction order so that a phrase split
/// across fragments still matches. The week is the last two digits of the
/// first capture group (or of the whole match when the pattern has no group).
pub fn detect_week_number(fragments: &[Fragment], week_pattern: &Regex) -> Option<u32> {
    let joined = fragments
        .iter()
        .map(|fragment| fragment.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    detect_week_number_in_text(&joined, week_pattern)
}

pub fn detect_week_number_in_text(text: &str, week_pattern: &Regex) -> Option<u32> {
    let captures = week_pattern.captures(text)?;
    let token = captures.get(1).or_else(|| captures.get(0))?.as_str();
    let digits = token
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<Vec<_>>();
    if digits.len() < 2 {
        return None;
    }

    digits[digits.len() - 2..]
        .iter()
        .collect::<String>()
        .parse()
        .ok()
}

/// First fragment whose text names the target section.
pub fn find_section_anchor<'a>(fragments: &'a [Fragment], anchor: &Regex) -> Option<&'a Fragment> {
    fragments
        .iter()
        .find(|fragment| anchor.is_match(&fragment.text))
}
