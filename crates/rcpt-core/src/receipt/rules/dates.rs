//! Date extraction for receipts.
//!
//! Dates are returned exactly as printed; no calendar validation happens.

use super::patterns::{DATE_DAY_MONTH_YEAR, DATE_DMY, DATE_MONTH_DAY_YEAR, DATE_REMAINDER, DATE_YMD};
use super::{ExtractionMatch, FieldExtractor};

/// Find the first date-looking substring of a line.
fn find_date(line: &str) -> Option<(&'static str, &str)> {
    let patterns = [
        ("numeric day-month-year", &*DATE_DMY),
        ("numeric year-month-day", &*DATE_YMD),
        ("month name", &*DATE_MONTH_DAY_YEAR),
        ("day month name", &*DATE_DAY_MONTH_YEAR),
    ];

    patterns
        .into_iter()
        .find_map(|(rule, pattern)| pattern.find(line).map(|m| (rule, m.as_str())))
}

/// Whether a line contains a date.
pub fn is_date_line(line: &str) -> bool {
    find_date(line).is_some()
}

/// Whether a line holds a date and nothing else besides a weekday or a time.
pub fn is_date_only_line(line: &str) -> bool {
    match find_date(line) {
        Some((_, date)) => DATE_REMAINDER.is_match(&line.replacen(date, " ", 1)),
        None => false,
    }
}

/// Date field extractor. The first line holding a date wins.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, lines: &[String]) -> Option<Self::Output> {
        lines.iter().enumerate().find_map(|(i, line)| {
            find_date(line)
                .map(|(rule, date)| ExtractionMatch::new(date.to_string(), i, rule, line.as_str()))
        })
    }

    fn extract_all(&self, lines: &[String]) -> Vec<Self::Output> {
        lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| {
                find_date(line).map(|(rule, date)| {
                    ExtractionMatch::new(date.to_string(), i, rule, line.as_str())
                })
            })
            .collect()
    }
}
