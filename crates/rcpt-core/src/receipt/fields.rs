//! Header and summary field extraction.

use tracing::debug;

use super::rules::{extract_amounts, DateExtractor, FieldExtractor, StoreExtractor};
use crate::models::config::ExtractionConfig;
use crate::models::receipt::Money;

/// Receipt-level fields found in a transcript.
///
/// Amounts default to zero when no rule matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub store: Option<String>,
    pub date: Option<String>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

/// Extract store, date and amounts from normalized lines.
pub fn extract_fields(lines: &[String], config: &ExtractionConfig) -> ExtractedFields {
    let store = StoreExtractor::new()
        .with_scan_lines(config.store_scan_lines)
        .extract(lines);
    let date = DateExtractor::new().extract(lines);
    let amounts = extract_amounts(lines, config);

    if let Some(found) = &store {
        debug!("Store '{}' at line {}", found.value, found.line_number());
    }
    if let Some(found) = &date {
        debug!("Date '{}' at line {} ({})", found.value, found.line_number(), found.rule);
    }

    ExtractedFields {
        store: store.map(|m| m.value),
        date: date.map(|m| m.value),
        subtotal: amounts.subtotal.map(|m| m.value).unwrap_or_default(),
        tax: amounts.tax.map(|m| m.value).unwrap_or_default(),
        total: amounts.total.map(|m| m.value).unwrap_or_default(),
    }
}
