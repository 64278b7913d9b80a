//! Heuristic receipt parser combining the field and item rules.

use std::time::Instant;

use rust_decimal::Decimal;
use tracing::{debug, info};

use super::assembler::assemble;
use super::fields::extract_fields;
use super::items::extract_items;
use super::lines::normalize_lines;
use crate::models::config::ExtractionConfig;
use crate::models::receipt::{Money, Receipt};

/// Result of receipt extraction.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Extracted receipt.
    pub receipt: Receipt,
    /// Raw transcript.
    pub raw_text: String,
    /// Number of non-empty lines in the transcript.
    pub line_count: usize,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for receipt parsing.
///
/// Parsing never fails: a transcript with nothing recognizable yields an
/// empty receipt with a zero TOTAL row.
pub trait ReceiptParser: Send + Sync {
    /// Parse a receipt from an OCR transcript.
    fn parse(&self, text: &str) -> ExtractionResult;
}

/// Rule-based receipt parser.
#[derive(Debug, Clone, Default)]
pub struct HeuristicReceiptParser {
    config: ExtractionConfig,
}

impl HeuristicReceiptParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given extraction settings.
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    fn consistency_warning(receipt: &Receipt) -> Option<String> {
        if receipt.items.is_empty() {
            return None;
        }

        let sum = receipt.items_sum();
        let (label, expected) = match receipt.subtotal() {
            Some(subtotal) => ("subtotal", subtotal),
            None => ("total", receipt.total()),
        };
        if expected.is_zero() {
            return None;
        }

        let diff = (sum.value() - expected.value()).abs();
        (diff > Decimal::new(1, 2)).then(|| {
            format!("Line items sum ({}) differs from {} ({})", sum, label, expected)
        })
    }
}

impl ReceiptParser for HeuristicReceiptParser {
    fn parse(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();
        let mut warnings = Vec::new();

        info!("Parsing receipt from {} characters of text", text.len());

        let lines = normalize_lines(text);
        debug!("{} non-empty lines", lines.len());

        let fields = extract_fields(&lines, &self.config);
        if fields.store.is_none() {
            warnings.push("Could not extract store name".to_string());
        }
        if fields.date.is_none() {
            warnings.push("Could not extract date".to_string());
        }
        if fields.total == Money::ZERO {
            warnings.push("Could not extract total".to_string());
        }

        let items = extract_items(&lines, &self.config);
        if items.is_empty() {
            warnings.push("Could not extract line items".to_string());
        }

        let receipt = assemble(fields, items);

        if let Some(warning) = Self::consistency_warning(&receipt) {
            warnings.push(warning);
        }

        debug!(
            "Extracted {} items, total {}, {} warnings",
            receipt.items.len(),
            receipt.total(),
            warnings.len()
        );

        ExtractionResult {
            receipt,
            raw_text: text.to_string(),
            line_count: lines.len(),
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::receipt::SummaryLabel;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> ExtractionResult {
        HeuristicReceiptParser::new().parse(text)
    }

    #[test]
    fn test_parse_diner_receipt() {
        let result = parse("Joe's Diner\n1x Coffee\n$3.50\nTotal $3.50");
        let receipt = &result.receipt;

        assert_eq!(receipt.store.as_deref(), Some("Joe's Diner"));
        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].name, "Coffee");
        assert_eq!(receipt.items[0].quantity, 1);
        assert_eq!(receipt.items[0].unit_price.to_fixed(), "3.50");
        assert_eq!(receipt.items[0].line_total.to_fixed(), "3.50");
        assert_eq!(receipt.summary_rows.len(), 1);
        assert_eq!(receipt.summary_rows[0].label, SummaryLabel::Total);
        assert_eq!(receipt.summary_rows[0].line_total.to_fixed(), "3.50");
        assert_eq!(result.line_count, 4);
        assert_eq!(result.warnings, vec!["Could not extract date".to_string()]);
    }

    #[test]
    fn test_parse_full_receipt() {
        let text = "\
GREEN LEAF GROCERY
123 Market Street
03/14/2024 10:22 AM
--------------------
Organic Apples 4 @ 1.25
Whole Milk          $3.49
2x Sourdough
$4.50
Free Range Eggs
5.99
--------------------
Subtotal $23.48
Sales Tax 8% $1.88
TOTAL $25.36
VISA **** 1234   $25.36
Thank you for shopping!
";
        let result = parse(text);
        let receipt = &result.receipt;

        assert_eq!(receipt.store.as_deref(), Some("GREEN LEAF GROCERY"));
        assert_eq!(receipt.date.as_deref(), Some("03/14/2024"));

        let names: Vec<&str> = receipt.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Organic Apples", "Whole Milk", "Sourdough", "Free Range Eggs"]
        );
        assert_eq!(receipt.items[2].line_total.to_fixed(), "9.00");

        let rows: Vec<(&str, String)> = receipt
            .summary_rows
            .iter()
            .map(|r| (r.label.as_str(), r.line_total.to_fixed()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Subtotal", "23.48".to_string()),
                ("Tax", "1.88".to_string()),
                ("TOTAL", "25.36".to_string()),
            ]
        );
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        assert!(receipt.validate().is_empty());
    }

    #[test]
    fn test_parse_empty_text() {
        let result = parse("");
        assert!(result.receipt.store.is_none());
        assert!(result.receipt.date.is_none());
        assert!(result.receipt.items.is_empty());
        assert_eq!(result.receipt.summary_rows.len(), 1);
        assert_eq!(result.receipt.total().to_fixed(), "0.00");
        assert_eq!(result.line_count, 0);
        assert_eq!(
            result.warnings,
            vec![
                "Could not extract store name".to_string(),
                "Could not extract date".to_string(),
                "Could not extract total".to_string(),
                "Could not extract line items".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "Cafe Lumen\n2 x Espresso 5.00\nCroissant $3.25\nTotal $8.25";
        let parser = HeuristicReceiptParser::new();
        assert_eq!(parser.parse(text).receipt, parser.parse(text).receipt);
    }

    #[test]
    fn test_sum_mismatch_warning() {
        let result = parse("Cafe Lumen\nCroissant $3.25\nTotal $9.00");
        assert!(result
            .warnings
            .contains(&"Line items sum (3.25) differs from total (9.00)".to_string()));
    }

    #[test]
    fn test_with_config() {
        let config = ExtractionConfig {
            enable_broad_fallback: false,
            ..Default::default()
        };
        let parser = HeuristicReceiptParser::new().with_config(config);
        assert!(!parser.config().enable_broad_fallback);
        assert!(parser.parse("Milk 2,49").receipt.items.is_empty());
    }
}
