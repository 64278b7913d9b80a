//! Rule-based field extractors for receipt transcripts.

pub mod amounts;
pub mod dates;
pub mod patterns;
pub mod store;

pub use amounts::{
    extract_amounts, parse_amount, ReceiptAmounts, SubtotalExtractor, TaxExtractor, TotalExtractor,
};
pub use dates::{is_date_line, is_date_only_line, DateExtractor};
pub use store::StoreExtractor;

/// Trait for field extractors working on normalized lines.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the winning value.
    fn extract(&self, lines: &[String]) -> Option<Self::Output>;

    /// Extract every candidate, in line order.
    fn extract_all(&self, lines: &[String]) -> Vec<Self::Output>;
}

/// A value found on a specific line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Zero-based index into the normalized lines.
    pub line: usize,
    /// Name of the rule that matched.
    pub rule: &'static str,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, line: usize, rule: &'static str, source: impl Into<String>) -> Self {
        Self {
            value,
            line,
            rule,
            source: source.into(),
        }
    }

    /// One-based line number, as shown to users.
    pub fn line_number(&self) -> usize {
        self.line + 1
    }
}
