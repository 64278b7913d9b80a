//! Store name detection from the receipt header.

use super::dates::is_date_line;
use super::patterns::{CURRENCY_SYMBOL, NON_STORE_PREFIX, SEPARATOR};
use super::{ExtractionMatch, FieldExtractor};

/// Store name extractor. Looks at the first few lines only.
pub struct StoreExtractor {
    scan_lines: usize,
}

impl StoreExtractor {
    pub fn new() -> Self {
        Self { scan_lines: 5 }
    }

    /// Limit the header window.
    pub fn with_scan_lines(mut self, scan_lines: usize) -> Self {
        self.scan_lines = scan_lines;
        self
    }

    fn qualifies(line: &str) -> bool {
        let len = line.chars().count();
        len > 3
            && len < 50
            && !line.starts_with(|c: char| c.is_ascii_digit())
            && !CURRENCY_SYMBOL.is_match(line)
            && !is_date_line(line)
            && !NON_STORE_PREFIX.is_match(line)
            && !SEPARATOR.is_match(line)
    }
}

impl Default for StoreExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for StoreExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, lines: &[String]) -> Option<Self::Output> {
        self.extract_all(lines).into_iter().next()
    }

    fn extract_all(&self, lines: &[String]) -> Vec<Self::Output> {
        lines
            .iter()
            .take(self.scan_lines)
            .enumerate()
            .filter(|(_, line)| Self::qualifies(line))
            .map(|(i, line)| ExtractionMatch::new(line.clone(), i, "header line", line.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_qualifying_line() {
        let text = lines(&["***", "RECEIPT", "12 Main St", "Joe's Diner", "Other Name"]);
        let store = StoreExtractor::new().extract(&text).unwrap();
        assert_eq!(store.value, "Joe's Diner");
        assert_eq!(store.line, 3);
    }

    #[test]
    fn test_rejections() {
        for line in [
            "Joe",
            "$5.00 off",
            "01/02/2024",
            "Thank you for shopping",
            "-----------",
            "Invoice #1234",
            "A very long line that is certainly not the name of any store at all",
        ] {
            assert!(
                StoreExtractor::new().extract(&lines(&[line])).is_none(),
                "line should not be a store: {line}"
            );
        }
    }

    #[test]
    fn test_scan_window() {
        let text = lines(&["12", "34", "Corner Shop"]);
        assert!(StoreExtractor::new().with_scan_lines(2).extract(&text).is_none());
        assert!(StoreExtractor::new().with_scan_lines(3).extract(&text).is_some());
    }
}
