//! Total, tax and subtotal extraction.

use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use super::patterns::{
    BARE_TOTAL, SUBTOTAL_PATTERNS, TAX_PATTERNS, TOTAL_LABEL_ONLY, TOTAL_PATTERNS,
};
use super::{ExtractionMatch, FieldExtractor};
use crate::models::config::ExtractionConfig;
use crate::models::receipt::Money;

/// Parse an amount such as `1,234.56`, `$45.00` or `45`.
///
/// Commas are thousands separators and are dropped.
pub fn parse_amount(s: &str) -> Option<Money> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok().map(Money::new)
}

/// Parse an amount that may use a decimal comma (`2,49`).
///
/// A single comma followed by one or two trailing digits is a decimal
/// separator; anything else falls back to [`parse_amount`].
pub fn parse_amount_lenient(s: &str) -> Option<Money> {
    if !s.contains('.') {
        if let Some((int_part, frac)) = s.rsplit_once(',') {
            if !int_part.contains(',') && (1..=2).contains(&frac.len()) {
                return parse_amount(&format!("{}.{}", int_part, frac));
            }
        }
    }
    parse_amount(s)
}

/// Scan lines against a list of labeled patterns, yielding the first hit per line.
fn labeled_matches<'a>(
    lines: &'a [String],
    patterns: &'a [(&'static str, Regex)],
) -> impl Iterator<Item = ExtractionMatch<Money>> + 'a {
    lines.iter().enumerate().filter_map(move |(i, line)| {
        patterns.iter().find_map(|(rule, pattern)| {
            let caps = pattern.captures(line)?;
            let amount = parse_amount(&caps[1])?;
            Some(ExtractionMatch::new(amount, i, *rule, line.as_str()))
        })
    })
}

/// Grand total extractor.
///
/// Every labeled candidate in the transcript is collected and the largest
/// wins. Without any labeled candidate, the first bare amount above the
/// fallback threshold is used.
pub struct TotalExtractor {
    fragment_lookahead: usize,
    fallback_threshold: Decimal,
    fallback_ceiling: Decimal,
}

impl TotalExtractor {
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            fragment_lookahead: config.fragmented_total_lookahead,
            fallback_threshold: config.total_fallback_threshold(),
            fallback_ceiling: Decimal::from(10000),
        }
    }

    /// A bare `TOTAL AMOUNT` line whose value appears a few lines below.
    fn fragmented(&self, lines: &[String], label_line: usize) -> Option<ExtractionMatch<Money>> {
        let end = (label_line + 1 + self.fragment_lookahead).min(lines.len());
        (label_line + 1..end).find_map(|j| {
            let caps = BARE_TOTAL.captures(&lines[j])?;
            let amount = parse_amount(&caps[1])?;
            (amount.value() > self.fallback_threshold)
                .then(|| ExtractionMatch::new(amount, j, "fragmented total", lines[j].as_str()))
        })
    }

    /// Last-resort unlabeled total.
    pub fn fallback(&self, lines: &[String]) -> Option<ExtractionMatch<Money>> {
        lines.iter().enumerate().find_map(|(i, line)| {
            let caps = BARE_TOTAL.captures(line)?;
            let amount = parse_amount(&caps[1])?;
            let value = amount.value();
            (value > self.fallback_threshold && value < self.fallback_ceiling)
                .then(|| ExtractionMatch::new(amount, i, "unlabeled amount", line.as_str()))
        })
    }
}

impl Default for TotalExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for TotalExtractor {
    type Output = ExtractionMatch<Money>;

    fn extract(&self, lines: &[String]) -> Option<Self::Output> {
        let labeled = self
            .extract_all(lines)
            .into_iter()
            .reduce(|best, candidate| {
                if candidate.value > best.value {
                    candidate
                } else {
                    best
                }
            });

        if let Some(best) = labeled {
            debug!(
                "Total {} from '{}' (line {}, rule {})",
                best.value,
                best.source,
                best.line_number(),
                best.rule
            );
            return Some(best);
        }

        let fallback = self.fallback(lines);
        if let Some(found) = &fallback {
            debug!("Fallback total {} at line {}", found.value, found.line_number());
        }
        fallback
    }

    fn extract_all(&self, lines: &[String]) -> Vec<Self::Output> {
        let mut results: Vec<ExtractionMatch<Money>> = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            for (rule, pattern) in TOTAL_PATTERNS.iter() {
                let Some(caps) = pattern.captures(line) else {
                    continue;
                };
                let Some(amount) = parse_amount(&caps[1]) else {
                    continue;
                };
                if results.iter().any(|r| r.line == i && r.value == amount) {
                    continue;
                }
                results.push(ExtractionMatch::new(amount, i, *rule, line.as_str()));
            }

            if TOTAL_LABEL_ONLY.is_match(line) {
                if let Some(found) = self.fragmented(lines, i) {
                    results.push(found);
                }
            }
        }

        results
    }
}

/// Tax extractor. The first line carrying a tax amount wins.
pub struct TaxExtractor;

impl TaxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TaxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for TaxExtractor {
    type Output = ExtractionMatch<Money>;

    fn extract(&self, lines: &[String]) -> Option<Self::Output> {
        labeled_matches(lines, &TAX_PATTERNS).next()
    }

    fn extract_all(&self, lines: &[String]) -> Vec<Self::Output> {
        labeled_matches(lines, &TAX_PATTERNS).collect()
    }
}

/// Subtotal extractor. The first line carrying a subtotal wins.
pub struct SubtotalExtractor;

impl SubtotalExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SubtotalExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for SubtotalExtractor {
    type Output = ExtractionMatch<Money>;

    fn extract(&self, lines: &[String]) -> Option<Self::Output> {
        labeled_matches(lines, &SUBTOTAL_PATTERNS).next()
    }

    fn extract_all(&self, lines: &[String]) -> Vec<Self::Output> {
        labeled_matches(lines, &SUBTOTAL_PATTERNS).collect()
    }
}

/// Extracted amounts from a receipt.
#[derive(Debug, Clone, Default)]
pub struct ReceiptAmounts {
    pub subtotal: Option<ExtractionMatch<Money>>,
    pub tax: Option<ExtractionMatch<Money>>,
    pub total: Option<ExtractionMatch<Money>>,
}

/// Extract subtotal, tax and total from normalized lines.
pub fn extract_amounts(lines: &[String], config: &ExtractionConfig) -> ReceiptAmounts {
    ReceiptAmounts {
        subtotal: SubtotalExtractor::new().extract(lines),
        tax: TaxExtractor::new().extract(lines),
        total: TotalExtractor::from_config(config).extract(lines),
    }
}
