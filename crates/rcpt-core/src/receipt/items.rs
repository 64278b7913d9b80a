//! Line item recovery.
//!
//! Each line is offered to the item rules in priority order and the first
//! rule yielding a valid item wins:
//!
//! 1. skip filter (totals, payment, header and footer lines, bare dates)
//! 2. quantity-prefixed with the price on a later line (`2x Widget` ... `$9.99`)
//! 3. wide column (`Widget      $9.99`)
//! 4. same line (`Widget $9.99`, `Widget 9.99`, `Widget$9.99`, `Widget - 9.99`)
//! 5. quantity and unit price (`Widget 2 @ 9.99`, `2 x Widget 19.98`,
//!    `Widget qty:2 19.98`)
//! 6. name line followed by a price-only line
//!
//! A price line claimed by rule 2 is never offered to the other rules. The
//! lines between the item and its price are still scanned normally.
//!
//! When none of them finds anything in the whole transcript, a broad
//! `name amount` rule is tried as a last resort.

use rust_decimal::Decimal;
use tracing::{debug, trace};

use super::rules::amounts::{parse_amount, parse_amount_lenient};
use super::rules::dates::is_date_only_line;
use super::rules::patterns::{
    BROAD_ITEM, CONTAINS_TOTAL, ITEM_SKIP, PRICE_ONLY, PRICE_SEARCH_STOP, QUANTITY_AT,
    QUANTITY_LABEL, QUANTITY_MARKER, QUANTITY_PREFIX, QUANTITY_TIMES_NAME, SAME_LINE_PATTERNS,
    SEPARATOR, TRAILING_PRICE, WIDE_COLUMN,
};
use crate::models::config::ExtractionConfig;
use crate::models::receipt::{ItemStrategy, LineItem, Money};

/// Exclusive character-count bounds for an item name.
#[derive(Debug, Clone, Copy)]
struct NameBounds {
    min: usize,
    max: usize,
}

const COLUMN_NAME: NameBounds = NameBounds { min: 1, max: 50 };
const UNIT_PRICE_NAME: NameBounds = NameBounds { min: 1, max: 100 };
const MULTI_LINE_NAME: NameBounds = NameBounds { min: 3, max: 50 };
const BROAD_NAME: NameBounds = NameBounds { min: 1, max: 100 };

const MAX_NAME_WORDS: usize = 20;

/// Whether a line can never be an item: totals, payment, header and footer
/// lines, separators and lines holding nothing but a date.
pub fn is_skipped(line: &str) -> bool {
    ITEM_SKIP.is_match(line) || SEPARATOR.is_match(line) || is_date_only_line(line)
}

fn clean_name(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ':' | '-' | '*' | '_'))
        .to_string()
}

/// Line item extractor.
pub struct ItemExtractor {
    quantity_lookahead: usize,
    max_item_price: Decimal,
    max_column_price: Decimal,
    broad_fallback_max: Decimal,
    enable_broad_fallback: bool,
    brand_marker: Option<String>,
}

impl ItemExtractor {
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            quantity_lookahead: config.quantity_lookahead,
            max_item_price: config.max_item_price,
            max_column_price: config.max_column_price,
            broad_fallback_max: config.broad_fallback_max,
            enable_broad_fallback: config.enable_broad_fallback,
            brand_marker: config
                .brand_marker
                .as_ref()
                .filter(|m| !m.is_empty())
                .map(|m| m.to_lowercase()),
        }
    }

    /// Recover items in transcript order.
    pub fn extract(&self, lines: &[String]) -> Vec<LineItem> {
        let mut items = Vec::new();
        let mut claimed = vec![false; lines.len()];
        let mut i = 0;

        while i < lines.len() {
            let line = &lines[i];

            if claimed[i] {
                i += 1;
                continue;
            }

            if is_skipped(line) {
                trace!("Line {} skipped: '{}'", i + 1, line);
                i += 1;
                continue;
            }

            if let Some((item, price_line)) = self.quantity_prefixed(lines, i) {
                debug!(
                    "Line {}: {} x '{}' at {} from line {} ({})",
                    i + 1,
                    item.quantity,
                    item.name,
                    item.unit_price,
                    price_line + 1,
                    item.strategy.as_str()
                );
                items.push(item);
                claimed[price_line] = true;
                i += 1;
                continue;
            }

            let same_line = self
                .wide_column(line)
                .or_else(|| self.same_line(line))
                .or_else(|| self.quantity_unit_price(line));
            if let Some(item) = same_line {
                debug!(
                    "Line {}: '{}' {} ({})",
                    i + 1,
                    item.name,
                    item.line_total,
                    item.strategy.as_str()
                );
                items.push(item);
                i += 1;
                continue;
            }

            let next_claimed = claimed.get(i + 1).copied().unwrap_or(false);
            if let Some(item) = self.multi_line(lines, i).filter(|_| !next_claimed) {
                debug!(
                    "Lines {}-{}: '{}' {} ({})",
                    i + 1,
                    i + 2,
                    item.name,
                    item.line_total,
                    item.strategy.as_str()
                );
                items.push(item);
                i += 2;
                continue;
            }

            i += 1;
        }

        if items.is_empty() && self.enable_broad_fallback {
            items = self.broad(lines);
            if !items.is_empty() {
                debug!("Broad fallback recovered {} items", items.len());
            }
        }

        items
    }

    fn valid_name(&self, name: &str, bounds: NameBounds) -> bool {
        let len = name.chars().count();
        if len <= bounds.min || len >= bounds.max {
            return false;
        }
        if !name.chars().any(char::is_alphabetic) {
            return false;
        }
        if name.split_whitespace().count() >= MAX_NAME_WORDS {
            return false;
        }
        match &self.brand_marker {
            Some(marker) => !name.to_lowercase().contains(marker.as_str()),
            None => true,
        }
    }

    fn price_in_range(&self, price: Money, max: Decimal) -> bool {
        let value = price.value();
        value >= Decimal::new(1, 2) && value <= max
    }

    /// `2x Widget` followed within a few lines by a price-only line.
    ///
    /// Returns the item and the index of its price line.
    fn quantity_prefixed(&self, lines: &[String], i: usize) -> Option<(LineItem, usize)> {
        let caps = QUANTITY_PREFIX.captures(&lines[i])?;
        let rest = caps[2].trim();

        // A price on the same line belongs to the unit-price rule.
        if TRAILING_PRICE.is_match(rest) {
            return None;
        }

        let quantity: u32 = caps[1].parse().ok().filter(|q| *q > 0)?;
        let name = clean_name(rest);
        if !self.valid_name(&name, COLUMN_NAME) {
            return None;
        }

        let end = (i + 1 + self.quantity_lookahead).min(lines.len());
        for j in i + 1..end {
            let next = &lines[j];
            if QUANTITY_PREFIX.is_match(next) || PRICE_SEARCH_STOP.is_match(next) {
                break;
            }

            let price = PRICE_ONLY.captures(next).and_then(|c| parse_amount(&c[1]));
            let Some(price) = price else {
                continue;
            };
            if self.price_in_range(price, self.max_item_price) {
                let strategy = ItemStrategy::QuantityPrefixed;
                return Some((LineItem::from_unit_price(name, quantity, price, strategy), j));
            }
        }

        trace!("No price found for '{}'", name);
        None
    }

    /// `Widget      $9.99`
    fn wide_column(&self, line: &str) -> Option<LineItem> {
        let caps = WIDE_COLUMN.captures(line)?;
        let name = clean_name(&caps[1]);
        if QUANTITY_MARKER.is_match(&name) || !self.valid_name(&name, COLUMN_NAME) {
            return None;
        }
        let price = parse_amount(&caps[2])?;
        self.price_in_range(price, self.max_column_price)
            .then(|| LineItem::from_line_total(name, 1, price, ItemStrategy::WideColumn))
    }

    /// Name and price on one line, in several symbol placements.
    fn same_line(&self, line: &str) -> Option<LineItem> {
        SAME_LINE_PATTERNS.iter().find_map(|(_, pattern)| {
            let caps = pattern.captures(line)?;
            let name = clean_name(&caps[1]);
            if QUANTITY_MARKER.is_match(&name) || !self.valid_name(&name, COLUMN_NAME) {
                return None;
            }
            let price = parse_amount(&caps[2])?;
            self.price_in_range(price, self.max_column_price)
                .then(|| LineItem::from_line_total(name, 1, price, ItemStrategy::SameLine))
        })
    }

    /// `Widget 2 @ 9.99 [19.98]`, `2 x Widget 19.98`, `Widget qty:2 19.98`.
    fn quantity_unit_price(&self, line: &str) -> Option<LineItem> {
        if let Some(caps) = QUANTITY_AT.captures(line) {
            let name = clean_name(&caps[1]);
            let quantity: u32 = caps[2].parse().ok().filter(|q| *q > 0)?;
            let unit = parse_amount(&caps[3])?;
            if !self.valid_name(&name, UNIT_PRICE_NAME)
                || !self.price_in_range(unit, self.max_item_price)
            {
                return None;
            }

            let strategy = ItemStrategy::QuantityUnitPrice;
            let item = match caps.get(4).and_then(|m| parse_amount(m.as_str())) {
                Some(total) => LineItem::from_line_total(name, quantity, total, strategy),
                None => LineItem::from_unit_price(name, quantity, unit, strategy),
            };
            return Some(item);
        }

        let (name, quantity, total) = if let Some(caps) = QUANTITY_TIMES_NAME.captures(line) {
            (clean_name(&caps[2]), caps[1].parse::<u32>().ok()?, parse_amount(&caps[3])?)
        } else if let Some(caps) = QUANTITY_LABEL.captures(line) {
            (clean_name(&caps[1]), caps[2].parse::<u32>().ok()?, parse_amount(&caps[3])?)
        } else {
            return None;
        };

        if quantity == 0
            || !self.valid_name(&name, UNIT_PRICE_NAME)
            || !self.price_in_range(total, self.max_item_price)
        {
            return None;
        }

        Some(LineItem::from_line_total(
            name,
            quantity,
            total,
            ItemStrategy::QuantityUnitPrice,
        ))
    }

    /// A name line directly followed by a price-only line.
    fn multi_line(&self, lines: &[String], i: usize) -> Option<LineItem> {
        let next = lines.get(i + 1)?;
        let name = clean_name(&lines[i]);
        if QUANTITY_PREFIX.is_match(&lines[i]) || !self.valid_name(&name, MULTI_LINE_NAME) {
            return None;
        }

        let price = PRICE_ONLY.captures(next).and_then(|c| parse_amount(&c[1]))?;
        self.price_in_range(price, self.max_item_price)
            .then(|| LineItem::from_line_total(name, 1, price, ItemStrategy::MultiLine))
    }

    /// Last resort: any `name amount` line with a small amount.
    fn broad(&self, lines: &[String]) -> Vec<LineItem> {
        lines
            .iter()
            .filter(|line| !is_skipped(line) && !CONTAINS_TOTAL.is_match(line))
            .filter_map(|line| {
                let caps = BROAD_ITEM.captures(line)?;
                let name = clean_name(&caps[1]);
                if !self.valid_name(&name, BROAD_NAME) {
                    return None;
                }
                let amount = parse_amount_lenient(&caps[2])?;
                let value = amount.value();
                (value > Decimal::ZERO && value < self.broad_fallback_max)
                    .then(|| LineItem::from_line_total(name, 1, amount, ItemStrategy::Broad))
            })
            .collect()
    }
}

impl Default for ItemExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Recover line items from normalized lines.
pub fn extract_items(lines: &[String], config: &ExtractionConfig) -> Vec<LineItem> {
    ItemExtractor::from_config(config).extract(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn extract(raw: &[&str]) -> Vec<LineItem> {
        ItemExtractor::new().extract(&lines(raw))
    }

    #[test]
    fn test_quantity_prefixed_with_price_below() {
        let items = extract(&["2x Widget", "Description filler", "$9.99"]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Widget");
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].unit_price.to_fixed(), "9.99");
        assert_eq!(items[0].line_total.to_fixed(), "19.98");
        assert_eq!(items[0].strategy, ItemStrategy::QuantityPrefixed);
    }

    #[test]
    fn test_quantity_prefixed_stops_at_next_item() {
        let items = extract(&["1x Tea", "2x Scone", "$2.25"]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Scone");
        assert_eq!(items[0].line_total, money("4.50"));
    }

    #[test]
    fn test_quantity_prefixed_stops_at_summary() {
        let items = extract(&["1x Tea", "TOTAL", "$2.25"]);
        assert!(items.iter().all(|i| i.name != "Tea"));
    }

    #[test]
    fn test_quantity_prefixed_stops_at_labeled_summary() {
        for label in ["GRAND TOTAL", "SALES TAX", "Amount Due", "Thanks for visiting"] {
            let items = extract(&["2x Widget", label, "$45.00"]);
            assert!(items.iter().all(|i| i.name != "Widget"), "label: {label}");
        }
    }

    #[test]
    fn test_item_between_quantity_and_price_is_kept() {
        let items = extract(&["2x Widget", "Latte $4.25", "$9.99"]);
        let found: Vec<(&str, u32, String)> = items
            .iter()
            .map(|i| (i.name.as_str(), i.quantity, i.line_total.to_fixed()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("Widget", 2, "19.98".to_string()),
                ("Latte", 1, "4.25".to_string()),
            ]
        );
    }

    #[test]
    fn test_claimed_price_is_not_reused() {
        let items = extract(&["2x Widget", "Gift wrapped", "$9.99", "Bread 2.50"]);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Widget", "Bread"]);
    }

    #[test]
    fn test_dated_item_line_is_kept() {
        let items = extract(&["Milk best by 01/02/2025 3.99", "Bread 2.50"]);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Milk best by 01/02/2025", "Bread"]);

        assert!(is_skipped("03/14/2024 10:22 AM"));
        assert!(is_skipped("Mon Mar 3, 2024"));
        assert!(!is_skipped("Milk best by 01/02/2025 3.99"));
    }

    #[test]
    fn test_quantity_prefixed_skips_out_of_range_price() {
        let items = extract(&["1x Sofa", "$4999.00", "$899.00"]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price, money("899.00"));
    }

    #[test]
    fn test_payment_line_is_never_an_item() {
        let items = extract(&["VISA **** 1234   $45.00", "Mastercard 12.00", "Change $3.00"]);
        assert!(items.is_empty());
    }

    #[test]
    fn test_wide_column() {
        let items = extract(&["Club Sandwich       $12.95"]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Club Sandwich");
        assert_eq!(items[0].strategy, ItemStrategy::WideColumn);
    }

    #[test]
    fn test_same_line_variants() {
        let items = extract(&[
            "Latte $4.25",
            "Muffin 3.10",
            "Bagel$2.00",
            "Orange Juice - 5.50",
            "Ribeye Steak.... 1,249.00",
        ]);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Latte", "Muffin", "Bagel", "Orange Juice", "Ribeye Steak"]);
        assert_eq!(items[4].line_total, money("1249.00"));
        assert!(items.iter().all(|i| i.strategy == ItemStrategy::SameLine));
    }

    #[test]
    fn test_quantity_unit_price_variants() {
        let items = extract(&[
            "Bananas 3 @ 0.50",
            "Apples 4 @ 0.25 1.00",
            "2 x Donut 3.00",
            "Soda qty: 3 4.50",
        ]);
        assert_eq!(items.len(), 4);

        assert_eq!(items[0].name, "Bananas");
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[0].line_total, money("1.50"));

        assert_eq!(items[1].unit_price, money("0.25"));
        assert_eq!(items[1].line_total, money("1.00"));

        assert_eq!(items[2].name, "Donut");
        assert_eq!(items[2].quantity, 2);
        assert_eq!(items[2].unit_price, money("1.50"));

        assert_eq!(items[3].name, "Soda");
        assert_eq!(items[3].quantity, 3);
        assert_eq!(items[3].unit_price.to_fixed(), "1.50");
        assert!(items.iter().all(|i| i.strategy == ItemStrategy::QuantityUnitPrice));
    }

    #[test]
    fn test_multi_line() {
        let items = extract(&["Chicken Wrap", "$8.75", "Iced Tea", "2.50"]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Chicken Wrap");
        assert_eq!(items[1].line_total, money("2.50"));
        assert!(items.iter().all(|i| i.strategy == ItemStrategy::MultiLine));
    }

    #[test]
    fn test_brand_marker_is_not_an_item() {
        let items = extract(&["Scanned with modif.ai", "$1.00"]);
        assert!(items.is_empty());
    }

    #[test]
    fn test_broad_fallback_only_when_nothing_else() {
        let items = extract(&["Milk 2,49", "Bread 3", "Grand total 5,49"]);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Milk", "Bread"]);
        assert_eq!(items[0].line_total, money("2.49"));
        assert!(items.iter().all(|i| i.strategy == ItemStrategy::Broad));

        let items = extract(&["Milk 2,49", "Bread 3.00"]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Bread");
    }

    #[test]
    fn test_broad_fallback_can_be_disabled() {
        let config = ExtractionConfig {
            enable_broad_fallback: false,
            ..Default::default()
        };
        let items = extract_items(&lines(&["Milk 2,49"]), &config);
        assert!(items.is_empty());
    }

    #[test]
    fn test_items_keep_line_order() {
        let items = extract(&["Zucchini 1.00", "2x Apple", "$0.50", "Banana 0.30"]);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Zucchini", "Apple", "Banana"]);
    }

    #[test]
    fn test_line_totals_match_unit_price_times_quantity() {
        let items = extract(&[
            "Pens 7 @ 0.99",
            "3 x Notebook 10.00",
            "Stickers qty:7 1.00",
            "4x Eraser",
            "$0.35",
        ]);
        assert_eq!(items.len(), 4);
        for item in &items {
            let expected = item.unit_price.times(item.quantity);
            let diff = (expected.value() - item.line_total.value()).abs();
            assert!(diff <= Decimal::new(1, 2), "{:?}", item);
        }
    }
}
