//! Receipt data models.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A non-negative money amount.
///
/// Parsing may carry extra precision; rendering is always fixed to two
/// decimals (`"3.50"`), and [`Money::to_usd`] adds the dollar sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Wrap a decimal. Negative values are clamped to zero.
    pub fn new(value: Decimal) -> Self {
        if value.is_sign_negative() {
            Self::ZERO
        } else {
            Self(value)
        }
    }

    /// Raw value, possibly with more than two fractional digits.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Value rounded half away from zero to cents.
    pub fn rounded(&self) -> Decimal {
        self.0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn is_zero(&self) -> bool {
        self.rounded().is_zero()
    }

    /// Multiply by a quantity, rounded to cents.
    pub fn times(self, quantity: u32) -> Money {
        Money::new(self.0 * Decimal::from(quantity)).round()
    }

    /// Divide by a quantity without rounding. Division by zero yields self.
    pub fn per_unit(self, quantity: u32) -> Money {
        if quantity == 0 {
            return self;
        }
        Money::new(self.0 / Decimal::from(quantity))
    }

    /// Round to cents.
    pub fn round(self) -> Money {
        Money(self.rounded())
    }

    /// Fixed two-decimal rendering, e.g. `12.50`.
    pub fn to_fixed(&self) -> String {
        let mut value = self.rounded();
        value.rescale(2);
        value.to_string()
    }

    /// Dollar rendering, e.g. `$12.50`.
    pub fn to_usd(&self) -> String {
        format!("${}", self.to_fixed())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fixed())
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s
            .trim()
            .trim_start_matches(['$', '€', '£', '¥'])
            .chars()
            .filter(|c| *c != ',' && !c.is_whitespace())
            .collect();
        Decimal::from_str(&cleaned).map(Money::new)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_fixed())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Money::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Which item rule produced a line item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ItemStrategy {
    /// `2x Widget` followed by a price on a later line.
    QuantityPrefixed,
    /// Name and price separated by a wide gap and a currency symbol.
    WideColumn,
    /// Name and price on the same line.
    #[default]
    SameLine,
    /// `Widget 2 @ 3.00`, `2 x Widget 6.00`, `Widget qty:2 6.00`.
    QuantityUnitPrice,
    /// Name line followed by a price-only line.
    MultiLine,
    /// Low-confidence catch-all used when nothing else matched.
    Broad,
}

impl ItemStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStrategy::QuantityPrefixed => "quantity-prefixed",
            ItemStrategy::WideColumn => "wide-column",
            ItemStrategy::SameLine => "same-line",
            ItemStrategy::QuantityUnitPrice => "quantity-unit-price",
            ItemStrategy::MultiLine => "multi-line",
            ItemStrategy::Broad => "broad",
        }
    }
}

/// A single purchased line on the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product name as printed.
    #[serde(rename = "item")]
    pub name: String,

    /// Quantity, at least 1.
    pub quantity: u32,

    /// Price of one unit.
    pub unit_price: Money,

    /// Price of the whole line.
    pub line_total: Money,

    /// Rule that produced this item.
    #[serde(skip)]
    pub strategy: ItemStrategy,
}

impl LineItem {
    /// Item whose unit price was observed; the total is derived.
    pub fn from_unit_price(
        name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
        strategy: ItemStrategy,
    ) -> Self {
        let quantity = quantity.max(1);
        let unit_price = unit_price.round();
        Self {
            name: name.into(),
            quantity,
            unit_price,
            line_total: unit_price.times(quantity),
            strategy,
        }
    }

    /// Item whose line total was observed; the unit price is derived.
    ///
    /// The unit price keeps full precision so that `unit * quantity`
    /// rounds back to the observed total.
    pub fn from_line_total(
        name: impl Into<String>,
        quantity: u32,
        line_total: Money,
        strategy: ItemStrategy,
    ) -> Self {
        let quantity = quantity.max(1);
        Self {
            name: name.into(),
            quantity,
            unit_price: line_total.per_unit(quantity),
            line_total: line_total.round(),
            strategy,
        }
    }
}

/// Label of a summary row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SummaryLabel {
    Subtotal,
    Tax,
    #[serde(rename = "TOTAL")]
    Total,
}

impl SummaryLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryLabel::Subtotal => "Subtotal",
            SummaryLabel::Tax => "Tax",
            SummaryLabel::Total => "TOTAL",
        }
    }
}

/// A labeled amount without quantity or unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub label: SummaryLabel,
    pub line_total: Money,
}

impl SummaryRow {
    pub fn new(label: SummaryLabel, line_total: Money) -> Self {
        Self {
            label,
            line_total: line_total.round(),
        }
    }
}

/// A structured receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Store name, if one was recognized.
    #[serde(default)]
    pub store: Option<String>,

    /// Date as printed on the receipt. Not validated.
    #[serde(default)]
    pub date: Option<String>,

    /// Purchased items in transcript order.
    #[serde(default)]
    pub items: Vec<LineItem>,

    /// Subtotal, Tax and TOTAL rows, in that order.
    #[serde(default)]
    pub summary_rows: Vec<SummaryRow>,
}

impl Receipt {
    fn summary(&self, label: SummaryLabel) -> Option<Money> {
        self.summary_rows
            .iter()
            .find(|row| row.label == label)
            .map(|row| row.line_total)
    }

    pub fn subtotal(&self) -> Option<Money> {
        self.summary(SummaryLabel::Subtotal)
    }

    pub fn tax(&self) -> Option<Money> {
        self.summary(SummaryLabel::Tax)
    }

    /// Grand total; zero when the TOTAL row is missing.
    pub fn total(&self) -> Money {
        self.summary(SummaryLabel::Total).unwrap_or(Money::ZERO)
    }

    /// Sum of all item line totals.
    pub fn items_sum(&self) -> Money {
        Money::new(self.items.iter().map(|i| i.line_total.value()).sum())
    }

    /// Check the receipt for consistency and return any issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.store.is_none() {
            issues.push("Missing store name".to_string());
        }

        if self.items.is_empty() {
            issues.push("No line items".to_string());
        }

        if self.total().is_zero() {
            issues.push("Total is zero".to_string());
        }

        for item in &self.items {
            let expected = item.unit_price.times(item.quantity);
            if (expected.value() - item.line_total.value()).abs() > Decimal::new(1, 2) {
                issues.push(format!(
                    "Item '{}' total ({}) differs from {} x {}",
                    item.name, item.line_total, item.quantity, item.unit_price
                ));
            }
        }

        let positions: Vec<SummaryLabel> = self.summary_rows.iter().map(|r| r.label).collect();
        if positions.last() != Some(&SummaryLabel::Total) {
            issues.push("TOTAL row is not last".to_string());
        }

        issues
    }
}
