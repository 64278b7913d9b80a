//! Common regex patterns for receipt transcripts.
//!
//! Templates use placeholders expanded by [`compile`]: `<CUR>` a currency
//! symbol, `<AMOUNT>` an amount with optional decimals, `<PRICE>` an amount
//! with exactly two decimals and `<RATE>` an optional percentage such as
//! `(8%)`. Both amount forms accept comma thousands separators.

use lazy_static::lazy_static;
use regex::Regex;

const CURRENCY: &str = r"[$€£¥]";
const AMOUNT: &str = r"(\d{1,3}(?:,\d{3})+(?:\.\d{1,2})?|\d+(?:\.\d{1,2})?)";
const PRICE: &str = r"(\d{1,3}(?:,\d{3})+\.\d{2}|\d+\.\d{2})";
const RATE: &str = r"(?:\s*\(?\d{1,2}(?:\.\d+)?\s*%\)?)?";

/// Expand placeholders and compile. Panics on an invalid template.
fn compile(template: &str) -> Regex {
    let pattern = template
        .replace("<CUR>", CURRENCY)
        .replace("<AMOUNT>", AMOUNT)
        .replace("<PRICE>", PRICE)
        .replace("<RATE>", RATE);
    Regex::new(&pattern).unwrap()
}

lazy_static! {
    // Line structure
    pub static ref LINE_BREAKS: Regex = Regex::new(r"[\r\n]+").unwrap();

    pub static ref SEPARATOR: Regex = Regex::new(r"^[-=*_~#.\s]+$").unwrap();

    pub static ref CURRENCY_SYMBOL: Regex = Regex::new(r"[$€£¥]").unwrap();

    // Dates
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}\b"
    ).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b\d{4}[/\-.]\d{1,2}[/\-.]\d{1,2}\b"
    ).unwrap();

    pub static ref DATE_MONTH_DAY_YEAR: Regex = Regex::new(
        r"(?i)\b(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{2,4}\b"
    ).unwrap();

    pub static ref DATE_DAY_MONTH_YEAR: Regex = Regex::new(
        r"(?i)\b\d{1,2}(?:st|nd|rd|th)?\s+(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?,?\s+\d{2,4}\b"
    ).unwrap();

    // Store name
    pub static ref NON_STORE_PREFIX: Regex = Regex::new(
        r"(?i)^(?:receipt|bill|invoice|order|total|cash|change|thank)"
    ).unwrap();

    // Totals, in reporting order. The largest match across all of them wins.
    pub static ref TOTAL_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("total amount", compile(r"(?i)\btotal\s*amount[\s:.]*<CUR>?\s*<AMOUNT>")),
        ("grand total", compile(r"(?i)\bgrand\s*total[\s:.]*<CUR>?\s*<AMOUNT>")),
        ("final total", compile(r"(?i)\bfinal\s*total[\s:.]*<CUR>?\s*<AMOUNT>")),
        ("amount due", compile(r"(?i)\bamount\s*due[\s:.]*<CUR>?\s*<AMOUNT>")),
        ("balance", compile(r"(?i)\bbalance(?:\s*due)?[\s:.]*<CUR>?\s*<AMOUNT>")),
        ("total", compile(r"(?i)total[\s:.]*<CUR>?\s*<AMOUNT>")),
        (
            "total, spaced",
            compile(r"(?i)^(?:grand\s+|final\s+)?total\b[^\d$€£¥]*\s<CUR>?\s*<PRICE>\s*$"),
        ),
        (
            "amount before total",
            compile(r"(?i)^<CUR>?\s*<AMOUNT>\s+(?:grand\s+|final\s+)?total\b"),
        ),
    ];

    /// A line holding only a total label, its value printed further down.
    pub static ref TOTAL_LABEL_ONLY: Regex = Regex::new(
        r"(?i)^(?:total\s*amount|grand\s*total|final\s*total|total|amount\s*due|balance\s*due)[\s:]*$"
    ).unwrap();

    /// Unlabeled amount considered as a last-resort total.
    pub static ref BARE_TOTAL: Regex = compile(
        r"^<CUR>?\s*(\d{1,3}(?:,\d{3})+\.\d{2}|\d{1,6}\.\d{2})\s*$"
    );

    // Tax, first matching line wins. A labeled tax needs cents so that
    // registration numbers such as `GST 123456789` are not taken as amounts.
    pub static ref TAX_PATTERNS: Vec<(&'static str, Regex)> = vec![
        (
            "sales tax",
            compile(r"(?i)\bsales\s*tax\b<RATE>[\s:.]*<CUR>?\s*<PRICE>"),
        ),
        (
            "tax",
            compile(r"(?i)\btax\b<RATE>[\s:.]*<CUR>?\s*<PRICE>"),
        ),
        (
            "vat",
            compile(r"(?i)\bvat\b<RATE>[\s:.]*<CUR>?\s*<PRICE>"),
        ),
        (
            "gst",
            compile(r"(?i)\bgst\b<RATE>[\s:.]*<CUR>?\s*<PRICE>"),
        ),
        (
            "hst",
            compile(r"(?i)\bhst\b<RATE>[\s:.]*<CUR>?\s*<PRICE>"),
        ),
        (
            "tax, spaced",
            compile(r"(?i)^(?:sales\s+)?(?:tax|vat|gst|hst)\b[^\d$€£¥]*\s<CUR>?\s*<PRICE>\s*$"),
        ),
        (
            "amount before tax",
            compile(r"(?i)^<CUR>?\s*<AMOUNT>\s+(?:sales\s+)?(?:tax|vat|gst|hst)\b"),
        ),
    ];

    // Subtotal, first matching line wins.
    pub static ref SUBTOTAL_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("subtotal", compile(r"(?i)\bsub[\s-]*total[\s:.]*<CUR>?\s*<AMOUNT>")),
        (
            "subtotal, spaced",
            compile(r"(?i)^sub[\s-]*total\b[^\d$€£¥]*\s<CUR>?\s*<PRICE>\s*$"),
        ),
    ];

    // Item lines
    pub static ref ITEM_SKIP: Regex = Regex::new(
        r"(?i)\b(?:total|subtotal|tax|change|cash|card|credit|debit|visa|master(?:card)?|amex|payment|tender|balance|date|time|store|address|phone|barcode|return|refund)\b"
    ).unwrap();

    /// `2x Widget`
    pub static ref QUANTITY_PREFIX: Regex = Regex::new(
        r"^(\d{1,3})\s*[xX]\s+(.+)$"
    ).unwrap();

    /// Summary keywords anywhere in a line end the price search for a
    /// quantity-prefixed item.
    pub static ref PRICE_SEARCH_STOP: Regex = Regex::new(
        r"(?i)\b(?:(?:total|sub\s*total|tax|vat|gst|hst|cash|change|balance|amount\s+due|receipt)\b|thank)"
    ).unwrap();

    /// What may surround a date on a line that holds nothing else: a
    /// weekday and a time of day.
    pub static ref DATE_REMAINDER: Regex = Regex::new(
        r"(?i)^[\s,;:|/-]*(?:(?:mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?)?[\s,;:|/-]*(?:\d{1,2}:\d{2}(?::\d{2})?\s*(?:[ap]\.?m\.?)?)?[\s,;:|/-]*$"
    ).unwrap();

    /// A line holding nothing but a price.
    pub static ref PRICE_ONLY: Regex = compile(r"^<CUR>?\s*<PRICE>\s*$");

    /// A price at the end of a line.
    pub static ref TRAILING_PRICE: Regex = compile(r"\s<CUR>?\s*<PRICE>\s*$");

    pub static ref WIDE_COLUMN: Regex = compile(r"^(.+?)\s{3,}<CUR>\s*<PRICE>\s*$");

    /// Same-line variants, tried in order.
    pub static ref SAME_LINE_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("symbol before amount", compile(r"^(.+?)\s+<CUR>\s*<PRICE>\s*$")),
        ("hyphen separated", compile(r"^(.+?)\s*-+\s*<CUR>?\s*<PRICE>\s*$")),
        ("symbol glued", compile(r"^(.+?)<CUR><PRICE>\s*$")),
        ("no symbol", compile(r"^(.+?)\s+<PRICE>\s*$")),
    ];

    /// `Bananas 3 @ 0.50` with an optional trailing line total.
    pub static ref QUANTITY_AT: Regex = compile(
        r"^(.+?)\s+(\d{1,3})\s*@\s*<CUR>?\s*<PRICE>(?:\s+<CUR>?\s*<PRICE>)?\s*$"
    );

    /// `2 x Widget 6.00`
    pub static ref QUANTITY_TIMES_NAME: Regex = compile(
        r"^(\d{1,3})\s*[xX]\s+(.+?)\s+<CUR>?\s*<PRICE>\s*$"
    );

    /// `Widget qty: 2 6.00`
    pub static ref QUANTITY_LABEL: Regex = compile(
        r"(?i)^(.+?)\s+qty\s*[:.]?\s*(\d{1,3})\s+<CUR>?\s*<PRICE>\s*$"
    );

    /// Names carrying one of these are left to the quantity rules.
    pub static ref QUANTITY_MARKER: Regex = Regex::new(
        r"(?i)(?:^\d{1,3}\s*x\s|@|\bqty\b)"
    ).unwrap();

    /// Loose `name amount` used by the broad fallback.
    pub static ref BROAD_ITEM: Regex = compile(
        r"^(.+?)\s+<CUR>?\s*(\d+(?:[.,]\d{1,2})?)\s*$"
    );

    pub static ref CONTAINS_TOTAL: Regex = Regex::new(r"(?i)total").unwrap();
}
