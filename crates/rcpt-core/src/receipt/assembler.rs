//! Building the final receipt from fields and items.

use super::fields::ExtractedFields;
use crate::models::receipt::{LineItem, Receipt, SummaryLabel, SummaryRow};

/// Combine extracted fields and items into a receipt.
///
/// Subtotal and Tax rows are only added when non-zero. The TOTAL row is
/// always present and always last.
pub fn assemble(fields: ExtractedFields, items: Vec<LineItem>) -> Receipt {
    let mut summary_rows = Vec::with_capacity(3);

    if !fields.subtotal.is_zero() {
        summary_rows.push(SummaryRow::new(SummaryLabel::Subtotal, fields.subtotal));
    }
    if !fields.tax.is_zero() {
        summary_rows.push(SummaryRow::new(SummaryLabel::Tax, fields.tax));
    }
    summary_rows.push(SummaryRow::new(SummaryLabel::Total, fields.total));

    Receipt {
        store: fields.store,
        date: fields.date,
        items,
        summary_rows,
    }
}
