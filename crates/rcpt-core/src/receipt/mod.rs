//! Receipt transcript parsing.

mod assembler;
mod fields;
mod items;
mod lines;
mod parser;
pub mod rules;

pub use assembler::assemble;
pub use fields::{extract_fields, ExtractedFields};
pub use items::{extract_items, is_skipped, ItemExtractor};
pub use lines::normalize_lines;
pub use parser::{ExtractionResult, HeuristicReceiptParser, ReceiptParser};
