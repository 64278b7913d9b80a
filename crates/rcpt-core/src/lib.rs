//! Core library for receipt OCR processing.
//!
//! This crate provides:
//! - Heuristic parsing of OCR transcripts into structured receipts
//!   (store, date, line items, Subtotal/Tax/TOTAL rows)
//! - OCR provider adapters (Google Cloud Vision, OCR.space)
//! - A transport-independent handler for the receipt endpoint

pub mod api;
pub mod error;
pub mod models;
pub mod ocr;
pub mod receipt;

pub use api::{handle_request, ApiBody, ApiResponse, CORS_HEADERS};
pub use error::{OcrError, RcptError, RequestError, Result};
pub use models::config::{ExtractionConfig, OcrConfig, OcrProviderKind, RcptConfig, ServerConfig};
pub use models::receipt::{ItemStrategy, LineItem, Money, Receipt, SummaryLabel, SummaryRow};
pub use ocr::{OcrOutcome, OcrProvider};
#[cfg(feature = "providers")]
pub use ocr::{create_provider, GoogleVisionProvider, OcrSpaceProvider};
pub use receipt::{ExtractionResult, HeuristicReceiptParser, ReceiptParser};
