//! Transport-independent receipt processing endpoint.
//!
//! [`handle_request`] takes an HTTP method and raw body and always returns a
//! response; every failure is turned into a JSON error body here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::{OcrError, RcptError, RequestError};
use crate::models::receipt::Receipt;
use crate::ocr::{OcrOutcome, OcrProvider};
use crate::receipt::ReceiptParser;

/// Headers attached to every response.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "Content-Type"),
    ("Access-Control-Allow-Methods", "POST, OPTIONS"),
];

pub const NO_TEXT_MESSAGE: &str =
    "No text found in image. Try a clearer photo with better lighting.";

/// Incoming request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessRequest {
    /// Base64 image, optionally as a `data:image/...;base64,` URL.
    #[serde(rename = "imageData")]
    pub image_data: String,
}

/// JSON response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBody {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Receipt>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
}

impl ApiBody {
    pub fn parsed(receipt: Receipt, raw_text: String) -> Self {
        Self {
            success: true,
            data: Some(receipt),
            raw_text: Some(raw_text),
            error: None,
            debug: None,
        }
    }

    pub fn failure(error: impl Into<String>, debug: Option<Value>) -> Self {
        Self {
            success: false,
            data: None,
            raw_text: None,
            error: Some(error.into()),
            debug,
        }
    }
}

/// A complete response: status, content type and body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: String,
}

impl ApiResponse {
    fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: String::new(),
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: Some("text/plain; charset=utf-8"),
            body: body.to_string(),
        }
    }

    fn json(status: u16, body: &ApiBody) -> Self {
        // ApiBody only holds strings, numbers and JSON values.
        let body = serde_json::to_string(body).unwrap_or_else(|_| {
            r#"{"success":false,"error":"Processing failed: response encoding"}"#.to_string()
        });
        Self {
            status,
            content_type: Some("application/json"),
            body,
        }
    }

    /// Decode the JSON body, if any.
    pub fn api_body(&self) -> Option<ApiBody> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Strip a `data:...;base64,` prefix. Everything after the first comma is
/// the payload.
pub fn strip_data_url_prefix(image_data: &str) -> &str {
    match image_data.split_once(',') {
        Some((_, payload)) => payload,
        None => image_data,
    }
}

/// Decode the request body.
pub fn parse_request(body: &str) -> Result<ProcessRequest, RequestError> {
    let request: ProcessRequest =
        serde_json::from_str(body).map_err(|e| RequestError::MalformedBody(e.to_string()))?;
    if request.image_data.trim().is_empty() {
        return Err(RequestError::MissingImageData);
    }
    Ok(request)
}

async fn process(
    body: &str,
    provider: &dyn OcrProvider,
    parser: &dyn ReceiptParser,
) -> Result<ApiBody, RcptError> {
    let request = parse_request(body)?;
    let image = strip_data_url_prefix(&request.image_data);

    info!("Processing with {}", provider.name());
    match provider.recognize(image).await? {
        OcrOutcome::Text(text) => {
            let result = parser.parse(&text);
            info!(
                "Parsed {} items from {} lines in {} ms",
                result.receipt.items.len(),
                result.line_count,
                result.processing_time_ms
            );
            Ok(ApiBody::parsed(result.receipt, text))
        }
        OcrOutcome::NoText { debug } => {
            warn!("No text found in provider response");
            Ok(ApiBody::failure(NO_TEXT_MESSAGE, Some(debug)))
        }
    }
}

/// Handle one request to the receipt endpoint.
pub async fn handle_request(
    method: &str,
    body: &str,
    provider: &dyn OcrProvider,
    parser: &dyn ReceiptParser,
) -> ApiResponse {
    if method.eq_ignore_ascii_case("OPTIONS") {
        return ApiResponse::empty(200);
    }
    if !method.eq_ignore_ascii_case("POST") {
        return ApiResponse::text(405, "Method Not Allowed");
    }

    match process(body, provider, parser).await {
        Ok(body) => ApiResponse::json(200, &body),
        Err(RcptError::Ocr(OcrError::Provider(message))) => {
            error!("{}", message);
            ApiResponse::json(500, &ApiBody::failure(message, None))
        }
        Err(err) => {
            let cause = match &err {
                RcptError::Ocr(inner) => inner.to_string(),
                RcptError::Request(inner) => inner.to_string(),
                other => other.to_string(),
            };
            error!("Processing Error: {}", cause);
            ApiResponse::json(
                500,
                &ApiBody::failure(format!("Processing failed: {}", cause), None),
            )
        }
    }
}
