//! OCR.space `parse/image` adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{OcrOutcome, OcrProvider};
use crate::error::OcrError;

const DEFAULT_ENDPOINT: &str = "https://api.ocr.space/parse/image";

/// OCR.space provider.
pub struct OcrSpaceProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    language: String,
    engine: u8,
}

impl OcrSpaceProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            language: "eng".to_string(),
            engine: 2,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_engine(mut self, engine: u8) -> Self {
        self.engine = engine;
        self
    }

    fn form(&self, image_base64: &str) -> Vec<(&'static str, String)> {
        vec![
            ("apikey", self.api_key.clone()),
            ("base64Image", format!("data:image/jpeg;base64,{}", image_base64)),
            ("language", self.language.clone()),
            ("isTable", "true".to_string()),
            ("OCREngine", self.engine.to_string()),
        ]
    }
}

/// `ErrorMessage` is either a string or a list of strings.
fn error_message(payload: &Value) -> String {
    match payload.get("ErrorMessage") {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Array(messages)) => messages
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("; "),
        _ => "unknown error".to_string(),
    }
}

/// Interpret a `parse/image` payload.
pub fn parse_ocr_space_response(payload: Value) -> Result<OcrOutcome, OcrError> {
    if payload
        .get("IsErroredOnProcessing")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        return Err(OcrError::Provider(format!(
            "OCR.space Error: {}",
            error_message(&payload)
        )));
    }

    let text = payload
        .get("ParsedResults")
        .and_then(|r| r.get(0))
        .and_then(|r| r.get("ParsedText"))
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty());

    match text {
        Some(text) => Ok(OcrOutcome::Text(text.to_string())),
        None => Ok(OcrOutcome::NoText { debug: payload }),
    }
}

#[async_trait]
impl OcrProvider for OcrSpaceProvider {
    fn name(&self) -> &str {
        "ocr.space"
    }

    async fn recognize(&self, image_base64: &str) -> Result<OcrOutcome, OcrError> {
        debug!(
            "Sending {} base64 bytes to OCR.space (engine {})",
            image_base64.len(),
            self.engine
        );

        let payload: Value = self
            .client
            .post(&self.endpoint)
            .form(&self.form(image_base64))
            .send()
            .await?
            .json()
            .await?;

        parse_ocr_space_response(payload)
    }
}
