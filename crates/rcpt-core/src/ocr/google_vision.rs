//! Google Cloud Vision `images:annotate` adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{OcrOutcome, OcrProvider};
use crate::error::OcrError;

const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Google Cloud Vision `TEXT_DETECTION` provider.
pub struct GoogleVisionProvider {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GoogleVisionProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    requests: [ImageRequest<'a>; 1],
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    image: Image<'a>,
    features: [Feature; 1],
}

#[derive(Serialize)]
struct Image<'a> {
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    max_results: u32,
}

fn annotate_request(image_base64: &str) -> AnnotateRequest<'_> {
    AnnotateRequest {
        requests: [ImageRequest {
            image: Image {
                content: image_base64,
            },
            features: [Feature {
                kind: "TEXT_DETECTION",
                max_results: 1,
            }],
        }],
    }
}

/// Interpret an `images:annotate` payload.
///
/// A top-level `error` is a provider error. The first text annotation of the
/// first response is the full transcript. Anything else means no text.
pub fn parse_vision_response(payload: Value) -> Result<OcrOutcome, OcrError> {
    if let Some(error) = payload.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(OcrError::Provider(format!("Google Vision API Error: {}", message)));
    }

    let first = payload.get("responses").and_then(|r| r.get(0));

    let text = first
        .and_then(|r| r.get("textAnnotations"))
        .and_then(|a| a.get(0))
        .and_then(|a| a.get("description"))
        .and_then(Value::as_str);

    match (text, first) {
        (Some(text), _) => Ok(OcrOutcome::Text(text.to_string())),
        (None, Some(first)) => Ok(OcrOutcome::NoText {
            debug: first.clone(),
        }),
        (None, None) => Ok(OcrOutcome::NoText { debug: payload }),
    }
}

#[async_trait]
impl OcrProvider for GoogleVisionProvider {
    fn name(&self) -> &str {
        "google-vision"
    }

    async fn recognize(&self, image_base64: &str) -> Result<OcrOutcome, OcrError> {
        debug!("Sending {} base64 bytes to Google Vision", image_base64.len());

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&annotate_request(image_base64))
            .send()
            .await?;

        let status = response.status();
        let payload: Value = response.json().await?;
        if !status.is_success() {
            warn!("Google Vision returned {}", status);
        }

        parse_vision_response(payload)
    }
}
