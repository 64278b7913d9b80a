//! OCR providers turning a receipt image into a plain-text transcript.

#[cfg(feature = "providers")]
mod google_vision;
#[cfg(feature = "providers")]
mod ocr_space;

#[cfg(feature = "providers")]
pub use google_vision::{parse_vision_response, GoogleVisionProvider};
#[cfg(feature = "providers")]
pub use ocr_space::{parse_ocr_space_response, OcrSpaceProvider};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::OcrError;
#[cfg(feature = "providers")]
use crate::models::config::{OcrConfig, OcrProviderKind};

/// What a provider made of an image.
#[derive(Debug, Clone, PartialEq)]
pub enum OcrOutcome {
    /// Full transcript of the image.
    Text(String),
    /// The vendor answered but found no text. `debug` carries the relevant
    /// part of its payload.
    NoText { debug: Value },
}

impl OcrOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            OcrOutcome::Text(text) => Some(text),
            OcrOutcome::NoText { .. } => None,
        }
    }
}

/// An OCR vendor.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Recognize text in a base64-encoded image (no data-URL prefix).
    async fn recognize(&self, image_base64: &str) -> Result<OcrOutcome, OcrError>;
}

/// Build the provider selected by the configuration.
#[cfg(feature = "providers")]
pub fn create_provider(config: &OcrConfig) -> Result<Box<dyn OcrProvider>, OcrError> {
    let api_key = config.resolve_api_key()?;

    let provider: Box<dyn OcrProvider> = match config.provider {
        OcrProviderKind::GoogleVision => {
            let mut provider = GoogleVisionProvider::new(api_key);
            if let Some(endpoint) = &config.endpoint {
                provider = provider.with_endpoint(endpoint);
            }
            Box::new(provider)
        }
        OcrProviderKind::OcrSpace => {
            let mut provider = OcrSpaceProvider::new(api_key)
                .with_language(&config.language)
                .with_engine(config.ocr_space_engine);
            if let Some(endpoint) = &config.endpoint {
                provider = provider.with_endpoint(endpoint);
            }
            Box::new(provider)
        }
    };

    tracing::debug!("Using OCR provider {}", provider.name());
    Ok(provider)
}

#[cfg(all(test, feature = "providers"))]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider_from_config() {
        let config = OcrConfig {
            provider: OcrProviderKind::OcrSpace,
            api_key: Some("k".to_string()),
            ..Default::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "ocr.space");

        let config = OcrConfig {
            api_key: Some("k".to_string()),
            ..Default::default()
        };
        assert_eq!(create_provider(&config).unwrap().name(), "google-vision");
    }

    #[test]
    fn test_create_provider_without_key() {
        let config = OcrConfig {
            api_key_env: Some("RCPT_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
            ..Default::default()
        };
        let err = create_provider(&config).err().unwrap();
        assert!(matches!(err, OcrError::MissingApiKey { .. }));
    }

    #[test]
    fn test_outcome_text() {
        assert_eq!(OcrOutcome::Text("a".into()).text(), Some("a"));
        assert_eq!(OcrOutcome::NoText { debug: Value::Null }.text(), None);
    }
}
