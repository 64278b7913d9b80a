//! Configuration structures for the receipt pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Main configuration for the rcpt pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RcptConfig {
    /// OCR provider configuration.
    pub ocr: OcrConfig,

    /// Transcript parsing configuration.
    pub extraction: ExtractionConfig,

    /// HTTP endpoint configuration.
    pub server: ServerConfig,
}

/// Supported OCR vendors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrProviderKind {
    /// Google Cloud Vision `TEXT_DETECTION`.
    #[default]
    GoogleVision,
    /// OCR.space parse API.
    OcrSpace,
}

impl OcrProviderKind {
    /// Environment variable consulted when no key is configured.
    pub fn default_key_env(&self) -> &'static str {
        match self {
            OcrProviderKind::GoogleVision => "GOOGLE_VISION_API_KEY",
            OcrProviderKind::OcrSpace => "OCR_SPACE_API_KEY",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OcrProviderKind::GoogleVision => "Google Vision",
            OcrProviderKind::OcrSpace => "OCR.space",
        }
    }
}

/// OCR provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Which vendor to call.
    pub provider: OcrProviderKind,

    /// API key. Takes precedence over the environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the API key (default depends on provider).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Override of the vendor endpoint URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// OCR language hint (OCR.space only).
    pub language: String,

    /// OCR.space engine number (1 or 2).
    pub ocr_space_engine: u8,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            provider: OcrProviderKind::GoogleVision,
            api_key: None,
            api_key_env: None,
            endpoint: None,
            language: "eng".to_string(),
            ocr_space_engine: 2,
        }
    }
}

impl OcrConfig {
    /// Name of the environment variable holding the key.
    pub fn key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or_else(|| self.provider.default_key_env())
    }

    /// Resolve the API key from the config or the environment.
    pub fn resolve_api_key(&self) -> Result<String, OcrError> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.clone());
        }

        std::env::var(self.key_env())
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| OcrError::MissingApiKey {
                provider: self.provider.display_name().to_string(),
                env_var: self.key_env().to_string(),
            })
    }
}

/// Transcript parsing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// How many leading lines are considered for the store name.
    pub store_scan_lines: usize,

    /// How many lines after `2x Widget` are searched for its price.
    pub quantity_lookahead: usize,

    /// How many lines after a bare `TOTAL AMOUNT` label are searched for its value.
    pub fragmented_total_lookahead: usize,

    /// Minimum value for an unlabeled amount to be taken as the total.
    pub fallback_total_min: Decimal,

    /// Raise the unlabeled total threshold to 50.
    pub strict_total_fallback: bool,

    /// Upper price bound for quantity, multi-line and unit-price items.
    pub max_item_price: Decimal,

    /// Upper price bound for wide-column and same-line items.
    pub max_column_price: Decimal,

    /// Amounts at or above this are ignored by the broad fallback.
    pub broad_fallback_max: Decimal,

    /// Run the broad fallback when no item was found.
    pub enable_broad_fallback: bool,

    /// Lines containing this marker are never item names. `null` disables it.
    pub brand_marker: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            store_scan_lines: 5,
            quantity_lookahead: 5,
            fragmented_total_lookahead: 9,
            fallback_total_min: Decimal::from(10),
            strict_total_fallback: false,
            max_item_price: Decimal::from(1000),
            max_column_price: Decimal::from(10000),
            broad_fallback_max: Decimal::from(100),
            enable_broad_fallback: true,
            brand_marker: Some("modif.ai".to_string()),
        }
    }
}

impl ExtractionConfig {
    /// Threshold an unlabeled amount must exceed to be used as the total.
    pub fn total_fallback_threshold(&self) -> Decimal {
        if self.strict_total_fallback {
            self.fallback_total_min.max(Decimal::from(50))
        } else {
            self.fallback_total_min
        }
    }
}

/// HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub bind: String,

    /// Route serving the receipt endpoint.
    pub route: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8888".to_string(),
            route: "/process-receipt".to_string(),
        }
    }
}

impl RcptConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: RcptConfig =
            serde_json::from_str(r#"{"ocr": {"provider": "ocr_space"}}"#).unwrap();
        assert_eq!(config.ocr.provider, OcrProviderKind::OcrSpace);
        assert_eq!(config.ocr.key_env(), "OCR_SPACE_API_KEY");
        assert_eq!(config.extraction.store_scan_lines, 5);
        assert_eq!(config.server.route, "/process-receipt");
    }

    #[test]
    fn test_strict_fallback_threshold() {
        let mut config = ExtractionConfig::default();
        assert_eq!(config.total_fallback_threshold(), Decimal::from(10));
        config.strict_total_fallback = true;
        assert_eq!(config.total_fallback_threshold(), Decimal::from(50));
    }

    #[test]
    fn test_configured_key_wins() {
        let config = OcrConfig {
            api_key: Some("abc".to_string()),
            api_key_env: Some("RCPT_TEST_UNSET_KEY".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().unwrap(), "abc");
    }

    #[test]
    fn test_missing_key_is_reported() {
        let config = OcrConfig {
            api_key_env: Some("RCPT_TEST_DEFINITELY_UNSET_KEY".to_string()),
            ..Default::default()
        };
        let err = config.resolve_api_key().unwrap_err();
        assert!(err.to_string().contains("RCPT_TEST_DEFINITELY_UNSET_KEY"));
    }

    #[test]
    fn test_cleared_brand_marker_survives_reload() {
        let mut config = RcptConfig::default();
        config.extraction.brand_marker = None;

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""brand_marker":null"#));
        let loaded: RcptConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.extraction.brand_marker, None);

        let defaults: RcptConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults.extraction.brand_marker.as_deref(), Some("modif.ai"));
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = std::env::temp_dir().join(format!("rcpt-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        let mut config = RcptConfig::default();
        config.extraction.store_scan_lines = 3;
        config.save(&path).unwrap();

        let loaded = RcptConfig::from_file(&path).unwrap();
        assert_eq!(loaded.extraction.store_scan_lines, 3);
        std::fs::remove_dir_all(&dir).ok();
    }
}
