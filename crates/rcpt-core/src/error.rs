//! Error types for the rcpt-core library.

use thiserror::Error;

/// Main error type for the rcpt library.
#[derive(Error, Debug)]
pub enum RcptError {
    /// OCR provider error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Malformed incoming request.
    #[error("request error: {0}")]
    Request(#[from] RequestError),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while talking to an OCR provider.
#[derive(Error, Debug)]
pub enum OcrError {
    /// No API key configured for the provider.
    #[error("missing API key for {provider} (set {env_var} or ocr.api_key)")]
    MissingApiKey { provider: String, env_var: String },

    /// The vendor answered with an error payload. The message is surfaced as-is.
    #[error("{0}")]
    Provider(String),

    /// The vendor could not be reached.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The vendor answered with something we cannot decode.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl OcrError {
    /// Whether the error originates from the vendor itself rather than the pipe to it.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, OcrError::Provider(_))
    }
}

/// Errors related to the incoming request body.
#[derive(Error, Debug)]
pub enum RequestError {
    /// Body is not valid JSON or has the wrong shape.
    #[error("{0}")]
    MalformedBody(String),

    /// `imageData` is present but empty.
    #[error("imageData is empty")]
    MissingImageData,
}

#[cfg(feature = "providers")]
impl From<reqwest::Error> for OcrError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            OcrError::InvalidResponse(err.to_string())
        } else {
            OcrError::Transport(err.to_string())
        }
    }
}

/// Result type for the rcpt library.
pub type Result<T> = std::result::Result<T, RcptError>;
