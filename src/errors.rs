// ABOUTME: Error types for the deck-forge pipeline
// ABOUTME: Maps every failure to a caller-facing status and a structured error body

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Deck invalid: {0}")]
    InvalidDeck(String),

    /// Upstream text generation failed for good.
    #[error("Gemini {status} on {model}: {body}")]
    GenerationError {
        status: u16,
        model: String,
        body: String,
    },

    #[error("Image resolution error: {0}")]
    ImageError(String),

    #[error("Failed to reach remote service: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("PPTX generation error: {0}")]
    PptxError(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Timeout error: deadline of {0:?} exceeded")]
    TimeoutError(Duration),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

impl DeckError {
    /// HTTP-equivalent status for callers that speak HTTP.
    /// Upstream failures, network ones included, are 500.
    pub fn status_code(&self) -> u16 {
        match self {
            DeckError::ValidationError(_) => 400,
            DeckError::Cancelled => 499,
            DeckError::TimeoutError(_) => 504,
            _ => 500,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
        }
    }

    pub fn generation(status: u16, model: &str, body: impl Into<String>) -> Self {
        DeckError::GenerationError {
            status,
            model: model.to_string(),
            body: body.into(),
        }
    }
}

/// The only error shape callers ever see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl From<anyhow::Error> for DeckError {
    fn from(err: anyhow::Error) -> Self {
        DeckError::UnknownError(err.to_string())
    }
}

impl From<zip::result::ZipError> for DeckError {
    fn from(err: zip::result::ZipError) -> Self {
        DeckError::PptxError(format!("ZIP operation failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(DeckError::ValidationError("x".into()).status_code(), 400);
        assert_eq!(DeckError::ConfigError("x".into()).status_code(), 500);
        assert_eq!(DeckError::generation(503, "gemini-1.5-pro", "busy").status_code(), 500);
        assert_eq!(DeckError::TimeoutError(Duration::from_secs(1)).status_code(), 504);
    }

    #[test]
    fn test_error_body_carries_upstream_context() {
        let body = DeckError::generation(500, "gemini-1.5-flash", "boom").to_body();
        assert_eq!(body.error, "Gemini 500 on gemini-1.5-flash: boom");
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"error":"Gemini 500 on gemini-1.5-flash: boom"}"#);
    }
}
