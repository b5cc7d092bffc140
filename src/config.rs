// ABOUTME: Configuration module for the deck-forge application
// ABOUTME: Provides configuration settings and environment variable handling

use crate::cache::DEFAULT_TTL;
use crate::deadline::Deadline;
use crate::gemini::DEFAULT_BASE_URL;
use crate::images::ImageOptions;
use crate::models::{sanitize_image, ModelName};
use std::env;
use std::time::Duration;

/// Global configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub image_model: Option<String>,
    pub max_image_slides: usize,
    pub base_url: String,
    pub default_timeout_ms: u64,
    pub http_timeout_ms: u64,
    pub cache_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            image_model: None,
            max_image_slides: 1,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_timeout_ms: 120_000, // 2 minutes
            http_timeout_ms: 60_000,
            cache_ttl: DEFAULT_TTL,
        }
    }
}

impl Config {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = env::var("GOOGLE_AI_STUDIO_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let image_model = env::var("IMAGEN_MODEL").ok().filter(|s| !s.trim().is_empty());
        let max_image_slides = env::var("MAX_IMAGE_SLIDES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.max_image_slides);
        let base_url = env::var("GENERATIVE_API_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        let default_timeout_ms = env::var("DEFAULT_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.default_timeout_ms);
        let http_timeout_ms = env::var("HTTP_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.http_timeout_ms);
        let cache_ttl = env::var("DECK_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);

        Self {
            api_key,
            image_model,
            max_image_slides,
            base_url,
            default_timeout_ms,
            http_timeout_ms,
            cache_ttl,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Deadline for one inbound request; a zero timeout disables expiry.
    pub fn request_deadline(&self) -> Deadline {
        Deadline::from_timeout(Some(Duration::from_millis(self.default_timeout_ms)))
    }

    /// Image model for generation, honoring IMAGEN_MODEL when it is allow-listed.
    pub fn image_model(&self, requested: Option<&str>) -> ModelName {
        sanitize_image(requested, self.image_model.as_deref())
    }

    /// Image options for an export
    pub fn get_image_options(&self, augment: bool, max_slides: Option<usize>) -> ImageOptions {
        ImageOptions {
            augment,
            max_slides: max_slides.unwrap_or(self.max_image_slides),
        }
    }
}
