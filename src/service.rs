// ABOUTME: Request/response contract used by callers of the generation pipeline
// ABOUTME: Validates input, wires the components together and maps failures to structured errors

use crate::cache::{Clock, DeckCache, SystemClock};
use crate::config::Config;
use crate::deadline::Deadline;
use crate::deck::{normalize, Deck, DeckStyle};
use crate::errors::{DeckError, Result};
use crate::gemini::GeminiClient;
use crate::generator::DeckGenerator;
use crate::images::ImageResolver;
use crate::pptx::{self, PptxConfig};
use crate::transport::{ReqwestTransport, Transport};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SLIDE_COUNT: i64 = 6;
pub const MIN_SLIDE_COUNT: i64 = 4;
pub const MAX_SLIDE_COUNT: i64 = 10;
pub const DEFAULT_LANGUAGE: &str = "vi";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default, alias = "slides")]
    pub slide_count: Option<i64>,
    #[serde(default, alias = "lang")]
    pub language: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl GenerateRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            ..Self::default()
        }
    }

    /// Requested count, defaulted and clamped to the supported range.
    pub fn count(&self) -> u32 {
        self.slide_count
            .unwrap_or(DEFAULT_SLIDE_COUNT)
            .clamp(MIN_SLIDE_COUNT, MAX_SLIDE_COUNT) as u32
    }

    pub fn language(&self) -> &str {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE)
    }
}

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub deck: Deck,
    pub augment_images: bool,
    pub style: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub image_data_url: String,
}

/// Parse a caller-supplied deck. Structural problems are the caller's fault.
pub fn parse_deck(raw: &Value) -> Result<Deck> {
    normalize(raw).map_err(|e| match e {
        DeckError::InvalidDeck(msg) => DeckError::ValidationError(msg),
        other => other,
    })
}

pub struct DeckService {
    config: Config,
    generator: DeckGenerator,
    images: ImageResolver,
}

impl DeckService {
    /// Production wiring: reqwest transport and the system clock.
    pub fn new(config: Config) -> Result<Self> {
        let transport = ReqwestTransport::new(
            config.api_key.clone(),
            Duration::from_millis(config.http_timeout_ms),
        )?;
        Ok(Self::with_transport(config, Arc::new(transport), Arc::new(SystemClock)))
    }

    pub fn with_transport(config: Config, transport: Arc<dyn Transport>, clock: Arc<dyn Clock>) -> Self {
        let client = GeminiClient::new(transport.clone(), config.base_url.clone());
        let cache = DeckCache::new(config.cache_ttl, clock);
        let images = ImageResolver::new(transport, config.base_url.clone(), config.image_model(None));
        Self {
            generator: DeckGenerator::new(client, cache),
            images,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn generator(&self) -> &DeckGenerator {
        &self.generator
    }

    fn require_credential(&self) -> Result<()> {
        if self.config.has_credential() {
            Ok(())
        } else {
            Err(DeckError::ConfigError(
                "Missing GOOGLE_AI_STUDIO_API_KEY".to_string(),
            ))
        }
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<Deck> {
        self.generate_with_deadline(request, &self.config.request_deadline())
            .await
    }

    pub async fn generate_with_deadline(
        &self,
        request: &GenerateRequest,
        deadline: &Deadline,
    ) -> Result<Deck> {
        let topic = request
            .topic
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DeckError::ValidationError("Missing topic".to_string()))?;
        self.require_credential()?;

        self.generator
            .get_or_generate(
                topic,
                request.count(),
                request.language(),
                request.model.as_deref(),
                deadline,
            )
            .await
    }

    pub async fn export(&self, request: &ExportRequest) -> Result<ExportedFile> {
        self.export_with_deadline(request, &self.config.request_deadline())
            .await
    }

    pub async fn export_with_deadline(
        &self,
        request: &ExportRequest,
        deadline: &Deadline,
    ) -> Result<ExportedFile> {
        if request.deck.slides.is_empty() {
            return Err(DeckError::ValidationError("Deck.slides is empty".to_string()));
        }

        let mut augment = request.augment_images;
        if augment && !self.config.has_credential() {
            warn!("Image augmentation requested without GOOGLE_AI_STUDIO_API_KEY; skipping generation");
            augment = false;
        }
        let options = self.config.get_image_options(augment, None);

        let mut deck = self.images.augment_deck(&request.deck, &options, deadline).await;
        if let Some(style) = request.style.as_deref() {
            deck.style = DeckStyle::parse(style);
        }

        let bytes = pptx::write_pptx(&deck, &PptxConfig::for_deck(&deck))?;
        info!("Exported {:?} ({} bytes)", deck.topic, bytes.len());
        Ok(ExportedFile {
            bytes,
            content_type: pptx::CONTENT_TYPE,
            filename: pptx::DEFAULT_FILENAME.to_string(),
        })
    }

    pub async fn generate_image(&self, request: &ImageRequest) -> Result<ImageResponse> {
        self.generate_image_with_deadline(request, &self.config.request_deadline())
            .await
    }

    pub async fn generate_image_with_deadline(
        &self,
        request: &ImageRequest,
        deadline: &Deadline,
    ) -> Result<ImageResponse> {
        let prompt = request
            .prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| DeckError::ValidationError("Missing prompt".to_string()))?;
        self.require_credential()?;

        let model = self.config.image_model(request.model.as_deref());
        let image_data_url = self.images.generate(prompt, &model, deadline).await?;
        Ok(ImageResponse { image_data_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slide_count_defaults_and_clamps() {
        let mut request = GenerateRequest::new("t");
        assert_eq!(request.count(), 6);
        request.slide_count = Some(2);
        assert_eq!(request.count(), 4);
        request.slide_count = Some(50);
        assert_eq!(request.count(), 10);
        request.slide_count = Some(-3);
        assert_eq!(request.count(), 4);
    }

    #[test]
    fn test_request_json_aliases() {
        let request: GenerateRequest =
            serde_json::from_value(json!({"topic": "Rust", "slides": 8, "lang": "en"})).unwrap();
        assert_eq!(request.count(), 8);
        assert_eq!(request.language(), "en");
        assert_eq!(GenerateRequest::new("t").language(), DEFAULT_LANGUAGE);
    }

    #[test]
    fn test_caller_deck_errors_are_validation_errors() {
        assert!(matches!(
            parse_deck(&json!({"slides": []})),
            Err(DeckError::ValidationError(_))
        ));
        assert!(parse_deck(&json!({"slides": [{"title": "x"}]})).is_ok());
    }

    #[test]
    fn test_image_response_json_shape() {
        let body = ImageResponse {
            image_data_url: "data:image/png;base64,QUJD".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"imageDataUrl": "data:image/png;base64,QUJD"})
        );
    }
}
