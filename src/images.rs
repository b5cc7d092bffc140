// ABOUTME: Image resolution for slides at export time
// ABOUTME: Inline data, then AI generation, then URL fetch; failures never abort the deck

use crate::deadline::Deadline;
use crate::deck::{Deck, Slide};
use crate::errors::{DeckError, Result};
use crate::models::ModelName;
use crate::transport::Transport;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures::future::join_all;
use log::{info, warn};
use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;

/// Appended to prompts composed from slide content.
pub const AUTO_PROMPT_STYLE: &str = "modern flat illustration, minimalist, high quality, 16:9";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    /// Whether to call the image model at all.
    pub augment: bool,
    /// Only slides with index below this get generated images.
    pub max_slides: usize,
}

impl ImageOptions {
    pub fn disabled() -> Self {
        Self {
            augment: false,
            max_slides: 0,
        }
    }

    fn generates_for(&self, index: usize) -> bool {
        self.augment && index < self.max_slides
    }
}

/// Prompt used when a slide has no image prompt of its own.
pub fn auto_prompt(slide: &Slide) -> String {
    let lead: Vec<&str> = slide.bullets.iter().take(3).map(String::as_str).collect();
    format!("{}. {}. {}", slide.title, lead.join(", "), AUTO_PROMPT_STYLE)
}

pub fn prompt_for(slide: &Slide) -> String {
    slide
        .image_prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| auto_prompt(slide))
}

/// JPEG when the URL path ends in .jpg/.jpeg, PNG otherwise.
pub fn mime_for_url(raw: &str) -> &'static str {
    let path = Url::parse(raw)
        .map(|u| u.path().to_ascii_lowercase())
        .unwrap_or_else(|_| {
            raw.split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase()
        });
    if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        "image/png"
    }
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

fn predicted_image_bytes(body: &[u8]) -> Option<String> {
    let parsed: Value = serde_json::from_slice(body).ok()?;
    let candidates = [
        parsed.pointer("/generatedImages/0/image/imageBytes"),
        parsed.pointer("/predictions/0/bytesBase64Encoded"),
        parsed.pointer("/predictions/0/bytesBase64"),
    ];
    let found = candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|b64| !b64.is_empty())
        .map(str::to_string);
    found
}

pub struct ImageResolver {
    transport: Arc<dyn Transport>,
    base_url: String,
    model: ModelName,
}

impl ImageResolver {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>, model: ModelName) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            model,
        }
    }

    pub fn model(&self) -> &ModelName {
        &self.model
    }

    /// Call the image model and return a PNG data URL.
    pub async fn generate(&self, prompt: &str, model: &ModelName, deadline: &Deadline) -> Result<String> {
        let url = format!("{}/models/{}:predict", self.base_url, model);
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": { "sampleCount": 1, "aspectRatio": "16:9" }
        });
        let response = deadline.run(self.transport.post_json(&url, &body)).await??;
        if !response.is_success() {
            let text = response.text();
            let snippet: String = text.chars().take(400).collect();
            return Err(DeckError::ImageError(format!(
                "Imagen {}: {}",
                response.status, snippet
            )));
        }
        let b64 = predicted_image_bytes(&response.body)
            .ok_or_else(|| DeckError::ImageError("Imagen returned no image bytes.".to_string()))?;
        Ok(format!("data:image/png;base64,{}", b64))
    }

    /// Download an image and embed it as a data URL.
    pub async fn fetch_as_data_url(&self, url: &str, deadline: &Deadline) -> Result<String> {
        let response = deadline.run(self.transport.get(url)).await??;
        if !response.is_success() {
            return Err(DeckError::ImageError(format!(
                "Fetch image failed {}",
                response.status
            )));
        }
        Ok(data_url(mime_for_url(url), &response.body))
    }

    /// Best image for one slide, or `None`. Never fails.
    pub async fn resolve(
        &self,
        slide: &Slide,
        index: usize,
        options: &ImageOptions,
        deadline: &Deadline,
    ) -> Option<String> {
        if let Some(data) = slide.image_data.as_deref().filter(|d| !d.is_empty()) {
            return Some(data.to_string());
        }

        if options.generates_for(index) {
            let prompt = prompt_for(slide);
            match self.generate(&prompt, &self.model, deadline).await {
                Ok(data) => {
                    info!("Generated image for slide {}", index + 1);
                    return Some(data);
                }
                Err(e) => warn!("Image generation failed for slide {}: {}", index + 1, e),
            }
        }

        if let Some(url) = slide.image_url.as_deref().filter(|u| !u.trim().is_empty()) {
            match self.fetch_as_data_url(url, deadline).await {
                Ok(data) => return Some(data),
                Err(e) => warn!("Image URL {} failed for slide {}: {}", url, index + 1, e),
            }
        }

        None
    }

    /// Copy of `deck` with every resolvable image inlined. Slides resolve concurrently.
    pub async fn augment_deck(&self, deck: &Deck, options: &ImageOptions, deadline: &Deadline) -> Deck {
        let resolved = join_all(
            deck.slides
                .iter()
                .enumerate()
                .map(|(i, slide)| self.resolve(slide, i, options, deadline)),
        )
        .await;

        let mut augmented = deck.clone();
        for (slide, image) in augmented.slides.iter_mut().zip(resolved) {
            slide.image_data = image;
        }
        augmented
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(title: &str, bullets: &[&str]) -> Slide {
        Slide {
            title: title.to_string(),
            bullets: bullets.iter().map(|b| b.to_string()).collect(),
            image_prompt: None,
            image_url: None,
            image_data: None,
        }
    }

    #[test]
    fn test_auto_prompt_uses_first_three_bullets() {
        let s = slide("Borrowing", &["one", "two", "three", "four"]);
        assert_eq!(
            auto_prompt(&s),
            "Borrowing. one, two, three. modern flat illustration, minimalist, high quality, 16:9"
        );
    }

    #[test]
    fn test_own_prompt_wins_when_not_blank() {
        let mut s = slide("T", &["a", "b", "c"]);
        s.image_prompt = Some("  a crab  ".to_string());
        assert_eq!(prompt_for(&s), "a crab");
        s.image_prompt = Some("   ".to_string());
        assert!(prompt_for(&s).starts_with("T. a, b, c."));
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_for_url("https://x.test/a/photo.JPG"), "image/jpeg");
        assert_eq!(mime_for_url("https://x.test/photo.jpeg?w=200"), "image/jpeg");
        assert_eq!(mime_for_url("https://x.test/photo.png"), "image/png");
        assert_eq!(mime_for_url("https://x.test/photo"), "image/png");
        assert_eq!(mime_for_url("relative/photo.jpg?x=1"), "image/jpeg");
    }

    #[test]
    fn test_predicted_bytes_shapes() {
        assert_eq!(
            predicted_image_bytes(br#"{"generatedImages":[{"image":{"imageBytes":"QUJD"}}]}"#).as_deref(),
            Some("QUJD")
        );
        assert_eq!(
            predicted_image_bytes(br#"{"predictions":[{"bytesBase64Encoded":"QUJD"}]}"#).as_deref(),
            Some("QUJD")
        );
        assert_eq!(predicted_image_bytes(br#"{"predictions":[]}"#), None);
    }

    #[test]
    fn test_data_url_encoding() {
        assert_eq!(data_url("image/png", b"ABC"), "data:image/png;base64,QUJD");
    }
}
