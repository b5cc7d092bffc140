// ABOUTME: Deck generation entry point: cache lookup, text generation, normalization
// ABOUTME: Owns the cache and the text client for one composition root

use crate::cache::{cache_key, DeckCache};
use crate::deadline::Deadline;
use crate::deck::{normalize, Deck};
use crate::errors::{DeckError, Result};
use crate::gemini::{DeckPrompt, GeminiClient};
use crate::models::{sanitize, Capability};
use log::info;
use serde_json::{json, Value};

pub struct DeckGenerator {
    client: GeminiClient,
    cache: DeckCache,
}

impl DeckGenerator {
    pub fn new(client: GeminiClient, cache: DeckCache) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &DeckCache {
        &self.cache
    }

    pub async fn get_or_generate(
        &self,
        topic: &str,
        count: u32,
        language: &str,
        model: Option<&str>,
        deadline: &Deadline,
    ) -> Result<Deck> {
        let model = sanitize(model, Capability::Text);
        let key = cache_key(model.as_str(), language, count, topic);

        self.cache
            .get_or_insert_with(&key, deadline, || async {
                let prompt = DeckPrompt {
                    topic: topic.to_string(),
                    count,
                    language: language.to_string(),
                    model: Some(model.as_str().to_string()),
                };
                let text = self.client.generate(&prompt, deadline).await?;
                let deck = deck_from_output(topic, &text)?;
                info!("Generated {} slides for {:?}", deck.slides.len(), topic);
                Ok(deck)
            })
            .await
    }
}

/// Parse model output and normalize it under the requested topic.
pub fn deck_from_output(topic: &str, text: &str) -> Result<Deck> {
    let parsed: Value = serde_json::from_str(text)
        .map_err(|e| DeckError::InvalidDeck(format!("structured output is not valid JSON: {}", e)))?;
    let slides = parsed.get("slides").cloned().unwrap_or(Value::Null);
    normalize(&json!({ "topic": topic, "slides": slides }))
}
