// ABOUTME: Text-generation client for the Gemini generateContent endpoint
// ABOUTME: Drives the retry plan and returns the raw structured JSON text

use crate::backoff;
use crate::deadline::Deadline;
use crate::errors::Result;
use crate::retry::{PlanState, RetryPlan};
use crate::transport::Transport;
use log::{info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// What one deck generation asks the model for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckPrompt {
    pub topic: String,
    pub count: u32,
    pub language: String,
    pub model: Option<String>,
}

impl DeckPrompt {
    pub fn render(&self) -> String {
        format!(
            "You are an expert presentation designer.\n\
             Create {count} slides on the topic \"{topic}\" (language: {language}).\n\
             Each slide has:\n\
             - title: short and punchy\n\
             - bullets: 3-5 bullet points with no overlapping ideas\n\
             - imagePrompt: a short English description for an illustration \
             (flat illustration, minimalist, 16:9)\n\
             Return JSON that matches the schema exactly.",
            count = self.count,
            topic = self.topic,
            language = self.language,
        )
    }
}

/// Response schema requested from the model.
pub fn deck_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "slides": {
                "type": "array",
                "minItems": 4,
                "maxItems": 10,
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "bullets": {
                            "type": "array",
                            "minItems": 3,
                            "maxItems": 5,
                            "items": { "type": "string" }
                        },
                        "imagePrompt": { "type": "string" }
                    },
                    "required": ["title", "bullets"]
                }
            }
        },
        "required": ["slides"]
    })
}

#[derive(Deserialize, Debug)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize, Debug)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize, Debug)]
struct Part {
    text: Option<String>,
}

/// Text of the first part of the first candidate, if the body has one.
pub fn candidate_text(body: &[u8]) -> Option<String> {
    let response: GenerateContentResponse = serde_json::from_slice(body).ok()?;
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()?
        .text
        .filter(|text| !text.is_empty())
}

pub struct GeminiClient {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl GeminiClient {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    /// Run the retry plan for `prompt` and return the model's JSON text.
    pub async fn generate(&self, prompt: &DeckPrompt, deadline: &Deadline) -> Result<String> {
        let plan = RetryPlan::new(prompt.model.as_deref());
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt.render() }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": deck_schema()
            }
        });

        let mut state = plan.start();
        loop {
            state = match state {
                PlanState::Pending { attempt, model } => {
                    info!(
                        "Generating deck for {:?}: attempt {}/{} on {}",
                        prompt.topic,
                        attempt + 1,
                        plan.len(),
                        model
                    );
                    let url = format!("{}/models/{}:generateContent", self.base_url, model);
                    let response = deadline.run(self.transport.post_json(&url, &body)).await??;
                    let next = plan.transition(attempt, &model, &response);
                    match &next {
                        PlanState::Pending { model: next_model, .. } => warn!(
                            "{} rejected JSON mode, switching next attempt to {}",
                            model, next_model
                        ),
                        PlanState::FailedTransient { .. } => warn!(
                            "{} returned transient status {}",
                            model, response.status
                        ),
                        _ => {}
                    }
                    next
                }
                PlanState::FailedTransient {
                    attempt,
                    model,
                    delay,
                } => {
                    backoff::wait(delay, deadline).await?;
                    PlanState::Pending { attempt, model }
                }
                PlanState::Succeeded(text) => return Ok(text),
                PlanState::FailedTerminal(err) => return Err(err),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_text_extraction() {
        let body = br#"{"candidates":[{"content":{"parts":[{"text":"{\"slides\":[]}"}]}}]}"#;
        assert_eq!(candidate_text(body).as_deref(), Some(r#"{"slides":[]}"#));
        assert_eq!(candidate_text(br#"{"candidates":[{"content":{"parts":[]}}]}"#), None);
        assert_eq!(candidate_text(br#"{"candidates":[{"finishReason":"SAFETY"}]}"#), None);
        assert_eq!(candidate_text(b"not json"), None);
    }

    #[test]
    fn test_prompt_mentions_request_parameters() {
        let prompt = DeckPrompt {
            topic: "Rust ownership".to_string(),
            count: 5,
            language: "en".to_string(),
            model: None,
        };
        let text = prompt.render();
        assert!(text.contains("Create 5 slides"));
        assert!(text.contains("\"Rust ownership\""));
        assert!(text.contains("language: en"));
    }

    #[test]
    fn test_schema_bounds() {
        let schema = deck_schema();
        assert_eq!(schema["properties"]["slides"]["minItems"], 4);
        assert_eq!(schema["properties"]["slides"]["maxItems"], 10);
        assert_eq!(schema["properties"]["slides"]["items"]["properties"]["bullets"]["maxItems"], 5);
    }
}
