// ABOUTME: Deck and slide types plus the normalizer that builds them from untrusted JSON
// ABOUTME: Every deck leaving the pipeline passes through normalize()

use crate::errors::{DeckError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Appended until a slide has enough bullets.
pub const PLACEHOLDER_BULLET: &str = "(fill in)";

/// Minimum bullets per slide.
pub const MIN_BULLETS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckStyle {
    #[default]
    Professional,
    Casual,
}

impl DeckStyle {
    /// Unknown names fall back to the default style.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "casual" => DeckStyle::Casual,
            _ => DeckStyle::Professional,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub title: String,
    pub bullets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub topic: String,
    pub slides: Vec<Slide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default)]
    pub style: DeckStyle,
}

/// Validate and repair an arbitrary payload into a well-formed deck.
///
/// Non-object slide entries are dropped before positions are assigned, so the
/// `Slide {n}` fallback title counts surviving slides only.
pub fn normalize(raw: &Value) -> Result<Deck> {
    let obj = raw
        .as_object()
        .ok_or_else(|| DeckError::InvalidDeck("payload is not an object".to_string()))?;

    let slides: Vec<Slide> = obj
        .get("slides")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_object)
                .enumerate()
                .map(|(i, s)| normalize_slide(s, i))
                .collect()
        })
        .unwrap_or_default();

    if slides.is_empty() {
        return Err(DeckError::InvalidDeck("Deck.slides empty".to_string()));
    }

    let topic = match obj.get("topic") {
        None | Some(Value::Null) => "Untitled".to_string(),
        Some(v) => stringify(v),
    };

    Ok(Deck {
        topic,
        slides,
        theme: obj.get("theme").and_then(Value::as_str).map(str::to_string),
        style: obj
            .get("style")
            .and_then(Value::as_str)
            .map(DeckStyle::parse)
            .unwrap_or_default(),
    })
}

fn normalize_slide(s: &Map<String, Value>, index: usize) -> Slide {
    let fallback_title = format!("Slide {}", index + 1);
    let title = match s.get("title") {
        None | Some(Value::Null) => fallback_title.clone(),
        Some(v) => stringify(v).trim().to_string(),
    };
    let title = if title.is_empty() { fallback_title } else { title };

    let mut bullets: Vec<String> = s
        .get("bullets")
        .and_then(Value::as_array)
        .map(|items| non_empty_trimmed(items.iter().map(stringify)))
        .unwrap_or_default();

    if bullets.is_empty() {
        if let Some(body) = s.get("body").and_then(Value::as_str) {
            bullets = non_empty_trimmed(body.lines().map(str::to_string));
        }
    }

    while bullets.len() < MIN_BULLETS {
        bullets.push(PLACEHOLDER_BULLET.to_string());
    }

    Slide {
        title,
        bullets,
        image_prompt: optional_string(s, "imagePrompt"),
        image_url: optional_string(s, "imageUrl"),
        image_data: optional_string(s, "imageData"),
    }
}

fn non_empty_trimmed(items: impl Iterator<Item = String>) -> Vec<String> {
    items
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn optional_string(s: &Map<String, Value>, key: &str) -> Option<String> {
    s.get(key).and_then(Value::as_str).map(str::to_string)
}

// Strings are taken verbatim, null is empty, anything else uses its JSON text.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
