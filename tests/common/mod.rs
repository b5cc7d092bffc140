// ABOUTME: Shared test doubles for the integration tests
// ABOUTME: A scripted Transport that records every call and a manually advanced Clock

#![allow(dead_code)]

use async_trait::async_trait;
use deck_forge::{Clock, Result, Transport, UpstreamResponse};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Call {
    pub method: &'static str,
    pub url: String,
    pub body: Option<Value>,
    pub at: tokio::time::Instant,
}

/// Replies to POSTs in script order and to GETs by URL.
#[derive(Default)]
pub struct ScriptedTransport {
    posts: Mutex<VecDeque<UpstreamResponse>>,
    gets: Mutex<HashMap<String, UpstreamResponse>>,
    post_delay: Duration,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new(posts: Vec<UpstreamResponse>) -> Self {
        Self {
            posts: Mutex::new(posts.into()),
            ..Self::default()
        }
    }

    /// Every POST takes `delay` of (virtual) time before replying.
    pub fn with_post_delay(mut self, delay: Duration) -> Self {
        self.post_delay = delay;
        self
    }

    pub fn with_get(self, url: &str, response: UpstreamResponse) -> Self {
        self.gets.lock().insert(url.to_string(), response);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn record(&self, method: &'static str, url: &str, body: Option<&Value>) {
        self.calls.lock().push(Call {
            method,
            url: url.to_string(),
            body: body.cloned(),
            at: tokio::time::Instant::now(),
        });
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<UpstreamResponse> {
        self.record("POST", url, Some(body));
        if !self.post_delay.is_zero() {
            tokio::time::sleep(self.post_delay).await;
        }
        let next = self.posts.lock().pop_front();
        Ok(next.unwrap_or_else(|| UpstreamResponse::new(500, "script exhausted")))
    }

    async fn get(&self, url: &str) -> Result<UpstreamResponse> {
        self.record("GET", url, None);
        let found = self.gets.lock().get(url).cloned();
        Ok(found.unwrap_or_else(|| UpstreamResponse::new(404, "not found")))
    }
}

pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// A 200 generateContent reply whose first candidate carries `text`.
pub fn gemini_ok(text: &str) -> UpstreamResponse {
    let body = json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    });
    UpstreamResponse::new(200, body.to_string())
}

/// A 200 reply carrying a small valid deck.
pub fn gemini_deck() -> UpstreamResponse {
    let deck = json!({
        "slides": [
            { "title": "Why Rust", "bullets": ["Speed", "Safety", "Tooling"], "imagePrompt": "a crab" },
            { "title": "Ownership", "bullets": ["Moves", "Borrows"] },
            { "title": "", "bullets": ["Cargo", "Crates", "Docs", "Clippy"] },
            { "title": "Wrap-up", "bullets": ["Try it"] }
        ]
    });
    gemini_ok(&deck.to_string())
}

pub fn rate_limited() -> UpstreamResponse {
    UpstreamResponse::new(429, r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED"}}"#)
}

pub fn rate_limited_for(delay: &str) -> UpstreamResponse {
    let body = json!({
        "error": {
            "code": 429,
            "details": [{ "@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": delay }]
        }
    });
    UpstreamResponse::new(429, body.to_string())
}

pub fn json_mode_disabled() -> UpstreamResponse {
    UpstreamResponse::new(
        400,
        r#"{"error":{"code":400,"message":"JSON mode is not enabled for models/imagen"}}"#,
    )
}

pub fn image_ok() -> UpstreamResponse {
    UpstreamResponse::new(200, r#"{"predictions":[{"bytesBase64Encoded":"QUJD"}]}"#)
}
