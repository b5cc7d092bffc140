// ABOUTME: Outbound HTTP seam for the generative service and image URLs
// ABOUTME: ReqwestTransport is the production implementation; tests script their own

use crate::errors::{DeckError, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Raw upstream reply: status plus undecoded body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as UTF-8 text. Error bodies may or may not be JSON.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body to the generative service.
    async fn post_json(&self, url: &str, body: &Value) -> Result<UpstreamResponse>;

    /// Plain GET, used for fetching slide images by URL.
    async fn get(&self, url: &str) -> Result<UpstreamResponse>;
}

pub struct ReqwestTransport {
    client: Client,
    api_key: Option<String>,
}

impl ReqwestTransport {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DeckError::FetchError)?;
        Ok(Self { client, api_key })
    }

    async fn collect(response: reqwest::Response) -> Result<UpstreamResponse> {
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!("Upstream responded {} ({} bytes)", status, body.len());
        Ok(UpstreamResponse { status, body })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<UpstreamResponse> {
        debug!("POST {}", url);
        let mut request = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.header("x-goog-api-key", key);
        }
        Self::collect(request.send().await?).await
    }

    async fn get(&self, url: &str) -> Result<UpstreamResponse> {
        debug!("GET {}", url);
        Self::collect(self.client.get(url).send().await?).await
    }
}
