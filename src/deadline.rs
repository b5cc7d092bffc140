// ABOUTME: Cancellation and deadline handling for long-running requests
// ABOUTME: Every network call and backoff sleep runs through a Deadline

use crate::errors::{DeckError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Cloneable handle that lets a caller abort an in-flight request.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `cancel` has been called, including before this was awaited.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in self, so wait_for can only end by observing `true`.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// A cancellation token plus an optional expiry instant.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    token: CancelToken,
    expires: Option<(Instant, Duration)>,
}

impl Deadline {
    /// No expiry; only explicit cancellation ends the request early.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn after(timeout: Duration) -> Self {
        Self {
            token: CancelToken::new(),
            expires: Some((Instant::now() + timeout, timeout)),
        }
    }

    /// `None` or a zero timeout means no expiry.
    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        match timeout {
            Some(t) if !t.is_zero() => Self::after(t),
            _ => Self::none(),
        }
    }

    pub fn with_token(mut self, token: CancelToken) -> Self {
        self.token = token;
        self
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Drive `fut` to completion unless the request is cancelled or expires first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output> {
        if self.token.is_cancelled() {
            return Err(DeckError::Cancelled);
        }
        let expiry = async {
            match self.expires {
                Some((at, _)) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(DeckError::Cancelled),
            _ = expiry => Err(DeckError::TimeoutError(
                self.expires.map(|(_, t)| t).unwrap_or_default(),
            )),
            out = fut => Ok(out),
        }
    }

    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        self.run(tokio::time::sleep(duration)).await
    }
}
