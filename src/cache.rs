// ABOUTME: Time-bounded memoization of generated decks
// ABOUTME: Expiry is checked lazily and concurrent misses for one key share a single generation

use crate::deadline::Deadline;
use crate::deck::Deck;
use crate::errors::Result;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub deck: Deck,
    pub created_at: Instant,
}

/// Lower-cased `model|language|count|topic`.
pub fn cache_key(model: &str, language: &str, count: u32, topic: &str) -> String {
    format!("{}|{}|{}|{}", model, language, count, topic).to_lowercase()
}

type Slot = Arc<tokio::sync::Mutex<Option<CacheEntry>>>;

pub struct DeckCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl DeckCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Number of keys ever stored, stale ones included.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &str) -> Slot {
        self.slots
            .lock()
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.clock.now().saturating_duration_since(entry.created_at) < self.ttl
    }

    /// Return the fresh deck for `key`, or run `generate` and store its result.
    ///
    /// The key's slot stays locked while `generate` runs, so concurrent callers
    /// for the same key wait and then read the stored deck. Each waiter gives up
    /// when its own `deadline` fires. Failures store nothing.
    pub async fn get_or_insert_with<F, Fut>(
        &self,
        key: &str,
        deadline: &Deadline,
        generate: F,
    ) -> Result<Deck>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Deck>>,
    {
        let slot = self.slot(key);
        let mut guard = deadline.run(slot.lock()).await?;

        if let Some(entry) = guard.as_ref() {
            if self.is_fresh(entry) {
                debug!("Deck cache hit for {}", key);
                return Ok(entry.deck.clone());
            }
            debug!("Deck cache entry for {} is stale", key);
        }

        let deck = generate().await?;
        *guard = Some(CacheEntry {
            deck: deck.clone(),
            created_at: self.clock.now(),
        });
        Ok(deck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_lowercase_join() {
        assert_eq!(
            cache_key("gemini-1.5-flash", "VI", 6, "Rust Ownership"),
            "gemini-1.5-flash|vi|6|rust ownership"
        );
    }
}
