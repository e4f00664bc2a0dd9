//! Process-local TTL cache for resolved offer lists.
//!
//! Entries are keyed by the normalized id set, expire after a fixed
//! duration, and can be invalidated per item id by the price-update
//! webhook. Expired entries are pruned lazily on lookup.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use vetor_meli::Offer;

#[derive(Debug, Clone)]
struct CacheEntry {
    offers: Vec<Offer>,
    ids: HashSet<String>,
    expires_at: Instant,
}

/// Bounded-lifetime offer cache shared across request handlers.
#[derive(Clone)]
pub struct OfferCache {
    ttl: Duration,
    inner: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl OfferCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Cache key for an id list: sorted, deduplicated, comma-joined —
    /// the same set of ids hits the same entry regardless of order.
    #[must_use]
    pub fn key_for(ids: &[String]) -> String {
        let mut sorted: Vec<&str> = ids.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.join(",")
    }

    pub async fn get(&self, key: &str) -> Option<Vec<Offer>> {
        let mut map = self.inner.lock().await;
        match map.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.offers.clone()),
            Some(_) => {
                map.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: String, ids: &[String], offers: Vec<Offer>) {
        let entry = CacheEntry {
            offers,
            ids: ids.iter().cloned().collect(),
            expires_at: Instant::now() + self.ttl,
        };
        self.inner.lock().await.insert(key, entry);
    }

    /// Drops every entry whose id set contains `item_id`.
    /// Returns the number of entries removed.
    pub async fn invalidate_item(&self, item_id: &str) -> usize {
        let mut map = self.inner.lock().await;
        let before = map.len();
        map.retain(|_, entry| !entry.ids.contains(item_id));
        before - map.len()
    }

    /// Drops all entries. Returns the number removed.
    pub async fn clear(&self) -> usize {
        let mut map = self.inner.lock().await;
        let count = map.len();
        map.clear();
        count
    }
}
