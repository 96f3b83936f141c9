// Time-bounded feed cache. Entries hold the serialized JSON of the last successful
// fetch and disappear once `expires_at` passes.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{Result, SocialError};

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFeed {
    pub payload: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedFeed {
    pub fn new(payload: String, ttl: Duration) -> Result<Self> {
        Ok(Self {
            payload,
            expires_at: expiry_after(Utc::now(), ttl)?,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// `now + ttl`, or a store error when the sum leaves chrono's range.
pub fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| SocialError::Store(format!("cache ttl of {}s is out of range", ttl.as_secs())))
}

#[async_trait]
pub trait FeedCache: Send + Sync {
    /// Live entry for `key`. Expired entries are never returned.
    async fn get(&self, key: &str) -> Result<Option<CachedFeed>>;
    async fn set(&self, key: &str, payload: String, ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// In-process cache. Expired entries are evicted when read and swept on every write.
#[derive(Default)]
pub struct MemoryFeedCache {
    entries: RwLock<HashMap<String, CachedFeed>>,
}

impl MemoryFeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl FeedCache for MemoryFeedCache {
    async fn get(&self, key: &str) -> Result<Option<CachedFeed>> {
        let now = Utc::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired_at(now) => return Ok(Some(entry.clone())),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.is_expired_at(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, payload: String, ttl: Duration) -> Result<()> {
        let entry = CachedFeed::new(payload, ttl)?;
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| !e.is_expired_at(now));
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
