// Cache-or-fetch orchestration.
//
// `get` serves live cache entries without touching the network. On a miss it takes
// a per-key async guard, re-checks the cache, and only then dispatches to the
// provider's strategy, so concurrent misses for one identity produce one outbound
// call. Only successful fetches are written back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::cache::{FeedCache, DEFAULT_TTL};
use crate::credentials::CredentialStore;
use crate::error::{Result, SocialError};
use crate::provider::{FeedData, FeedIdentity, Provider};
use crate::strategy::{InstagramStrategy, ProviderStrategy, TwitterStrategy};
use crate::transport::HttpTransport;

pub struct FeedFetcher {
    credentials: Arc<dyn CredentialStore>,
    cache: Arc<dyn FeedCache>,
    transport: Arc<dyn HttpTransport>,
    strategies: HashMap<Provider, Arc<dyn ProviderStrategy>>,
    ttl: Duration,
    require_user_id: bool,
    flow_guards: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

pub struct FeedFetcherBuilder {
    credentials: Arc<dyn CredentialStore>,
    cache: Arc<dyn FeedCache>,
    transport: Arc<dyn HttpTransport>,
    strategies: HashMap<Provider, Arc<dyn ProviderStrategy>>,
    ttl: Duration,
    require_user_id: bool,
}

impl FeedFetcherBuilder {
    /// Add or replace the strategy for `strategy.provider()`.
    pub fn with_strategy(mut self, strategy: impl ProviderStrategy + 'static) -> Self {
        self.strategies.insert(strategy.provider(), Arc::new(strategy));
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Reject identities without a user id instead of sharing one cache entry.
    pub fn require_user_id(mut self, require: bool) -> Self {
        self.require_user_id = require;
        self
    }

    pub fn build(self) -> FeedFetcher {
        FeedFetcher {
            credentials: self.credentials,
            cache: self.cache,
            transport: self.transport,
            strategies: self.strategies,
            ttl: self.ttl,
            require_user_id: self.require_user_id,
            flow_guards: Mutex::new(HashMap::new()),
        }
    }
}

impl FeedFetcher {
    /// Builder preloaded with the Twitter and Instagram strategies and a one-hour TTL.
    pub fn builder(
        credentials: Arc<dyn CredentialStore>,
        cache: Arc<dyn FeedCache>,
        transport: Arc<dyn HttpTransport>,
    ) -> FeedFetcherBuilder {
        FeedFetcherBuilder {
            credentials,
            cache,
            transport,
            strategies: HashMap::new(),
            ttl: DEFAULT_TTL,
            require_user_id: false,
        }
        .with_strategy(TwitterStrategy::new())
        .with_strategy(InstagramStrategy::new())
    }

    /// Cached feed if live, otherwise a fresh fetch.
    pub async fn get(&self, identity: &FeedIdentity) -> Result<FeedData> {
        self.check_identity(identity)?;
        let key = identity.cache_key();

        if let Some(data) = self.cached(&key).await? {
            debug!(cache_key = %key, "Feed cache hit");
            return Ok(data);
        }

        let flow = FlowGuard::acquire(&self.flow_guards, &key);
        let _held = flow.lock.lock().await;
        if let Some(data) = self.cached(&key).await? {
            debug!(cache_key = %key, "Feed filled by concurrent fetch");
            return Ok(data);
        }
        self.fetch(identity).await
    }

    /// Always hits the provider. Caches the result only on success.
    pub async fn fetch(&self, identity: &FeedIdentity) -> Result<FeedData> {
        self.check_identity(identity)?;
        let key = identity.cache_key();
        let strategy = self
            .strategies
            .get(&identity.provider)
            .ok_or_else(|| SocialError::UnsupportedProvider(identity.provider.to_string()))?;

        info!(provider = %identity.provider, cache_key = %key, "Fetching feed from provider");
        let data = match strategy
            .fetch(identity, self.credentials.as_ref(), self.transport.as_ref())
            .await
        {
            Ok(data) => data,
            Err(e) => {
                warn!(provider = %identity.provider, error = %e, "Feed fetch failed, cache left untouched");
                return Err(e);
            }
        };

        let payload = serde_json::to_string(&data)?;
        // A failed cache write shouldn't cost the caller a feed we already have.
        if let Err(e) = self.cache.set(&key, payload, self.ttl).await {
            warn!(cache_key = %key, error = %e, "Failed to cache feed");
        }
        Ok(data)
    }

    fn check_identity(&self, identity: &FeedIdentity) -> Result<()> {
        if self.require_user_id && identity.user_id().is_none() {
            return Err(SocialError::MissingUserId);
        }
        Ok(())
    }

    /// Deserialized live entry. A payload that no longer parses is dropped and
    /// treated as a miss.
    async fn cached(&self, key: &str) -> Result<Option<FeedData>> {
        let Some(entry) = self.cache.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&entry.payload) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                warn!(cache_key = %key, error = %e, "Discarding unreadable cache entry");
                self.cache.delete(key).await?;
                Ok(None)
            }
        }
    }

    #[cfg(test)]
    fn guard_count(&self) -> usize {
        self.flow_guards.lock().unwrap().len()
    }
}

type FlowGuards = Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

/// Share of a per-key fetch lock. Dropping the last share removes the map
/// entry, including when the owning `get` future is cancelled.
struct FlowGuard<'a> {
    guards: &'a FlowGuards,
    key: &'a str,
    lock: Arc<AsyncMutex<()>>,
}

impl<'a> FlowGuard<'a> {
    fn acquire(guards: &'a FlowGuards, key: &'a str) -> Self {
        let lock = guards
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(key.to_string())
            .or_default()
            .clone();
        Self { guards, key, lock }
    }
}

impl Drop for FlowGuard<'_> {
    fn drop(&mut self) {
        let mut guards = self.guards.lock().unwrap_or_else(|e| e.into_inner());
        // Map entry plus ours: nobody else is waiting.
        if Arc::strong_count(&self.lock) <= 2 {
            guards.remove(self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryFeedCache;
    use crate::credentials::{CredentialKind, MemoryCredentialStore};
    use crate::transport::StubTransport;
    use serde_json::json;

    #[tokio::test]
    async fn guards_are_released_after_fetch() {
        let transport = Arc::new(StubTransport::new());
        transport.respond_json(200, json!([]));
        let credentials = Arc::new(MemoryCredentialStore::new());
        credentials
            .set(Provider::Instagram, CredentialKind::AccessToken, "t")
            .await
            .unwrap();

        let fetcher = FeedFetcher::builder(
            credentials,
            Arc::new(MemoryFeedCache::new()),
            transport,
        )
        .build();

        fetcher
            .get(&FeedIdentity::new(Provider::Instagram))
            .await
            .unwrap();
        assert_eq!(fetcher.guard_count(), 0);
    }

    #[tokio::test]
    async fn cancelled_get_releases_its_guard() {
        let transport = Arc::new(StubTransport::new().with_latency(Duration::from_millis(200)));
        transport.respond_json(200, json!([]));
        let credentials = Arc::new(MemoryCredentialStore::new());
        credentials
            .set(Provider::Instagram, CredentialKind::AccessToken, "t")
            .await
            .unwrap();

        let fetcher = FeedFetcher::builder(
            credentials,
            Arc::new(MemoryFeedCache::new()),
            transport.clone(),
        )
        .build();

        let identity = FeedIdentity::new(Provider::Instagram);
        let outcome =
            tokio::time::timeout(Duration::from_millis(10), fetcher.get(&identity)).await;
        assert!(outcome.is_err(), "get should still be waiting on the provider");
        assert_eq!(transport.request_count(), 1);
        assert_eq!(fetcher.guard_count(), 0);
    }
}
