pub mod auth;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fetcher;
pub mod provider;
pub mod strategy;
pub mod transport;

pub use auth::{AuthOutcome, InstagramAuthenticator};
pub use cache::{expiry_after, CachedFeed, FeedCache, MemoryFeedCache, DEFAULT_TTL};
pub use config::Config;
pub use credentials::{
    require, CredentialKind, CredentialStore, FileCredentialStore, MemoryCredentialStore,
};
pub use error::{Result, SocialError};
pub use fetcher::{FeedFetcher, FeedFetcherBuilder};
pub use provider::{FeedData, FeedIdentity, Provider};
pub use strategy::{InstagramStrategy, ProviderStrategy, TwitterStrategy};
pub use transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, StubTransport,
};
