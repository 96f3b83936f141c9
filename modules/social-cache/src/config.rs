use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

use crate::cache::{expiry_after, DEFAULT_TTL};
use crate::credentials::{CredentialKind, CredentialStore};
use crate::error::Result;
use crate::provider::Provider;

/// Environment variables that stand in for the settings screen, in the order they
/// are seeded into the credential store.
const SEED_VARS: [(&str, Provider, CredentialKind); 7] = [
    ("INSTAGRAM_CLIENT_ID", Provider::Instagram, CredentialKind::ClientId),
    ("INSTAGRAM_CLIENT_SECRET", Provider::Instagram, CredentialKind::ClientSecret),
    ("TWITTER_CLIENT_ID", Provider::Twitter, CredentialKind::ClientId),
    ("TWITTER_CLIENT_SECRET", Provider::Twitter, CredentialKind::ClientSecret),
    ("TWITTER_ACCESS_TOKEN", Provider::Twitter, CredentialKind::AccessToken),
    ("TWITTER_ACCESS_TOKEN_SECRET", Provider::Twitter, CredentialKind::AccessTokenSecret),
    ("TWITTER_USER_ID", Provider::Twitter, CredentialKind::UserId),
];

/// Path of the OAuth2 callback route, appended to `site_url`.
pub const INSTAGRAM_CALLBACK_PATH: &str = "/auth/instagram";

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    // Web server
    pub host: String,
    pub port: u16,
    /// Public base URL of this service, used for the OAuth2 redirect URI.
    pub site_url: String,

    // Storage
    pub credentials_path: Option<PathBuf>,
    pub feed_cache_ttl: Duration,

    // Feed behaviour
    pub require_user_id: bool,
    pub default_feed_source: Provider,

    seed_credentials: Vec<(Provider, CredentialKind, String)>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("site_url", &self.site_url)
            .field("credentials_path", &self.credentials_path)
            .field("feed_cache_ttl", &self.feed_cache_ttl)
            .field("require_user_id", &self.require_user_id)
            .field("default_feed_source", &self.default_feed_source)
            .field("seed_credentials", &self.seed_credentials.len())
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if a variable is present but malformed.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("SOCIAL_CACHE_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = var("SOCIAL_CACHE_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .expect("SOCIAL_CACHE_PORT must be a number");
        let site_url = var("SITE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();
        let feed_cache_ttl = var("FEED_CACHE_TTL_SECS")
            .map(|v| {
                Duration::from_secs(v.parse().expect("FEED_CACHE_TTL_SECS must be a number"))
            })
            .unwrap_or(DEFAULT_TTL);
        if expiry_after(Utc::now(), feed_cache_ttl).is_err() {
            panic!("FEED_CACHE_TTL_SECS is out of range");
        }
        let require_user_id = var("REQUIRE_USER_ID")
            .map(|v| parse_flag(&v).expect("REQUIRE_USER_ID must be true or false"))
            .unwrap_or(false);
        let default_feed_source = var("DEFAULT_FEED_SOURCE")
            .map(|v| {
                v.parse()
                    .expect("DEFAULT_FEED_SOURCE must be twitter or instagram")
            })
            .unwrap_or(Provider::Instagram);

        let seed_credentials = SEED_VARS
            .iter()
            .filter_map(|(key, provider, kind)| var(key).map(|v| (*provider, *kind, v)))
            .collect();

        Self {
            host,
            port,
            site_url,
            credentials_path: var("CREDENTIALS_PATH").map(PathBuf::from),
            feed_cache_ttl,
            require_user_id,
            default_feed_source,
            seed_credentials,
        }
    }

    pub fn redirect_uri(&self) -> String {
        format!("{}{}", self.site_url, INSTAGRAM_CALLBACK_PATH)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Write credentials supplied through the environment into `store`.
    pub async fn seed(&self, store: &dyn CredentialStore) -> Result<usize> {
        for (provider, kind, value) in &self.seed_credentials {
            store.set(*provider, *kind, value).await?;
        }
        if !self.seed_credentials.is_empty() {
            info!(count = self.seed_credentials.len(), "Seeded credentials from environment");
        }
        Ok(self.seed_credentials.len())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
