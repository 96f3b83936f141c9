use async_trait::async_trait;
use social_oauth::{generate_nonce, unix_timestamp, OAuth1Credentials, OAuth1Request};
use tracing::{debug, info};

use crate::credentials::{require, CredentialKind, CredentialStore};
use crate::error::Result;
use crate::provider::{FeedData, FeedIdentity, Provider};
use crate::transport::{HttpRequest, HttpTransport};

use super::{parse_feed_response, with_query, ProviderStrategy};

pub const USER_TIMELINE_URL: &str = "https://api.twitter.com/1.1/statuses/user_timeline.json";

/// User timeline, signed with OAuth 1.0a (HMAC-SHA1) using the app's consumer
/// key pair and the account's access token pair.
#[derive(Debug, Clone)]
pub struct TwitterStrategy {
    endpoint: String,
}

impl TwitterStrategy {
    pub fn new() -> Self {
        Self {
            endpoint: USER_TIMELINE_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn load_credentials(&self, store: &dyn CredentialStore) -> Result<OAuth1Credentials> {
        Ok(OAuth1Credentials {
            consumer_key: require(store, Provider::Twitter, CredentialKind::ClientId).await?,
            consumer_secret: require(store, Provider::Twitter, CredentialKind::ClientSecret)
                .await?,
            token: require(store, Provider::Twitter, CredentialKind::AccessToken).await?,
            token_secret: require(store, Provider::Twitter, CredentialKind::AccessTokenSecret)
                .await?,
        })
    }
}

impl Default for TwitterStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderStrategy for TwitterStrategy {
    fn provider(&self) -> Provider {
        Provider::Twitter
    }

    async fn fetch(
        &self,
        identity: &FeedIdentity,
        credentials: &dyn CredentialStore,
        transport: &dyn HttpTransport,
    ) -> Result<FeedData> {
        let creds = self.load_credentials(credentials).await?;

        // Falls back to the configured account when the caller names no user.
        let user_id = match identity.user_id() {
            Some(id) => Some(id.to_string()),
            None => credentials
                .get(Provider::Twitter, CredentialKind::UserId)
                .await?
                .filter(|id| !id.is_empty()),
        };

        let mut request = OAuth1Request::new("GET", self.endpoint.as_str());
        if let Some(id) = &user_id {
            request = request.query("user_id", id.as_str());
        }
        let signed = request.sign(&creds, &generate_nonce(), unix_timestamp());
        let url = with_query(&self.endpoint, request.query_pairs())?;

        info!(user_id = user_id.as_deref(), "twitter: fetching user timeline");
        let response = transport
            .send(HttpRequest::get(url).header("Authorization", signed.authorization))
            .await?;
        if let Some(remaining) = response.header_value("x-rate-limit-remaining") {
            debug!(remaining, "twitter: rate limit window");
        }
        parse_feed_response(response)
    }
}
