use async_trait::async_trait;
use social_oauth::percent_encode;
use tracing::info;

use crate::credentials::{require, CredentialKind, CredentialStore};
use crate::error::Result;
use crate::provider::{FeedData, FeedIdentity, Provider};
use crate::transport::{HttpRequest, HttpTransport};

use super::{parse_feed_response, with_query, ProviderStrategy};

/// `{user_id}` is replaced by the identity's user id, or `self` when it has none.
pub const RECENT_MEDIA_URL: &str = "https://api.instagram.com/v1/users/{user_id}/media/recent/";

/// Recent media for the requested user, read with the stored access token. The
/// token travels as a query parameter.
#[derive(Debug, Clone)]
pub struct InstagramStrategy {
    endpoint: String,
}

impl InstagramStrategy {
    pub fn new() -> Self {
        Self {
            endpoint: RECENT_MEDIA_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Default for InstagramStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderStrategy for InstagramStrategy {
    fn provider(&self) -> Provider {
        Provider::Instagram
    }

    async fn fetch(
        &self,
        identity: &FeedIdentity,
        credentials: &dyn CredentialStore,
        transport: &dyn HttpTransport,
    ) -> Result<FeedData> {
        let token = require(credentials, Provider::Instagram, CredentialKind::AccessToken).await?;
        let user = identity.user_id().map_or_else(|| "self".to_string(), percent_encode);
        let endpoint = self.endpoint.replace("{user_id}", &user);
        let url = with_query(&endpoint, &[("access_token".to_string(), token)])?;

        info!(user = %user, "instagram: fetching recent media");
        let response = transport.send(HttpRequest::get(url)).await?;
        parse_feed_response(response)
    }
}
