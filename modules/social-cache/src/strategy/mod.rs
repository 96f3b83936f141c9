// Provider-specific fetch strategies. Each one knows how to authenticate against
// one provider's timeline endpoint and hand back the parsed JSON body. No caching
// happens here.

mod instagram;
mod twitter;

pub use instagram::{InstagramStrategy, RECENT_MEDIA_URL};
pub use twitter::{TwitterStrategy, USER_TIMELINE_URL};

use async_trait::async_trait;

use crate::credentials::CredentialStore;
use crate::error::{Result, SocialError};
use crate::provider::{FeedData, FeedIdentity, Provider};
use crate::transport::{HttpResponse, HttpTransport};

#[async_trait]
pub trait ProviderStrategy: Send + Sync {
    fn provider(&self) -> Provider;

    async fn fetch(
        &self,
        identity: &FeedIdentity,
        credentials: &dyn CredentialStore,
        transport: &dyn HttpTransport,
    ) -> Result<FeedData>;
}

/// Non-2xx becomes `SocialError::Provider` carrying the raw body; 2xx must parse as JSON.
pub(crate) fn parse_feed_response(response: HttpResponse) -> Result<FeedData> {
    if !response.is_success() {
        return Err(SocialError::Provider {
            status: response.status,
            body: raw_body(&response.body),
        });
    }
    Ok(serde_json::from_str(&response.body)?)
}

/// The body as JSON if it parses, otherwise as a JSON string.
pub(crate) fn raw_body(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
}

pub(crate) fn with_query(endpoint: &str, pairs: &[(String, String)]) -> Result<String> {
    let url = if pairs.is_empty() {
        url::Url::parse(endpoint)?
    } else {
        url::Url::parse_with_params(endpoint, pairs)?
    };
    Ok(url.into())
}
