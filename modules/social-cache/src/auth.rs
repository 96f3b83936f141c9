// Instagram OAuth2 authorization-code exchange.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::credentials::{require, CredentialKind, CredentialStore};
use crate::error::Result;
use crate::provider::Provider;
use crate::strategy::raw_body;
use crate::transport::{HttpRequest, HttpTransport};

pub const TOKEN_URL: &str = "https://api.instagram.com/oauth/access_token";
pub const AUTHORIZE_URL: &str = "https://api.instagram.com/oauth/authorize/";

/// Result of a code exchange. Failure to reach the provider is an `Err`; everything
/// the provider says is one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Authenticated,
    /// No code was supplied; nothing was sent.
    MissingCode,
    /// The provider answered without an access token. Body passed through untouched.
    Rejected(Value),
}

impl AuthOutcome {
    pub const AUTHENTICATED: &'static str = "authenticated";
    pub const MISSING_CODE: &'static str = "missing code";

    /// Wire representation: the marker string, or the provider's body.
    pub fn into_body(self) -> Value {
        match self {
            AuthOutcome::Authenticated => Value::String(Self::AUTHENTICATED.into()),
            AuthOutcome::MissingCode => Value::String(Self::MISSING_CODE.into()),
            AuthOutcome::Rejected(body) => body,
        }
    }
}

pub struct InstagramAuthenticator {
    credentials: Arc<dyn CredentialStore>,
    transport: Arc<dyn HttpTransport>,
    redirect_uri: String,
    token_endpoint: String,
    authorize_endpoint: String,
}

impl InstagramAuthenticator {
    /// `redirect_uri` must match the callback registered with the Instagram app.
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        transport: Arc<dyn HttpTransport>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            transport,
            redirect_uri: redirect_uri.into(),
            token_endpoint: TOKEN_URL.to_string(),
            authorize_endpoint: AUTHORIZE_URL.to_string(),
        }
    }

    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    pub fn with_authorize_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.authorize_endpoint = endpoint.into();
        self
    }

    /// Where to send the account owner to grant access.
    pub async fn authorize_url(&self) -> Result<String> {
        let client_id =
            require(self.credentials.as_ref(), Provider::Instagram, CredentialKind::ClientId)
                .await?;
        let url = url::Url::parse_with_params(
            &self.authorize_endpoint,
            &[
                ("client_id", client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
            ],
        )?;
        Ok(url.into())
    }

    /// Exchange `code` for an access token and persist it as `instagram_access_token`.
    pub async fn authenticate(&self, code: &str) -> Result<AuthOutcome> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(AuthOutcome::MissingCode);
        }

        let store = self.credentials.as_ref();
        let client_id = require(store, Provider::Instagram, CredentialKind::ClientId).await?;
        let client_secret =
            require(store, Provider::Instagram, CredentialKind::ClientSecret).await?;

        let form = vec![
            ("client_id".to_string(), client_id),
            ("client_secret".to_string(), client_secret),
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("redirect_uri".to_string(), self.redirect_uri.clone()),
            ("code".to_string(), code.to_string()),
        ];

        let response = self
            .transport
            .send(HttpRequest::post_form(self.token_endpoint.as_str(), form))
            .await?;
        let body = raw_body(&response.body);

        let token = body
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let Some(token) = token else {
            warn!(status = response.status, "instagram: code exchange rejected");
            return Ok(AuthOutcome::Rejected(body));
        };

        store
            .set(Provider::Instagram, CredentialKind::AccessToken, &token)
            .await?;

        let user_id = match body.pointer("/user/id") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };
        if let Some(id) = &user_id {
            store
                .set(Provider::Instagram, CredentialKind::UserId, id)
                .await?;
        }

        info!(user_id = user_id.as_deref(), "instagram: access token stored");
        Ok(AuthOutcome::Authenticated)
    }
}
