//! Route-level tests: the router driven in-process with a stubbed provider API.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use social_cache::{
    Config, CredentialKind, CredentialStore, FeedCache, FeedFetcher, InstagramAuthenticator,
    MemoryCredentialStore, MemoryFeedCache, Provider, StubTransport,
};

use crate::routes::build_router;
use crate::AppState;

struct TestApp {
    state: Arc<AppState>,
    credentials: Arc<MemoryCredentialStore>,
    cache: Arc<MemoryFeedCache>,
    transport: Arc<StubTransport>,
}

impl TestApp {
    async fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "SITE_URL" => Some("https://example.com".to_string()),
            _ => None,
        });
        let credentials = Arc::new(MemoryCredentialStore::new());
        for (provider, kind, value) in [
            (Provider::Instagram, CredentialKind::ClientId, "ig-client"),
            (Provider::Instagram, CredentialKind::ClientSecret, "ig-secret"),
            (Provider::Instagram, CredentialKind::AccessToken, "ig-token"),
            (Provider::Twitter, CredentialKind::ClientId, "ck"),
            (Provider::Twitter, CredentialKind::ClientSecret, "cs"),
            (Provider::Twitter, CredentialKind::AccessToken, "tk"),
            (Provider::Twitter, CredentialKind::AccessTokenSecret, "ts"),
        ] {
            credentials.set(provider, kind, value).await.unwrap();
        }
        let cache = Arc::new(MemoryFeedCache::new());
        let transport = Arc::new(StubTransport::new());

        let fetcher = FeedFetcher::builder(credentials.clone(), cache.clone(), transport.clone())
            .ttl(config.feed_cache_ttl)
            .build();
        let authenticator =
            InstagramAuthenticator::new(credentials.clone(), transport.clone(), config.redirect_uri());

        Self {
            state: Arc::new(AppState {
                fetcher,
                authenticator,
                config,
            }),
            credentials,
            cache,
            transport,
        }
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let response = build_router(self.state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }
}

#[tokio::test]
async fn health_check() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

// =========================================================================
// /auth/instagram
// =========================================================================

#[tokio::test]
async fn auth_without_code_is_rejected_locally() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/auth/instagram").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!("missing code"));

    let (_, body) = app.get("/auth/instagram?code=").await;
    assert_eq!(body, json!("missing code"));
    assert_eq!(app.transport.request_count(), 0);
}

#[tokio::test]
async fn auth_with_code_stores_token() {
    let app = TestApp::new().await;
    app.transport.respond_json(200, json!({"access_token": "fresh-token"}));

    let (status, body) = app.get("/auth/instagram?code=abc").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("authenticated"));
    assert_eq!(
        app.transport.requests()[0].form_value("redirect_uri"),
        Some("https://example.com/auth/instagram")
    );
    assert_eq!(
        app.credentials
            .get(Provider::Instagram, CredentialKind::AccessToken)
            .await
            .unwrap()
            .as_deref(),
        Some("fresh-token")
    );
}

#[tokio::test]
async fn auth_rejection_returns_provider_body() {
    let app = TestApp::new().await;
    let error = json!({"error_type": "OAuthException", "code": 400, "error_message": "Invalid code"});
    app.transport.respond_json(400, error.clone());

    let (status, body) = app.get("/auth/instagram?code=bad").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, error);
}

#[tokio::test]
async fn authorize_redirects_to_instagram() {
    let app = TestApp::new().await;
    let response = build_router(app.state.clone())
        .oneshot(
            Request::builder()
                .uri("/auth/instagram/authorize")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://api.instagram.com/oauth/authorize/?client_id=ig-client"));
    assert!(location.ends_with("&response_type=code"));
}

// =========================================================================
// /feed
// =========================================================================

#[tokio::test]
async fn feed_defaults_to_instagram() {
    let app = TestApp::new().await;
    app.transport.respond_json(200, json!({"data": [{"id": "1"}]}));

    let (status, body) = app.get("/feed").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": [{"id": "1"}]}));
    assert!(app.transport.requests()[0].url.contains("api.instagram.com"));
    assert!(app.cache.get("instagram__feed").await.unwrap().is_some());
}

#[tokio::test]
async fn feed_serves_cache_on_repeat() {
    let app = TestApp::new().await;
    app.cache
        .set(
            "twitter_42_feed",
            json!([{"text": "cached"}]).to_string(),
            Duration::from_secs(3600),
        )
        .await
        .unwrap();

    let (status, body) = app.get("/feed?source=twitter&user_id=42").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"text": "cached"}]));
    assert_eq!(app.transport.request_count(), 0);
}

#[tokio::test]
async fn feed_fetches_twitter_for_user() {
    let app = TestApp::new().await;
    app.transport.respond_json(200, json!([{"id_str": "9"}]));

    let (status, body) = app.get("/feed?source=twitter&user_id=42").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"id_str": "9"}]));
    assert!(app.cache.get("twitter_42_feed").await.unwrap().is_some());
    assert!(app.transport.requests()[0]
        .header_value("authorization")
        .unwrap()
        .starts_with("OAuth "));
}

#[tokio::test]
async fn feed_rejects_unknown_source() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/feed?source=myspace").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Unsupported provider: myspace"}));
    assert_eq!(app.transport.request_count(), 0);
}

#[tokio::test]
async fn feed_passes_provider_error_through() {
    let app = TestApp::new().await;
    let error = json!({"errors": [{"code": 89, "message": "Invalid or expired token."}]});
    app.transport.respond_json(401, error.clone());

    let (status, body) = app.get("/feed?source=twitter").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, error);
    assert!(app.cache.get("twitter__feed").await.unwrap().is_none());
}

#[tokio::test]
async fn feed_transport_failure_is_bad_gateway() {
    let app = TestApp::new().await;
    app.transport.fail("connection refused");

    let (status, body) = app.get("/feed").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
}
