use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use social_cache::{AuthOutcome, FeedIdentity, Provider, SocialError};

use crate::AppState;

#[derive(Deserialize)]
pub struct AuthQuery {
    code: Option<String>,
}

#[derive(Deserialize)]
pub struct FeedQuery {
    source: Option<String>,
    user_id: Option<String>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/auth/instagram", get(auth_instagram))
        .route("/auth/instagram/authorize", get(authorize_instagram))
        .route("/feed", get(feed))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Method + path only; query strings carry OAuth codes.
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

// --- Handlers ---

pub async fn auth_instagram(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthQuery>,
) -> Response {
    let code = params.code.unwrap_or_default();

    match state.authenticator.authenticate(&code).await {
        Ok(AuthOutcome::Authenticated) => {
            (StatusCode::OK, Json(AuthOutcome::Authenticated.into_body())).into_response()
        }
        Ok(outcome) => (StatusCode::BAD_REQUEST, Json(outcome.into_body())).into_response(),
        Err(e) => {
            warn!(error = %e, "Instagram code exchange failed");
            error_response(e)
        }
    }
}

pub async fn authorize_instagram(State(state): State<Arc<AppState>>) -> Response {
    match state.authenticator.authorize_url().await {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(e) => {
            warn!(error = %e, "Cannot build Instagram authorize URL");
            error_response(e)
        }
    }
}

pub async fn feed(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FeedQuery>,
) -> Response {
    let provider = match params.source.as_deref().filter(|s| !s.is_empty()) {
        Some(source) => match source.parse::<Provider>() {
            Ok(p) => p,
            Err(e) => return error_response(e),
        },
        None => state.config.default_feed_source,
    };
    let identity = FeedIdentity {
        provider,
        user_id: params.user_id,
    };

    match state.fetcher.get(&identity).await {
        Ok(data) => Json(data).into_response(),
        Err(e) => {
            warn!(provider = %provider, error = %e, "Failed to serve feed");
            error_response(e)
        }
    }
}

// --- Helpers ---

/// Provider bodies pass through as-is; everything else becomes `{"error": ...}`.
fn error_response(err: SocialError) -> Response {
    let status = match &err {
        SocialError::Provider { status, body } => {
            let status = StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            return (status, Json(body.clone())).into_response();
        }
        SocialError::UnsupportedProvider(_) | SocialError::MissingUserId => {
            StatusCode::BAD_REQUEST
        }
        SocialError::Transport(_) | SocialError::Parse(_) => StatusCode::BAD_GATEWAY,
        SocialError::MissingCredential(_)
        | SocialError::InvalidUrl(_)
        | SocialError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
