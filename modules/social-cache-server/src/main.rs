use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use social_cache::{
    Config, CredentialStore, FeedFetcher, FileCredentialStore, InstagramAuthenticator,
    MemoryCredentialStore, MemoryFeedCache, ReqwestTransport,
};

mod routes;

#[cfg(test)]
mod integration_tests;

pub struct AppState {
    pub fetcher: FeedFetcher,
    pub authenticator: InstagramAuthenticator,
    pub config: Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("social_cache=info".parse()?))
        .init();

    let config = Config::from_env();

    let credentials: Arc<dyn CredentialStore> = match &config.credentials_path {
        Some(path) => {
            info!(path = %path.display(), "Using file-backed credential store");
            Arc::new(FileCredentialStore::open(path).await?)
        }
        None => {
            info!("CREDENTIALS_PATH not set, credentials will not survive a restart");
            Arc::new(MemoryCredentialStore::new())
        }
    };
    config.seed(credentials.as_ref()).await?;

    let transport = Arc::new(ReqwestTransport::new());
    let fetcher = FeedFetcher::builder(
        credentials.clone(),
        Arc::new(MemoryFeedCache::new()),
        transport.clone(),
    )
    .ttl(config.feed_cache_ttl)
    .require_user_id(config.require_user_id)
    .build();
    let authenticator = InstagramAuthenticator::new(credentials, transport, config.redirect_uri());

    let addr = config.bind_addr();
    let state = Arc::new(AppState {
        fetcher,
        authenticator,
        config,
    });
    let app = routes::build_router(state);

    info!("Social cache starting on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
