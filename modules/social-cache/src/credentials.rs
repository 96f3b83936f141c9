// Durable credential storage. Client id/secret and Twitter tokens are configured
// out-of-band; the only value this crate writes is the Instagram access token
// (and the user id returned alongside it).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Result, SocialError};
use crate::provider::Provider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    ClientId,
    ClientSecret,
    AccessToken,
    AccessTokenSecret,
    UserId,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::ClientId => "client_id",
            CredentialKind::ClientSecret => "client_secret",
            CredentialKind::AccessToken => "access_token",
            CredentialKind::AccessTokenSecret => "access_token_secret",
            CredentialKind::UserId => "user_id",
        }
    }

    /// Storage key, e.g. `instagram_access_token`.
    pub fn key(&self, provider: Provider) -> String {
        format!("{}_{}", provider, self.as_str())
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, provider: Provider, kind: CredentialKind) -> Result<Option<String>>;
    async fn set(&self, provider: Provider, kind: CredentialKind, value: &str) -> Result<()>;
}

/// Read a credential that must be present and non-empty.
pub async fn require(
    store: &dyn CredentialStore,
    provider: Provider,
    kind: CredentialKind,
) -> Result<String> {
    match store.get(provider, kind).await? {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(SocialError::MissingCredential(kind.key(provider))),
    }
}

// ---------------------------------------------------------------------------
// MemoryCredentialStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryCredentialStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, provider: Provider, kind: CredentialKind) -> Result<Option<String>> {
        Ok(self.values.read().await.get(&kind.key(provider)).cloned())
    }

    async fn set(&self, provider: Provider, kind: CredentialKind, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(kind.key(provider), value.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileCredentialStore
// ---------------------------------------------------------------------------

/// JSON-object file keyed by `<provider>_<kind>`. Every `set` rewrites the whole
/// file through a sibling temp file and a rename.
pub struct FileCredentialStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FileCredentialStore {
    /// Load `path`, starting empty if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match tokio::fs::read_to_string(&path).await {
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                SocialError::Store(format!("{}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Credential file not found, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(SocialError::Store(format!("{}: {e}", path.display()))),
        };

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, provider: Provider, kind: CredentialKind) -> Result<Option<String>> {
        Ok(self.values.read().await.get(&kind.key(provider)).cloned())
    }

    async fn set(&self, provider: Provider, kind: CredentialKind, value: &str) -> Result<()> {
        let mut values = self.values.write().await;
        // Memory only changes once the file holds the new value.
        let mut next = values.clone();
        next.insert(kind.key(provider), value.to_string());

        let text = serde_json::to_string_pretty(&next)
            .map_err(|e| SocialError::Store(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, text)
            .await
            .map_err(|e| SocialError::Store(format!("{}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| SocialError::Store(format!("{}: {e}", self.path.display())))?;
        *values = next;

        info!(key = %kind.key(provider), "Stored credential");
        Ok(())
    }
}
