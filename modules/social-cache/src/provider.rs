use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SocialError;

/// Parsed provider payload, returned to callers untouched.
pub type FeedData = serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Twitter,
    Instagram,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Twitter => "twitter",
            Provider::Instagram => "instagram",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = SocialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "twitter" => Ok(Provider::Twitter),
            "instagram" => Ok(Provider::Instagram),
            other => Err(SocialError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Whose feed, from where.
///
/// An absent `user_id` still yields a well-formed cache key with an empty middle
/// segment, so every anonymous request for a provider shares one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedIdentity {
    pub provider: Provider,
    pub user_id: Option<String>,
}

impl FeedIdentity {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            user_id: None,
        }
    }

    pub fn with_user(provider: Provider, user_id: impl Into<String>) -> Self {
        Self {
            provider,
            user_id: Some(user_id.into()),
        }
    }

    /// The user id, treating `Some("")` as absent.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|id| !id.is_empty())
    }

    /// `<provider>_<user_id>_feed`
    pub fn cache_key(&self) -> String {
        format!("{}_{}_feed", self.provider, self.user_id().unwrap_or(""))
    }
}
