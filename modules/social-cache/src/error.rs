use thiserror::Error;

pub type Result<T> = std::result::Result<T, SocialError>;

#[derive(Debug, Error)]
pub enum SocialError {
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("A non-empty user id is required")]
    MissingUserId,

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Network error: {0}")]
    Transport(String),

    /// Non-2xx response. `body` is the provider's payload as-is (JSON when it parses).
    #[error("Provider error (status {status})")]
    Provider {
        status: u16,
        body: serde_json::Value,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<reqwest::Error> for SocialError {
    fn from(err: reqwest::Error) -> Self {
        SocialError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for SocialError {
    fn from(err: serde_json::Error) -> Self {
        SocialError::Parse(err.to_string())
    }
}

impl From<url::ParseError> for SocialError {
    fn from(err: url::ParseError) -> Self {
        SocialError::InvalidUrl(err.to_string())
    }
}
