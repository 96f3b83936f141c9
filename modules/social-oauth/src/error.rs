use thiserror::Error;

pub type Result<T> = std::result::Result<T, OAuthError>;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Invalid percent-encoded value: {0}")]
    Decode(String),
}
