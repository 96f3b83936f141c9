use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::encode::percent_encode;
use crate::params::OAuthParams;

type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const VERSION: &str = "1.0";

/// Build the signature base string: `METHOD&enc(url)&enc(sorted k=v pairs joined by &)`.
///
/// `url` must be the base URI without a query string; query parameters belong in `params`.
pub fn signature_base(method: &str, url: &str, params: &OAuthParams) -> String {
    let joined = params
        .normalized()
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(url),
        percent_encode(&joined)
    )
}

/// base64(HMAC-SHA1(base, enc(consumer_secret) & enc(token_secret))).
pub fn sign(base: &str, consumer_secret: &str, token_secret: &str) -> String {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );
    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(base.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Render `OAuth k="v", k="v"` in insertion order. Values are percent-encoded, keys are not.
pub fn authorization_header(params: &OAuthParams) -> String {
    let pairs: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{k}=\"{}\"", percent_encode(v)))
        .collect();
    format!("OAuth {}", pairs.join(", "))
}

/// Fresh nonce: 32 hex chars, unique per call.
pub fn generate_nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(Clone)]
pub struct OAuth1Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

impl fmt::Debug for OAuth1Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth1Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("token", &self.token)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

/// A request about to be signed. Query parameters are part of the signature but
/// stay out of the `Authorization` header.
#[derive(Debug, Clone)]
pub struct OAuth1Request {
    method: String,
    url: String,
    query: Vec<(String, String)>,
}

/// Output of [`OAuth1Request::sign`].
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// `oauth_*` parameters in header order, `oauth_signature` last.
    pub params: OAuthParams,
    pub signature_base: String,
    pub authorization: String,
}

impl OAuth1Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            query: Vec::new(),
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn sign(&self, creds: &OAuth1Credentials, nonce: &str, timestamp: i64) -> SignedRequest {
        let mut params = OAuthParams::new()
            .with("oauth_consumer_key", creds.consumer_key.as_str())
            .with("oauth_nonce", nonce)
            .with("oauth_signature_method", SIGNATURE_METHOD)
            .with("oauth_token", creds.token.as_str())
            .with("oauth_timestamp", timestamp.to_string())
            .with("oauth_version", VERSION);

        let mut signing_set = params.clone();
        signing_set.extend(self.query.iter().cloned());

        let base = signature_base(&self.method, &self.url, &signing_set);
        let signature = sign(&base, &creds.consumer_secret, &creds.token_secret);
        params.insert("oauth_signature", signature);

        SignedRequest {
            authorization: authorization_header(&params),
            params,
            signature_base: base,
        }
    }
}
