//! OAuth 1.0a request signing.
//!
//! No I/O. Fresh nonces and timestamps come from [`generate_nonce`] and
//! [`unix_timestamp`]; [`OAuth1Request::sign`] also accepts fixed values.

pub mod encode;
pub mod error;
pub mod params;
pub mod signer;

pub use encode::{percent_decode, percent_encode};
pub use error::{OAuthError, Result};
pub use params::OAuthParams;
pub use signer::{
    authorization_header, generate_nonce, sign, signature_base, unix_timestamp,
    OAuth1Credentials, OAuth1Request, SignedRequest, SIGNATURE_METHOD, VERSION,
};
