// RFC 3986 percent-encoding as OAuth 1.0a requires it: only the unreserved set
// passes through, everything else becomes uppercase %XX over UTF-8 bytes.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{OAuthError, Result};

const RESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Encode a value for use in a signature base string or `Authorization` header.
pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, RESERVED).to_string()
}

/// Inverse of [`percent_encode`].
pub fn percent_decode(value: &str) -> Result<String> {
    percent_decode_str(value)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| OAuthError::Decode(e.to_string()))
}
