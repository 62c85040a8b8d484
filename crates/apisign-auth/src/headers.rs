//! Header field names shared by both sides of the signing contract.
//!
//! Names are lowercase so they can be used with [`http::HeaderName::from_static`].

use http::HeaderName;

/// Unix timestamp (decimal seconds) the signature was computed at.
pub const HEADER_TIMESTAMP: &str = "x-api-timestamp";

/// Lowercase hex SHA-256 signature.
pub const HEADER_SIGNATURE: &str = "x-api-signature";

/// Access key identifier of the signing credential.
pub const HEADER_ACCESS_KEY: &str = "x-api-access-key";

/// Content type assumed when a request does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Typed [`HeaderName`] for [`HEADER_TIMESTAMP`].
#[must_use]
pub fn timestamp_header() -> HeaderName {
    HeaderName::from_static(HEADER_TIMESTAMP)
}

/// Typed [`HeaderName`] for [`HEADER_SIGNATURE`].
#[must_use]
pub fn signature_header() -> HeaderName {
    HeaderName::from_static(HEADER_SIGNATURE)
}

/// Typed [`HeaderName`] for [`HEADER_ACCESS_KEY`].
#[must_use]
pub fn access_key_header() -> HeaderName {
    HeaderName::from_static(HEADER_ACCESS_KEY)
}

/// Read a header as a string, treating non-visible-ASCII values as absent.
pub(crate) fn header_str<'a>(headers: &'a http::HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
