//! Parameter and body extraction from HTTP requests.
//!
//! Query-string parameters always contribute to the signature. The body
//! contributes according to the declared `Content-Type`:
//!
//! - `application/json`: the raw body bytes are signed as-is.
//! - `application/x-www-form-urlencoded` (the default when no content type is
//!   declared): the body is decoded into parameters and merged over the query
//!   parameters.
//!
//! Any other content type is rejected. Only one value is kept per parameter
//! name: the first one in source order.

use tracing::trace;

use crate::canonical::ParameterSet;
use crate::error::{SignError, SignResult};
use crate::headers::DEFAULT_CONTENT_TYPE;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Signing material extracted from a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted<'a> {
    /// Raw body bytes, non-empty only for JSON bodies.
    pub body: &'a [u8],
    /// Query parameters merged with decoded form parameters.
    pub params: ParameterSet,
}

/// Extract the body text and parameter set from request parts and a buffered body.
///
/// # Errors
///
/// Returns [`SignError::ContentTypeParse`] for a malformed `Content-Type`,
/// [`SignError::UnsupportedContentType`] for anything other than JSON or form
/// data, and [`SignError::FormParse`] for a malformed form body.
pub fn extract<'a>(parts: &http::request::Parts, body: &'a [u8]) -> SignResult<Extracted<'a>> {
    let mut params = parse_query(parts.uri.query());
    let content_type = parse_content_type(&parts.headers)?;

    trace!(content_type = %content_type, body_len = body.len(), "extracting signing material");

    if content_type.contains(JSON_CONTENT_TYPE) {
        return Ok(Extracted { body, params });
    }

    if content_type.contains(DEFAULT_CONTENT_TYPE) {
        // Form values take precedence over query values with the same name.
        params.extend(parse_form(body)?);
        return Ok(Extracted { body: &[], params });
    }

    Err(SignError::UnsupportedContentType(content_type))
}

/// Decode a query string into a parameter set, keeping the first value per key.
///
/// Decoding is lenient: a pair containing `;` or an invalid percent escape is
/// skipped and the rest of the query still applies.
///
/// # Examples
///
/// ```
/// use apisign_auth::extract::parse_query;
///
/// let params = parse_query(Some("b=2&a=1&a=3&q=hello%20world&bad=%zz"));
/// assert_eq!(params["a"], "1");
/// assert_eq!(params["q"], "hello world");
/// assert!(!params.contains_key("bad"));
/// assert!(parse_query(None).is_empty());
/// ```
#[must_use]
pub fn parse_query(query: Option<&str>) -> ParameterSet {
    let mut params = ParameterSet::new();
    let pairs = query
        .into_iter()
        .flat_map(|query| query.split('&'))
        .filter(|pair| check_pair(pair).is_ok());

    for pair in pairs {
        for (key, value) in form_urlencoded::parse(pair.as_bytes()) {
            params
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
    }
    params
}

/// Parse the `Content-Type` header and return its lowercase essence
/// (`type/subtype` without parameters).
///
/// A missing or blank header yields [`DEFAULT_CONTENT_TYPE`].
///
/// # Errors
///
/// Returns [`SignError::ContentTypeParse`] if the header is not a valid media type.
pub fn parse_content_type(headers: &http::HeaderMap) -> SignResult<String> {
    let raw = match headers.get(http::header::CONTENT_TYPE) {
        None => DEFAULT_CONTENT_TYPE,
        Some(value) => value
            .to_str()
            .map_err(|e| SignError::ContentTypeParse(e.to_string()))?,
    };
    let raw = if raw.trim().is_empty() {
        DEFAULT_CONTENT_TYPE
    } else {
        raw
    };

    let media_type: mime::Mime = raw
        .parse()
        .map_err(|e: mime::FromStrError| SignError::ContentTypeParse(format!("{raw}: {e}")))?;

    Ok(media_type.essence_str().to_ascii_lowercase())
}

/// Strictly decode a form-urlencoded body, keeping the first value per key.
///
/// # Errors
///
/// Returns [`SignError::FormParse`] if the body is not UTF-8, uses `;` as a
/// separator, or contains an invalid percent escape.
///
/// # Examples
///
/// ```
/// use apisign_auth::extract::parse_form;
///
/// let params = parse_form(b"a=b&d=c").unwrap();
/// assert_eq!(params.len(), 2);
/// assert!(parse_form(b"a=%zz").is_err());
/// ```
pub fn parse_form(body: &[u8]) -> SignResult<ParameterSet> {
    let text = std::str::from_utf8(body)
        .map_err(|e| SignError::FormParse(format!("body is not valid UTF-8: {e}")))?;

    for pair in text.split('&') {
        check_pair(pair).map_err(SignError::FormParse)?;
    }

    Ok(parse_query(Some(text)))
}

/// Reject a `key=value` pair that uses `;` or carries an invalid escape.
fn check_pair(pair: &str) -> Result<(), String> {
    if pair.contains(';') {
        return Err(format!("invalid semicolon separator in {pair:?}"));
    }
    if !has_valid_escapes(pair) {
        return Err(format!("invalid URL escape in {pair:?}"));
    }
    Ok(())
}

/// Check that every `%` is followed by two hex digits.
fn has_valid_escapes(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}
