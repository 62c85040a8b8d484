//! Canonical signing text construction.
//!
//! The canonical text of a message is the concatenation of its parameters as
//! `key=value` pairs, sorted by key, followed immediately by the raw body:
//!
//! ```text
//! key1=value1key2=value2...<body>
//! ```
//!
//! There is no delimiter between pairs and values are used as decoded, without
//! re-encoding. The signing input then wraps the canonical text:
//!
//! ```text
//! <path><canonical text><timestamp><secret>
//! ```
//!
//! The digest is always taken over the raw bytes of the path and body. Text
//! renderings such as [`canonicalize`] exist for diagnostics and are lossy for
//! bodies that are not UTF-8.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

/// Parameter name to single value, ordered by name.
pub type ParameterSet = BTreeMap<String, String>;

/// Serialize `params` and `body` into the canonical text.
///
/// Keys come out in ascending byte order regardless of how the set was built,
/// so two parameter sets with the same entries always canonicalize the same.
///
/// # Examples
///
/// ```
/// use apisign_auth::canonical::{ParameterSet, canonicalize};
///
/// let mut params = ParameterSet::new();
/// params.insert("data".to_owned(), "a".to_owned());
/// params.insert("a".to_owned(), "b".to_owned());
/// assert_eq!(canonicalize(&params, ""), "a=bdata=a");
/// assert_eq!(canonicalize(&ParameterSet::new(), "{\"a\":1}"), "{\"a\":1}");
/// ```
#[must_use]
pub fn canonicalize(params: &ParameterSet, body: &str) -> String {
    let capacity = params
        .iter()
        .map(|(k, v)| k.len() + v.len() + 1)
        .sum::<usize>()
        + body.len();

    let mut text = String::with_capacity(capacity);
    for (key, value) in params {
        text.push_str(key);
        text.push('=');
        text.push_str(value);
    }
    text.push_str(body);
    text
}

/// Build the full signing input from its components.
#[must_use]
pub fn build_signing_input(
    path: &str,
    canonical_text: &str,
    timestamp: &str,
    secret_key: &str,
) -> String {
    format!("{path}{canonical_text}{timestamp}{secret_key}")
}

/// Compute the lowercase hex SHA-256 digest of the signing input.
///
/// # Examples
///
/// ```
/// use apisign_auth::canonical::compute_signature;
///
/// assert_eq!(
///     compute_signature(""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn compute_signature(signing_input: &str) -> String {
    hex::encode(Sha256::digest(signing_input.as_bytes()))
}

/// Hash the signing input from its components without building it as text.
///
/// Equivalent to [`compute_signature`] over
/// [`build_signing_input`]`(path, canonicalize(params, body), timestamp, secret_key)`
/// when `path` and `body` are UTF-8, but every byte of a non-UTF-8 body or
/// path is hashed as-is.
///
/// # Examples
///
/// ```
/// use apisign_auth::canonical::{ParameterSet, compute_signature, digest_signing_input};
///
/// let mut params = ParameterSet::new();
/// params.insert("a".to_owned(), "b".to_owned());
/// assert_eq!(
///     digest_signing_input(b"/v1", &params, b"", "1700000000", "sk"),
///     compute_signature("/v1a=b1700000000sk")
/// );
/// ```
#[must_use]
pub fn digest_signing_input(
    path: &[u8],
    params: &ParameterSet,
    body: &[u8],
    timestamp: &str,
    secret_key: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path);
    for (key, value) in params {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }
    hasher.update(body);
    hasher.update(timestamp.as_bytes());
    hasher.update(secret_key.as_bytes());
    hex::encode(hasher.finalize())
}
