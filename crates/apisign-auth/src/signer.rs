//! Signature construction for outgoing requests and response bodies.
//!
//! The signature over a message is:
//!
//! ```text
//! hex(SHA-256(path + canonical_text + timestamp + secret_key))
//! ```
//!
//! Request signing covers the query and form parameters (or the raw JSON body)
//! and writes the three signing headers onto the request in place. Response
//! signing covers the body only and returns the result for the caller to
//! attach.
//!
//! The path is signed percent-decoded, so `/v1/a%20b` and `/v1/a b` sign the
//! same.

use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;
use http::HeaderValue;
use http_body::Body;
use http_body_util::Full;
use percent_encoding::percent_decode_str;
use tracing::debug;

use crate::body::{buffer_request, restore_request};
use crate::canonical::{ParameterSet, build_signing_input, canonicalize, digest_signing_input};
use crate::credentials::Credential;
use crate::error::{Rejected, RejectedRequest, SignError, SignResult};
use crate::extract::extract;
use crate::headers::{
    HEADER_TIMESTAMP, access_key_header, header_str, signature_header, timestamp_header,
};

/// Current Unix time in whole seconds.
#[must_use]
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// The outcome of a signing operation.
#[derive(Clone, PartialEq, Eq)]
pub struct SignatureResult {
    /// Text rendering of the signing input, for diagnostics. Contains the
    /// secret key. Non-UTF-8 path or body bytes appear as U+FFFD here but
    /// are hashed unchanged.
    pub final_text: String,
    /// Decimal Unix timestamp included in the signature.
    pub timestamp: String,
    /// Lowercase hex SHA-256 signature.
    pub signature: String,
    /// Access key identifier of the signing credential.
    pub access_key_id: String,
}

impl fmt::Debug for SignatureResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureResult")
            .field("final_text", &"...")
            .field("timestamp", &self.timestamp)
            .field("signature", &self.signature)
            .field("access_key_id", &self.access_key_id)
            .finish()
    }
}

impl SignatureResult {
    /// Write the access key, timestamp and signature headers.
    ///
    /// Either all three headers are written or none is.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::InvalidHeaderValue`] if a field cannot be carried
    /// in an HTTP header.
    pub fn apply_to(&self, headers: &mut http::HeaderMap) -> SignResult<()> {
        let timestamp = HeaderValue::from_str(&self.timestamp)
            .map_err(|_| SignError::InvalidHeaderValue("timestamp"))?;
        let signature = HeaderValue::from_str(&self.signature)
            .map_err(|_| SignError::InvalidHeaderValue("signature"))?;
        let access_key = HeaderValue::from_str(&self.access_key_id)
            .map_err(|_| SignError::InvalidHeaderValue("access key"))?;

        headers.insert(timestamp_header(), timestamp);
        headers.insert(access_key_header(), access_key);
        headers.insert(signature_header(), signature);
        Ok(())
    }
}

/// Signs and validates messages with a single shared-secret [`Credential`].
///
/// A `Signer` holds no mutable state and can be cloned or shared across
/// threads freely.
///
/// # Examples
///
/// ```
/// use apisign_auth::{Credential, Signer};
///
/// let signer = Signer::new(Credential::new("ak", "sk", 3600));
///
/// let (mut parts, ()) = http::Request::builder()
///     .method("POST")
///     .uri("https://api.example.com/v1/photos/generate?data=a")
///     .body(())
///     .unwrap()
///     .into_parts();
///
/// let result = signer.sign_request_parts(&mut parts, b"a=b&d=c").unwrap();
/// assert_eq!(result.signature.len(), 64);
/// assert!(signer.validate_request_parts(&parts, b"a=b&d=c").is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Signer {
    credential: Credential,
}

impl Signer {
    /// Create a signer for the given credential.
    #[must_use]
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    /// The credential this signer uses.
    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Sign a buffered request in place using the current time.
    ///
    /// A timestamp header already present on the request is reused.
    ///
    /// # Errors
    ///
    /// Propagates extraction errors unchanged, and returns
    /// [`SignError::InvalidHeaderValue`] if the headers cannot be written.
    pub fn sign_request_parts(
        &self,
        parts: &mut http::request::Parts,
        body: &[u8],
    ) -> SignResult<SignatureResult> {
        self.sign_request_parts_at(parts, body, unix_now())
    }

    /// Sign a buffered request in place, using `now` when the request carries
    /// no timestamp header.
    ///
    /// # Errors
    ///
    /// See [`Signer::sign_request_parts`].
    pub fn sign_request_parts_at(
        &self,
        parts: &mut http::request::Parts,
        body: &[u8],
        now: i64,
    ) -> SignResult<SignatureResult> {
        let timestamp = header_str(&parts.headers, HEADER_TIMESTAMP)
            .filter(|ts| !ts.is_empty())
            .map_or_else(|| now.to_string(), ToOwned::to_owned);

        let result = self.build_request_signature(parts, body, timestamp)?;
        result.apply_to(&mut parts.headers)?;

        debug!(
            access_key_id = %result.access_key_id,
            path = %parts.uri.path(),
            timestamp = %result.timestamp,
            "signed outgoing request"
        );
        Ok(result)
    }

    /// Buffer, sign and rebuild an outgoing request.
    ///
    /// The returned request carries the signing headers and a body that is
    /// byte-for-byte identical to the original. When signing fails after the
    /// body was read, the unsigned request comes back inside the error.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::BodyRead`] (without a request) if the body cannot
    /// be read, or any error from [`Signer::sign_request_parts`].
    pub async fn sign_outgoing_request<B>(
        &self,
        request: http::Request<B>,
    ) -> Result<(http::Request<Full<Bytes>>, SignatureResult), RejectedRequest>
    where
        B: Body,
        B::Error: fmt::Display,
    {
        let (mut parts, body) = buffer_request(request).await?;
        match self.sign_request_parts(&mut parts, &body) {
            Ok(result) => Ok((restore_request(parts, body), result)),
            Err(error) => Err(Rejected::with_message(error, restore_request(parts, body))),
        }
    }

    /// Sign a response body for the request at `path` using the current time.
    ///
    /// Nothing is mutated; attach the result with [`SignatureResult::apply_to`].
    #[must_use]
    pub fn sign_response_body(&self, path: &str, body: &[u8]) -> SignatureResult {
        self.sign_response_body_at(path, body, unix_now())
    }

    /// Sign a response body with an explicit timestamp.
    #[must_use]
    pub fn sign_response_body_at(&self, path: &str, body: &[u8], now: i64) -> SignatureResult {
        let result = self.build_signature(path, &ParameterSet::new(), body, now.to_string());
        debug!(
            access_key_id = %result.access_key_id,
            path,
            timestamp = %result.timestamp,
            "signed response body"
        );
        result
    }

    /// Extract signing material from a request and compute its signature for
    /// `timestamp`.
    pub(crate) fn build_request_signature(
        &self,
        parts: &http::request::Parts,
        body: &[u8],
        timestamp: String,
    ) -> SignResult<SignatureResult> {
        let extracted = extract(parts, body)?;
        Ok(self.build_signature(
            parts.uri.path(),
            &extracted.params,
            extracted.body,
            timestamp,
        ))
    }

    /// Compute the signature over `path`, `params`, `body` and `timestamp`.
    ///
    /// `path` is the request path as it appears in the URI and is
    /// percent-decoded before hashing.
    pub(crate) fn build_signature(
        &self,
        path: &str,
        params: &ParameterSet,
        body: &[u8],
        timestamp: String,
    ) -> SignatureResult {
        let path: Cow<'_, [u8]> = percent_decode_str(path).into();
        let secret_key = self.credential.secret_key();

        let signature = digest_signing_input(&path, params, body, &timestamp, secret_key);
        let final_text = build_signing_input(
            &String::from_utf8_lossy(&path),
            &canonicalize(params, &String::from_utf8_lossy(body)),
            &timestamp,
            secret_key,
        );

        SignatureResult {
            final_text,
            timestamp,
            signature,
            access_key_id: self.credential.access_key_id().to_owned(),
        }
    }
}
