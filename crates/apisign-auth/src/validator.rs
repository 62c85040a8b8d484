//! Signature validation for incoming requests and signed responses.
//!
//! Request validation runs its checks in a fixed order and stops at the first
//! failure:
//!
//! 1. timestamp header present and numeric
//! 2. timestamp within the expiry window (when enabled)
//! 3. signing material extractable from the request
//! 4. transmitted signature equal to the recomputed one
//!
//! Timestamps in the future are accepted. Response validation checks that all
//! three signing headers are present, then the access key, then the
//! signature. Responses are never checked for expiry.

use std::fmt;

use bytes::Bytes;
use http_body::Body;
use http_body_util::Full;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::body::{buffer_request, buffer_response, restore_request, restore_response};
use crate::canonical::ParameterSet;
use crate::error::{Rejected, RejectedRequest, RejectedResponse, SignError, SignResult};
use crate::headers::{HEADER_ACCESS_KEY, HEADER_SIGNATURE, HEADER_TIMESTAMP, header_str};
use crate::signer::{Signer, unix_now};

impl Signer {
    /// Validate a buffered incoming request against the current time.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::MissingTimestamp`], [`SignError::TimestampParse`],
    /// [`SignError::ExpiredSignature`], any extraction error, or
    /// [`SignError::SignatureMismatch`], whichever check fails first.
    pub fn validate_request_parts(
        &self,
        parts: &http::request::Parts,
        body: &[u8],
    ) -> SignResult<()> {
        self.validate_request_parts_at(parts, body, unix_now())
    }

    /// Validate a buffered incoming request as of `now` (Unix seconds).
    ///
    /// # Errors
    ///
    /// See [`Signer::validate_request_parts`].
    pub fn validate_request_parts_at(
        &self,
        parts: &http::request::Parts,
        body: &[u8],
        now: i64,
    ) -> SignResult<()> {
        let (raw_timestamp, timestamp) = parse_timestamp(&parts.headers)?;
        self.check_expiry(timestamp, now)?;

        let expected = self.build_request_signature(parts, body, raw_timestamp.to_owned())?;
        let provided = header_str(&parts.headers, HEADER_SIGNATURE).unwrap_or_default();

        if signatures_match(&expected.signature, provided) {
            debug!(
                access_key_id = %expected.access_key_id,
                path = %parts.uri.path(),
                timestamp = %expected.timestamp,
                "request signature verified"
            );
            Ok(())
        } else {
            debug!(
                path = %parts.uri.path(),
                provided,
                "request signature mismatch"
            );
            Err(SignError::SignatureMismatch)
        }
    }

    /// Buffer and validate an incoming request.
    ///
    /// The request is handed back with a body byte-for-byte identical to the
    /// one it arrived with, inside the [`Rejected`] error when validation
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::BodyRead`] (without a request) if the body cannot
    /// be read, or any error from [`Signer::validate_request_parts`].
    pub async fn validate_incoming_request<B>(
        &self,
        request: http::Request<B>,
    ) -> Result<http::Request<Full<Bytes>>, RejectedRequest>
    where
        B: Body,
        B::Error: fmt::Display,
    {
        let (parts, body) = buffer_request(request).await?;
        let outcome = self.validate_request_parts(&parts, &body);
        let request = restore_request(parts, body);
        match outcome {
            Ok(()) => Ok(request),
            Err(error) => Err(Rejected::with_message(error, request)),
        }
    }

    /// Validate a buffered response to the request at `request_path`.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::MissingHeader`] naming the first absent signing
    /// header, [`SignError::AccessKeyMismatch`], or
    /// [`SignError::SignatureMismatch`].
    pub fn validate_response_parts(
        &self,
        request_path: &str,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> SignResult<()> {
        let timestamp = required_header(&parts.headers, HEADER_TIMESTAMP, "timestamp")?;
        let provided = required_header(&parts.headers, HEADER_SIGNATURE, "signature")?;
        let access_key = required_header(&parts.headers, HEADER_ACCESS_KEY, "access key")?;

        if access_key != self.credential().access_key_id() {
            debug!(access_key, "response access key mismatch");
            return Err(SignError::AccessKeyMismatch);
        }

        let expected =
            self.build_signature(request_path, &ParameterSet::new(), body, timestamp.to_owned());

        if signatures_match(&expected.signature, provided) {
            debug!(path = request_path, timestamp, "response signature verified");
            Ok(())
        } else {
            debug!(path = request_path, provided, "response signature mismatch");
            Err(SignError::SignatureMismatch)
        }
    }

    /// Buffer and validate a response to the request at `request_path`.
    ///
    /// The response is handed back with its body intact, inside the
    /// [`Rejected`] error when validation fails.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::BodyRead`] (without a response) if the body cannot
    /// be read, or any error from [`Signer::validate_response_parts`].
    pub async fn validate_response<B>(
        &self,
        request_path: &str,
        response: http::Response<B>,
    ) -> Result<http::Response<Full<Bytes>>, RejectedResponse>
    where
        B: Body,
        B::Error: fmt::Display,
    {
        let (parts, body) = buffer_response(response).await?;
        let outcome = self.validate_response_parts(request_path, &parts, &body);
        let response = restore_response(parts, body);
        match outcome {
            Ok(()) => Ok(response),
            Err(error) => Err(Rejected::with_message(error, response)),
        }
    }

    /// Reject timestamps older than the expiry window.
    fn check_expiry(&self, timestamp: i64, now: i64) -> SignResult<()> {
        let window = self.credential().expiry_window_seconds();
        if window <= 0 {
            return Ok(());
        }

        let age = now.saturating_sub(timestamp);
        if age > window {
            debug!(age, window, "request timestamp expired");
            return Err(SignError::ExpiredSignature { age, window });
        }
        Ok(())
    }
}

/// Read the request timestamp header as both its raw text and its value.
fn parse_timestamp(headers: &http::HeaderMap) -> SignResult<(&str, i64)> {
    let value = headers
        .get(HEADER_TIMESTAMP)
        .ok_or(SignError::MissingTimestamp)?;
    if value.is_empty() {
        return Err(SignError::MissingTimestamp);
    }

    let raw = value
        .to_str()
        .map_err(|_| SignError::TimestampParse(format!("{value:?}")))?;
    let parsed = raw
        .parse::<i64>()
        .map_err(|_| SignError::TimestampParse(raw.to_owned()))?;
    Ok((raw, parsed))
}

/// Read a non-empty response header or fail naming it.
fn required_header<'a>(
    headers: &'a http::HeaderMap,
    name: &str,
    label: &'static str,
) -> SignResult<&'a str> {
    header_str(headers, name)
        .filter(|v| !v.is_empty())
        .ok_or(SignError::MissingHeader(label))
}

/// Compare two hex signatures in constant time.
fn signatures_match(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}
