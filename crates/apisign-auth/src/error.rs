//! Error types for request and response signing.
//!
//! Every failure surfaced by signing or validation is a [`SignError`]. None of
//! them are retried internally; a validation call reports exactly the first
//! check that failed.

use std::fmt;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;

/// Errors that can occur while signing or validating a message.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    /// The `Content-Type` header could not be parsed as a media type.
    #[error("failed to parse content type: {0}")]
    ContentTypeParse(String),

    /// The declared content type is neither JSON nor form-urlencoded.
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// A form-urlencoded body could not be parsed.
    #[error("failed to parse form data: {0}")]
    FormParse(String),

    /// The message body could not be read.
    #[error("failed to read body: {0}")]
    BodyRead(String),

    /// The timestamp header is absent from the request.
    #[error("timestamp missing in request header")]
    MissingTimestamp,

    /// The timestamp header is not a decimal Unix timestamp.
    #[error("invalid timestamp: {0}")]
    TimestampParse(String),

    /// The request timestamp is older than the expiry window allows.
    #[error("timestamp expired: age {age}s exceeds window {window}s")]
    ExpiredSignature {
        /// Seconds elapsed since the request timestamp.
        age: i64,
        /// Configured expiry window in seconds.
        window: i64,
    },

    /// A required signing header is absent from the response.
    #[error("{0} missing in response header")]
    MissingHeader(&'static str),

    /// The response was signed with a different access key.
    #[error("access key validation failed")]
    AccessKeyMismatch,

    /// The computed signature does not match the transmitted one.
    #[error("signature validation failed")]
    SignatureMismatch,

    /// A signing field cannot be carried in an HTTP header value.
    #[error("invalid header value for {0}")]
    InvalidHeaderValue(&'static str),
}

impl SignError {
    /// Short machine-readable code for the error, used in error bodies.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ContentTypeParse(_) => "ContentTypeParseError",
            Self::UnsupportedContentType(_) => "UnsupportedContentTypeError",
            Self::FormParse(_) => "FormParseError",
            Self::BodyRead(_) => "BodyReadError",
            Self::MissingTimestamp => "MissingTimestampError",
            Self::TimestampParse(_) => "TimestampParseError",
            Self::ExpiredSignature { .. } => "ExpiredSignatureError",
            Self::MissingHeader(_) => "MissingHeaderError",
            Self::AccessKeyMismatch => "AccessKeyMismatchError",
            Self::SignatureMismatch => "SignatureMismatchError",
            Self::InvalidHeaderValue(_) => "InvalidHeaderValueError",
        }
    }

    /// HTTP status a transport binding should answer with for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ContentTypeParse(_)
            | Self::FormParse(_)
            | Self::BodyRead(_)
            | Self::TimestampParse(_)
            | Self::InvalidHeaderValue(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::MissingTimestamp
            | Self::ExpiredSignature { .. }
            | Self::MissingHeader(_)
            | Self::AccessKeyMismatch
            | Self::SignatureMismatch => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Convenience result type for signing operations.
pub type SignResult<T> = Result<T, SignError>;

/// A failed sign or validate call that hands the buffered message back.
///
/// `message` is the message rebuilt around the exact bytes that were read. It
/// is `None` only when the body itself could not be read.
#[derive(Debug)]
pub struct Rejected<M> {
    /// Why the call failed.
    pub error: SignError,
    /// The message, with its body intact.
    pub message: Option<M>,
}

/// A rejected request with its buffered body.
pub type RejectedRequest = Rejected<http::Request<Full<Bytes>>>;

/// A rejected response with its buffered body.
pub type RejectedResponse = Rejected<http::Response<Full<Bytes>>>;

impl<M> Rejected<M> {
    /// Pair an error with the message it was raised for.
    #[must_use]
    pub fn with_message(error: SignError, message: M) -> Self {
        Self {
            error,
            message: Some(message),
        }
    }
}

impl<M> From<SignError> for Rejected<M> {
    fn from(error: SignError) -> Self {
        Self {
            error,
            message: None,
        }
    }
}

impl<M> From<Rejected<M>> for SignError {
    fn from(rejected: Rejected<M>) -> Self {
        rejected.error
    }
}

impl<M> fmt::Display for Rejected<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<M: fmt::Debug> std::error::Error for Rejected<M> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_name_offending_content_type() {
        let err = SignError::UnsupportedContentType("text/plain".to_owned());
        assert_eq!(err.to_string(), "unsupported content type: text/plain");
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_should_map_auth_failures_to_unauthorized() {
        for err in [
            SignError::MissingTimestamp,
            SignError::ExpiredSignature {
                age: 3601,
                window: 3600,
            },
            SignError::MissingHeader("signature"),
            SignError::AccessKeyMismatch,
            SignError::SignatureMismatch,
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED, "{err}");
        }
    }

    #[test]
    fn test_should_expose_stable_error_codes() {
        assert_eq!(SignError::SignatureMismatch.code(), "SignatureMismatchError");
        assert_eq!(
            SignError::FormParse("bad escape".to_owned()).code(),
            "FormParseError"
        );
    }

    #[test]
    fn test_should_keep_message_alongside_error() {
        let rejected = Rejected::with_message(SignError::SignatureMismatch, "payload");
        assert_eq!(rejected.to_string(), "signature validation failed");
        assert_eq!(rejected.message, Some("payload"));

        let bare: Rejected<&str> = SignError::BodyRead("reset".to_owned()).into();
        assert!(bare.message.is_none());
        assert!(matches!(SignError::from(bare), SignError::BodyRead(_)));
    }
}
