//! Response body type for the signing service.
//!
//! The response signature covers the whole body, so handler output is held in
//! memory until the signing headers are attached and then sent in one frame.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::Full;

/// Body of every response the signing service sends.
#[derive(Debug, Default)]
pub enum ApiResponseBody {
    /// Handler output or a JSON error document, byte-for-byte as signed.
    Payload(Full<Bytes>),
    /// No content; signs as an empty body.
    #[default]
    Empty,
}

impl ApiResponseBody {
    /// Wrap response bytes; an empty buffer becomes [`ApiResponseBody::Empty`].
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        if data.is_empty() {
            Self::Empty
        } else {
            Self::Payload(Full::new(data))
        }
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }
}

impl http_body::Body for ApiResponseBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Payload(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Payload(full) => full.is_end_stream(),
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Payload(full) => full.size_hint(),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}
