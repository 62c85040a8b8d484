//! Buffering and restoring message bodies.
//!
//! Signing and validation need the whole body, but the message must stay
//! usable afterwards. A body is collected into [`Bytes`] once and the message
//! is rebuilt around a [`Full`] body holding exactly the same bytes.

use bytes::Bytes;
use http_body::Body;
use http_body_util::{BodyExt, Full};

use crate::error::{SignError, SignResult};

/// Collect a body into a single buffer.
///
/// # Errors
///
/// Returns [`SignError::BodyRead`] if the underlying body yields an error.
pub async fn collect_body<B>(body: B) -> SignResult<Bytes>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    body.collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| SignError::BodyRead(e.to_string()))
}

/// Split a request into its parts and fully buffered body.
pub async fn buffer_request<B>(
    request: http::Request<B>,
) -> SignResult<(http::request::Parts, Bytes)>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let (parts, body) = request.into_parts();
    let bytes = collect_body(body).await?;
    Ok((parts, bytes))
}

/// Split a response into its parts and fully buffered body.
pub async fn buffer_response<B>(
    response: http::Response<B>,
) -> SignResult<(http::response::Parts, Bytes)>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let (parts, body) = response.into_parts();
    let bytes = collect_body(body).await?;
    Ok((parts, bytes))
}

/// Rebuild a request around a buffered body.
#[must_use]
pub fn restore_request(parts: http::request::Parts, body: Bytes) -> http::Request<Full<Bytes>> {
    http::Request::from_parts(parts, Full::new(body))
}

/// Rebuild a response around a buffered body.
#[must_use]
pub fn restore_response(
    parts: http::response::Parts,
    body: Bytes,
) -> http::Response<Full<Bytes>> {
    http::Response::from_parts(parts, Full::new(body))
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use http_body_util::StreamBody;

    use super::*;

    #[tokio::test]
    async fn test_should_restore_identical_request_body() {
        let request = http::Request::builder()
            .uri("/v1/items?x=1")
            .body(Full::new(Bytes::from_static(b"a=b&d=c")))
            .unwrap();

        let (parts, bytes) = buffer_request(request).await.unwrap();
        let restored = restore_request(parts, bytes);
        assert_eq!(restored.uri().path(), "/v1/items");

        let again = collect_body(restored.into_body()).await.unwrap();
        assert_eq!(&again[..], b"a=b&d=c");
    }

    #[tokio::test]
    async fn test_should_report_body_read_errors() {
        let frames: Vec<Result<http_body::Frame<Bytes>, std::io::Error>> = vec![
            Ok(http_body::Frame::data(Bytes::from_static(b"partial"))),
            Err(std::io::Error::other("connection reset")),
        ];
        let body = StreamBody::new(futures::stream::iter(frames));

        let err = collect_body(body).await.unwrap_err();
        assert!(matches!(err, SignError::BodyRead(msg) if msg.contains("connection reset")));
    }

    #[tokio::test]
    async fn test_should_collect_multi_frame_bodies() {
        let frames: Vec<Result<http_body::Frame<Bytes>, Infallible>> = vec![
            Ok(http_body::Frame::data(Bytes::from_static(b"{\"a\":"))),
            Ok(http_body::Frame::data(Bytes::from_static(b"1}"))),
        ];
        let body = StreamBody::new(futures::stream::iter(frames));

        let bytes = collect_body(body).await.unwrap();
        assert_eq!(&bytes[..], b"{\"a\":1}");
    }
}
