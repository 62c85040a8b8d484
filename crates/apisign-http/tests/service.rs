//! End-to-end tests driving [`SignatureService`] without a socket.

use std::sync::Arc;

use apisign_auth::headers::{HEADER_SIGNATURE, HEADER_TIMESTAMP};
use apisign_auth::{Credential, SignError, Signer};
use apisign_http::{ApiResponseBody, EchoHandler, SignatureHttpConfig, SignatureService};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::Service;

fn signer() -> Signer {
    Signer::new(Credential::new("ak", "sk", 3600))
}

fn service(sign_responses: bool) -> SignatureService<EchoHandler> {
    SignatureService::new(
        Arc::new(EchoHandler),
        signer(),
        SignatureHttpConfig { sign_responses },
    )
}

fn request(uri: &str, content_type: &str, body: &'static [u8]) -> http::Request<Full<Bytes>> {
    http::Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, content_type)
        .body(Full::new(Bytes::from_static(body)))
        .unwrap()
}

async fn error_code(response: http::Response<ApiResponseBody>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    json["code"].as_str().unwrap_or_default().to_owned()
}

#[tokio::test]
async fn test_should_round_trip_signed_form_request() {
    let client = signer();
    let req = request(
        "https://api.open-platform.com/v1/photos/generate?data=a",
        "application/x-www-form-urlencoded",
        b"a=b&d=c",
    );
    let (signed, _) = client.sign_outgoing_request(req).await.unwrap();

    let response = service(true).call(signed).await.unwrap();
    assert_eq!(response.status(), http::StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let validated = client
        .validate_response("/v1/photos/generate", response)
        .await
        .unwrap();
    let body = validated.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"a=b&d=c");
}

#[tokio::test]
async fn test_should_round_trip_signed_json_request() {
    let client = signer();
    let req = request("/v1/items?page=2", "application/json", br#"{"a":1}"#);
    let (signed, _) = client.sign_outgoing_request(req).await.unwrap();

    let response = service(true).call(signed).await.unwrap();
    assert_eq!(response.status(), http::StatusCode::OK);
    assert!(client.validate_response("/v1/items", response).await.is_ok());
}

#[tokio::test]
async fn test_should_reject_unsigned_request() {
    let req = request("/v1/items", "application/json", b"{}");

    let response = service(true).call(req).await.unwrap();
    assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(HEADER_SIGNATURE).is_none());
    assert_eq!(error_code(response).await, "MissingTimestampError");
}

#[tokio::test]
async fn test_should_reject_tampered_request() {
    let client = signer();
    let req = request("/v1/items", "application/json", br#"{"amount":1}"#);
    let (signed, _) = client.sign_outgoing_request(req).await.unwrap();

    let (parts, _) = signed.into_parts();
    let tampered =
        http::Request::from_parts(parts, Full::new(Bytes::from_static(br#"{"amount":9}"#)));

    let response = service(true).call(tampered).await.unwrap();
    assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(response).await, SignError::SignatureMismatch.code());
}

#[tokio::test]
async fn test_should_reject_expired_request() {
    let client = signer();
    let stale = (apisign_auth::unix_now() - 7200).to_string();
    let req = http::Request::builder()
        .method("GET")
        .uri("/v1/items?page=1")
        .header(HEADER_TIMESTAMP, stale)
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (signed, _) = client.sign_outgoing_request(req).await.unwrap();

    let response = service(true).call(signed).await.unwrap();
    assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(response).await, "ExpiredSignatureError");
}

#[tokio::test]
async fn test_should_reject_unsupported_content_type() {
    let mut req = request("/v1/upload", "text/plain", b"hello");
    req.headers_mut()
        .insert(HEADER_TIMESTAMP, http::HeaderValue::from_static("1700000000"));
    req.headers_mut()
        .insert(HEADER_SIGNATURE, http::HeaderValue::from_static("00"));

    let svc = SignatureService::new(
        Arc::new(EchoHandler),
        Signer::new(Credential::new("ak", "sk", 0)),
        SignatureHttpConfig::default(),
    );
    let response = svc.call(req).await.unwrap();
    assert_eq!(response.status(), http::StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(error_code(response).await, "UnsupportedContentTypeError");
}

#[tokio::test]
async fn test_should_skip_response_signing_when_disabled() {
    let client = signer();
    let req = request("/v1/items", "application/json", b"{}");
    let (signed, _) = client.sign_outgoing_request(req).await.unwrap();

    let response = service(false).call(signed).await.unwrap();
    assert_eq!(response.status(), http::StatusCode::OK);
    assert!(response.headers().get(HEADER_SIGNATURE).is_none());

    let rejected = client
        .validate_response("/v1/items", response)
        .await
        .unwrap_err();
    assert!(matches!(rejected.error, SignError::MissingHeader("timestamp")));

    let body = rejected.message.unwrap().into_body().collect().await;
    assert_eq!(&body.unwrap().to_bytes()[..], b"{}");
}

#[tokio::test]
async fn test_should_round_trip_percent_encoded_path() {
    let client = signer();
    let req = request("/v1/photo%20albums?name=summer%20trip", "application/json", b"{}");
    let (signed, _) = client.sign_outgoing_request(req).await.unwrap();

    let response = service(true).call(signed).await.unwrap();
    assert_eq!(response.status(), http::StatusCode::OK);
    assert!(
        client
            .validate_response("/v1/photo%20albums", response)
            .await
            .is_ok()
    );
}
