//! Integration tests for the apisign server.
//!
//! These tests require a running `apisign-server` at `localhost:8080`
//! configured with `APISIGN_ACCESS_KEY=ak` and `APISIGN_SECRET_KEY=sk`.
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p apisign-integration -- --ignored
//! ```

use std::sync::Once;

use apisign_auth::{Credential, Signer};
use bytes::Bytes;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
#[must_use]
pub fn endpoint_url() -> String {
    std::env::var("APISIGN_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned())
}

/// Signer matching the server's test credential.
#[must_use]
pub fn test_signer() -> Signer {
    init_tracing();
    Signer::new(Credential::new("ak", "sk", 3600))
}

/// Build an `http::Request` targeting the server.
pub fn build_request(
    method: &str,
    path_and_query: &str,
    content_type: Option<&str>,
    body: &'static [u8],
) -> anyhow::Result<http::Request<Bytes>> {
    let mut builder = http::Request::builder()
        .method(method)
        .uri(format!("{}{path_and_query}", endpoint_url()));
    if let Some(ct) = content_type {
        builder = builder.header(http::header::CONTENT_TYPE, ct);
    }
    Ok(builder.body(Bytes::from_static(body))?)
}

/// Sign `request` and send it with `reqwest`, returning the raw response.
pub async fn send_signed(
    signer: &Signer,
    request: http::Request<Bytes>,
) -> anyhow::Result<http::Response<reqwest::Body>> {
    let (mut parts, body) = request.into_parts();
    signer.sign_request_parts(&mut parts, &body)?;
    send(http::Request::from_parts(parts, body)).await
}

/// Send `request` unchanged with `reqwest`.
pub async fn send(
    request: http::Request<Bytes>,
) -> anyhow::Result<http::Response<reqwest::Body>> {
    let request = reqwest::Request::try_from(request)?;
    let response = reqwest::Client::new().execute(request).await?;
    Ok(http::Response::from(response))
}

mod test_signing;
