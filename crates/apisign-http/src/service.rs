//! Hyper `Service` that enforces request signatures and signs responses.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use apisign_auth::Signer;
use apisign_auth::body::buffer_request;
use bytes::Bytes;
use http_body::Body;
use tracing::{debug, warn};

use crate::body::ApiResponseBody;
use crate::handler::SignedHandler;
use crate::response::{REQUEST_ID_HEADER, error_to_response};

/// Configuration for the signing service.
#[derive(Debug, Clone)]
pub struct SignatureHttpConfig {
    /// Whether successful response bodies are signed.
    pub sign_responses: bool,
}

impl Default for SignatureHttpConfig {
    fn default() -> Self {
        Self {
            sign_responses: true,
        }
    }
}

/// Hyper `Service` wrapping a [`SignedHandler`].
///
/// Every request is buffered and validated before the handler sees it.
/// Rejected requests get a JSON error response and never reach the handler.
/// When enabled, the handler's response body is signed for the request path
/// and the three signing headers are attached to the response.
#[derive(Debug)]
pub struct SignatureService<H: SignedHandler> {
    handler: Arc<H>,
    signer: Arc<Signer>,
    config: Arc<SignatureHttpConfig>,
}

impl<H: SignedHandler> SignatureService<H> {
    /// Create a new `SignatureService`.
    pub fn new(handler: Arc<H>, signer: Signer, config: SignatureHttpConfig) -> Self {
        Self {
            handler,
            signer: Arc::new(signer),
            config: Arc::new(config),
        }
    }
}

impl<H: SignedHandler> Clone for SignatureService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            signer: Arc::clone(&self.signer),
            config: Arc::clone(&self.config),
        }
    }
}

impl<H, B> hyper::service::Service<http::Request<B>> for SignatureService<H>
where
    H: SignedHandler,
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: fmt::Display,
{
    type Response = http::Response<ApiResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let signer = Arc::clone(&self.signer);
        let config = Arc::clone(&self.config);
        let request_id = uuid::Uuid::new_v4().to_string();

        Box::pin(async move {
            let response =
                process_request(req, handler.as_ref(), &signer, &config, &request_id).await;
            Ok(add_request_id(response, &request_id))
        })
    }
}

/// Run a single request through validation, the handler and response signing.
async fn process_request<H, B>(
    req: http::Request<B>,
    handler: &H,
    signer: &Signer,
    config: &SignatureHttpConfig,
    request_id: &str,
) -> http::Response<ApiResponseBody>
where
    H: SignedHandler,
    B: Body,
    B::Error: fmt::Display,
{
    // 1. Buffer the body so it can be both verified and handed on.
    let (parts, body) = match buffer_request(req).await {
        Ok(buffered) => buffered,
        Err(err) => {
            warn!(request_id, error = %err, "failed to read request body");
            return error_to_response(&err, request_id);
        }
    };

    // 2. Validate the request signature.
    if let Err(err) = signer.validate_request_parts(&parts, &body) {
        warn!(
            request_id,
            method = %parts.method,
            path = %parts.uri.path(),
            error = %err,
            "rejected request"
        );
        return error_to_response(&err, request_id);
    }

    // 3. Dispatch to the handler with the restored request.
    let path = parts.uri.path().to_owned();
    debug!(request_id, path = %path, "dispatching authenticated request");
    let response = handler.handle(http::Request::from_parts(parts, body)).await;

    // 4. Sign the response body.
    let (mut parts, body) = response.into_parts();
    if config.sign_responses {
        let signature = signer.sign_response_body(&path, &body);
        if let Err(err) = signature.apply_to(&mut parts.headers) {
            warn!(request_id, error = %err, "failed to sign response");
            return error_to_response(&err, request_id);
        }
    }

    http::Response::from_parts(parts, ApiResponseBody::from_bytes(body))
}

/// Attach the request id unless the handler already set one.
fn add_request_id(
    mut response: http::Response<ApiResponseBody>,
    request_id: &str,
) -> http::Response<ApiResponseBody> {
    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        response.headers_mut().entry(REQUEST_ID_HEADER).or_insert(hv);
    }
    response
}

/// Sign a handler response directly, outside of the service pipeline.
///
/// Useful for handlers that build responses on their own transport.
///
/// # Errors
///
/// Returns [`apisign_auth::SignError::InvalidHeaderValue`] if the signing
/// headers cannot be written.
pub fn sign_response(
    signer: &Signer,
    request_path: &str,
    response: http::Response<Bytes>,
) -> apisign_auth::SignResult<http::Response<Bytes>> {
    let (mut parts, body) = response.into_parts();
    signer
        .sign_response_body(request_path, &body)
        .apply_to(&mut parts.headers)?;
    Ok(http::Response::from_parts(parts, body))
}
