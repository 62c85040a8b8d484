//! Handler trait behind the signing service.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

/// Boxed future returned by [`SignedHandler::handle`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = http::Response<Bytes>> + Send>>;

/// Business logic invoked for requests whose signature has been verified.
///
/// The handler receives the request with its body fully buffered and returns
/// a buffered response. The service signs that response body afterwards, so
/// the handler never deals with signing headers itself.
pub trait SignedHandler: Send + Sync + 'static {
    /// Handle an authenticated request.
    fn handle(&self, request: http::Request<Bytes>) -> HandlerFuture;
}

/// Handler that answers every request with its own body and content type.
#[derive(Debug, Clone, Default)]
pub struct EchoHandler;

impl SignedHandler for EchoHandler {
    fn handle(&self, request: http::Request<Bytes>) -> HandlerFuture {
        Box::pin(async move {
            let content_type = request.headers().get(http::header::CONTENT_TYPE).cloned();
            let mut response = http::Response::new(request.into_body());
            if let Some(ct) = content_type {
                response.headers_mut().insert(http::header::CONTENT_TYPE, ct);
            }
            response
        })
    }
}
