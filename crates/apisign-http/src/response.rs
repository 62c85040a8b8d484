//! Error response formatting.

use apisign_auth::SignError;

use crate::body::ApiResponseBody;

/// Content type of error bodies.
pub const CONTENT_TYPE: &str = "application/json";

/// Header carrying the per-request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Convert a [`SignError`] into a JSON error response.
///
/// The body has the shape `{"code": "...", "message": "..."}` and the status
/// comes from [`SignError::status_code`].
#[must_use]
pub fn error_to_response(err: &SignError, request_id: &str) -> http::Response<ApiResponseBody> {
    let body = serde_json::json!({
        "code": err.code(),
        "message": err.to_string(),
    });
    let bytes = serde_json::to_vec(&body).unwrap_or_default();

    let mut builder = http::Response::builder()
        .status(err.status_code())
        .header(http::header::CONTENT_TYPE, CONTENT_TYPE);
    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        builder = builder.header(REQUEST_ID_HEADER, hv);
    }

    builder
        .body(ApiResponseBody::from_bytes(bytes))
        .unwrap_or_else(|_| {
            let mut response = http::Response::new(ApiResponseBody::empty());
            *response.status_mut() = err.status_code();
            response
        })
}
