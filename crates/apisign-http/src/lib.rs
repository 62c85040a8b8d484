//! Hyper transport binding for shared-secret request signing.
//!
//! This crate wires [`apisign_auth`] into a hyper server:
//!
//! - **Service**: validates incoming request signatures and signs responses
//! - **Handler trait**: the boundary between transport and business logic
//! - **Response helpers**: JSON error responses for rejected requests

pub mod body;
pub mod handler;
pub mod response;
pub mod service;

pub use body::ApiResponseBody;
pub use handler::{EchoHandler, SignedHandler};
pub use service::{SignatureHttpConfig, SignatureService, sign_response};
