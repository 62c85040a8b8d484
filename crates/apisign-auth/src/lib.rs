//! Shared-secret request and response signing.
//!
//! This crate signs and validates HTTP messages with a symmetric, time-bounded
//! signature. The signature proves the sender holds the shared secret without
//! ever transmitting it:
//!
//! ```text
//! signature = hex(SHA-256(path + canonical_text + timestamp + secret_key))
//! ```
//!
//! where `path` is the percent-decoded request path and `canonical_text` is
//! the sorted `key=value` concatenation of the query and form parameters
//! followed by the raw JSON body bytes, if any. The signature,
//! timestamp and access key travel in three headers (see [`headers`]).
//!
//! # Usage
//!
//! ```rust
//! use apisign_auth::{Credential, Signer};
//!
//! let signer = Signer::new(Credential::new("ak", "sk", 3600));
//!
//! // Client side: sign the outgoing request in place.
//! let (mut parts, ()) = http::Request::builder()
//!     .method("POST")
//!     .uri("https://api.example.com/v1/items?page=2")
//!     .header("content-type", "application/json")
//!     .body(())
//!     .unwrap()
//!     .into_parts();
//! signer.sign_request_parts(&mut parts, br#"{"name":"x"}"#).unwrap();
//!
//! // Server side: validate it with the same credential.
//! signer.validate_request_parts(&parts, br#"{"name":"x"}"#).unwrap();
//! ```
//!
//! # Modules
//!
//! - [`body`] - Buffering and restoring message bodies
//! - [`canonical`] - Canonical text and signature computation
//! - [`config`] - Environment-driven configuration
//! - [`credentials`] - The shared-secret credential
//! - [`error`] - Signing error types
//! - [`extract`] - Parameter and body extraction from requests
//! - [`headers`] - Signing header names
//! - [`signer`] - Request and response signing
//! - [`validator`] - Request and response validation

pub mod body;
pub mod canonical;
pub mod config;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod headers;
pub mod signer;
pub mod validator;

pub use canonical::{ParameterSet, canonicalize};
pub use config::{ConfigError, SignerConfig};
pub use credentials::Credential;
pub use error::{Rejected, RejectedRequest, RejectedResponse, SignError, SignResult};
pub use signer::{SignatureResult, Signer, unix_now};
