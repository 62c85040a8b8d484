//! Signer configuration.
//!
//! Configuration is driven by environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `APISIGN_ACCESS_KEY` | *(required)* | Access key identifier |
//! | `APISIGN_SECRET_KEY` | *(required)* | Shared secret |
//! | `APISIGN_EXPIRY_SECONDS` | `3600` | Expiry window, `<= 0` disables it |
//! | `APISIGN_SIGN_RESPONSES` | `true` | Whether servers sign response bodies |

use std::env;
use std::fmt;

use crate::credentials::Credential;

/// Default request expiry window in seconds.
pub const DEFAULT_EXPIRY_SECONDS: i64 = 3600;

/// Errors raised while loading a [`SignerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    /// A variable is set to a value that cannot be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidVar {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Credential material and signing options.
#[derive(Clone)]
pub struct SignerConfig {
    /// Access key identifier.
    pub access_key: String,
    /// Shared secret.
    pub secret_key: String,
    /// Request expiry window in seconds.
    pub expiry_seconds: i64,
    /// Whether servers attach signatures to response bodies.
    pub sign_responses: bool,
}

impl fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerConfig")
            .field("access_key", &self.access_key)
            .field("secret_key", &"...")
            .field("expiry_seconds", &self.expiry_seconds)
            .field("sign_responses", &self.sign_responses)
            .finish()
    }
}

impl SignerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let access_key =
            lookup("APISIGN_ACCESS_KEY").ok_or(ConfigError::MissingVar("APISIGN_ACCESS_KEY"))?;
        let secret_key =
            lookup("APISIGN_SECRET_KEY").ok_or(ConfigError::MissingVar("APISIGN_SECRET_KEY"))?;

        let expiry_seconds = match lookup("APISIGN_EXPIRY_SECONDS") {
            None => DEFAULT_EXPIRY_SECONDS,
            Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidVar {
                name: "APISIGN_EXPIRY_SECONDS",
                value: v.clone(),
            })?,
        };

        let sign_responses = lookup("APISIGN_SIGN_RESPONSES")
            .is_none_or(|v| matches!(v.as_str(), "1" | "true" | "yes" | "TRUE" | "YES"));

        Ok(Self {
            access_key,
            secret_key,
            expiry_seconds,
            sign_responses,
        })
    }

    /// Build the [`Credential`] described by this configuration.
    #[must_use]
    pub fn credential(&self) -> Credential {
        Credential::new(
            self.access_key.clone(),
            self.secret_key.clone(),
            self.expiry_seconds,
        )
    }
}
