//! Shared-secret credential used for both signing and validation.

use std::fmt;

/// Access key, shared secret and expiry window.
///
/// A `Credential` is immutable once built and may be shared freely between
/// threads. Its [`Debug`](fmt::Debug) output never includes the secret.
///
/// # Examples
///
/// ```
/// use apisign_auth::Credential;
///
/// let credential = Credential::new("ak", "open-sesame", 3600);
/// assert_eq!(credential.access_key_id(), "ak");
/// assert!(credential.expiry_enabled());
/// assert!(!format!("{credential:?}").contains("open-sesame"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_key_id: String,
    secret_key: String,
    expiry_window_seconds: i64,
}

impl Credential {
    /// Create a new credential.
    ///
    /// An `expiry_window_seconds` of zero or less disables expiry checks.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_key: impl Into<String>,
        expiry_window_seconds: i64,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_key: secret_key.into(),
            expiry_window_seconds,
        }
    }

    /// The access key identifier sent alongside every signature.
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// The shared secret appended to every signing input.
    #[must_use]
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Maximum accepted request age in seconds.
    #[must_use]
    pub fn expiry_window_seconds(&self) -> i64 {
        self.expiry_window_seconds
    }

    /// Whether request timestamps are checked against the expiry window.
    #[must_use]
    pub fn expiry_enabled(&self) -> bool {
        self.expiry_window_seconds > 0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"...")
            .field("expiry_window_seconds", &self.expiry_window_seconds)
            .finish()
    }
}
