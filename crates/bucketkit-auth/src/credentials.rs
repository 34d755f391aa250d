//! Credential pair and the process-lifetime credential registry.
//!
//! A [`CredentialRegistry`] memoizes [`Credentials`] by a hash of the
//! (access, secret) pair. Entries are created lazily, shared through `Arc`,
//! and never evicted. The registry is owned by whoever constructs clients,
//! so there is no implicit global state.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use md5::{Digest, Md5};
use tracing::debug;

use crate::error::AuthError;
use crate::signer::{Signer, compute_signature, format_authorization};

/// An immutable (access key, secret key) pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    /// Create a credential pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if either half of the pair is empty.
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let access_key = access_key.into();
        let secret_key = secret_key.into();
        if access_key.is_empty() {
            return Err(AuthError::MissingAccessKey);
        }
        if secret_key.is_empty() {
            return Err(AuthError::MissingSecretKey(access_key));
        }
        Ok(Self {
            access_key,
            secret_key,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl Signer for Credentials {
    fn access_key(&self) -> &str {
        &self.access_key
    }

    fn authorization(&self, string_to_sign: &str) -> String {
        let signature = compute_signature(&self.secret_key, string_to_sign);
        format_authorization(&self.access_key, &signature)
    }
}

/// Registry key for a credential pair: hex MD5 of
/// `"{len(access)}:{access}{secret}"`.
///
/// The length prefix keeps the split point unambiguous, so pairs such as
/// `("a_b", "c")` and `("a", "b_c")` never share a key.
#[must_use]
pub fn registry_key(access_key: &str, secret_key: &str) -> String {
    let encoded = format!("{}:{access_key}{secret_key}", access_key.len());
    hex::encode(Md5::digest(encoded.as_bytes()))
}

/// Thread-safe memo of credential pairs.
///
/// Concurrent `get_or_create` calls for the same pair converge on one
/// instance.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use bucketkit_auth::CredentialRegistry;
///
/// let registry = CredentialRegistry::new();
/// let a = registry.get_or_create("AKID", "secret").unwrap();
/// let b = registry.get_or_create("AKID", "secret").unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Default)]
pub struct CredentialRegistry {
    inner: DashMap<String, Arc<Credentials>>,
}

impl CredentialRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Return the shared credentials for the pair, creating them on first use.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if either half of the pair is empty. Nothing is
    /// cached in that case.
    pub fn get_or_create(
        &self,
        access_key: &str,
        secret_key: &str,
    ) -> Result<Arc<Credentials>, AuthError> {
        let key = registry_key(access_key, secret_key);
        if let Some(existing) = self.inner.get(&key) {
            return Ok(Arc::clone(existing.value()));
        }

        let credentials = Arc::new(Credentials::new(access_key, secret_key)?);
        let entry = self
            .inner
            .entry(key)
            .or_insert_with(|| {
                debug!(access_key = %access_key, "registered credentials");
                credentials
            })
            .clone();
        Ok(entry)
    }

    /// Number of cached credential pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the registry holds no credentials.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
