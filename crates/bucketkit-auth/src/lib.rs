//! Legacy AWS request signing for bucketkit.
//!
//! This crate implements the client side of the original S3 authentication
//! scheme (sometimes called SigV2): every request carries an `Authorization`
//! header of the form
//!
//! ```text
//! AWS <AccessKeyId>:<Base64(HMAC-SHA1(SecretKey, StringToSign))>
//! ```
//!
//! # Usage
//!
//! ```rust
//! use std::collections::BTreeMap;
//!
//! use bucketkit_auth::canonical::{build_string_to_sign, canonical_resource};
//! use bucketkit_auth::{CredentialRegistry, Signer};
//!
//! let registry = CredentialRegistry::new();
//! let credentials = registry.get_or_create("AKID", "secret").unwrap();
//!
//! let resource = canonical_resource("photos", "2024/cat.jpg", &BTreeMap::new());
//! let string_to_sign = build_string_to_sign(
//!     "GET",
//!     "",
//!     "",
//!     "Sat, 28 Feb 2026 12:00:00 GMT",
//!     std::iter::empty::<(&str, &str)>(),
//!     &resource,
//! );
//! let authorization = credentials.authorization(&string_to_sign);
//! assert!(authorization.starts_with("AWS AKID:"));
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical resource, percent-encoding, and string-to-sign construction
//! - [`credentials`] - Credential pair and the process-lifetime credential registry
//! - [`error`] - Authentication error types
//! - [`signer`] - HMAC-SHA1 signature computation and the [`Signer`] capability

pub mod canonical;
pub mod credentials;
pub mod error;
pub mod signer;

pub use credentials::{CredentialRegistry, Credentials};
pub use error::AuthError;
pub use signer::{Signer, compute_signature};
