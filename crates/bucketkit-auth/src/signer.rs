//! HMAC-SHA1 request signatures.
//!
//! ```text
//! Authorization = "AWS" + " " + AccessKeyId + ":" + Signature
//! Signature     = Base64(HMAC-SHA1(SecretKey, StringToSign))
//! ```

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, KeyInit, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Capability to turn a string-to-sign into an `Authorization` header value.
///
/// Implementations must be pure: the same input always yields the same output.
pub trait Signer: Send + Sync + fmt::Debug {
    /// The access key ID embedded in the `Authorization` header.
    fn access_key(&self) -> &str;

    /// Compute the full `Authorization` header value for `string_to_sign`.
    fn authorization(&self, string_to_sign: &str) -> String;
}

/// Compute the signature: `Base64(HMAC-SHA1(secret, string_to_sign))`.
#[must_use]
pub fn compute_signature(secret_key: &str, string_to_sign: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(secret_key.as_bytes()).expect("HMAC can accept any key length");
    mac.update(string_to_sign.as_bytes());
    let result = mac.finalize().into_bytes();
    BASE64.encode(result)
}

/// Format an `Authorization` header value from an access key and a signature.
#[must_use]
pub fn format_authorization(access_key: &str, signature: &str) -> String {
    format!("AWS {access_key}:{signature}")
}
