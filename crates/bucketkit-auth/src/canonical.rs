//! Canonical resource and string-to-sign construction.
//!
//! ```text
//! StringToSign = HTTP-Verb + "\n" +
//!                Content-MD5 + "\n" +
//!                Content-Type + "\n" +
//!                Date + "\n" +
//!                [lowercase(amz-key) + ":" + value + "\n"]* +
//!                CanonicalizedResource
//! ```
//!
//! The canonicalized resource only ever carries the sub-resources listed in
//! [`SUB_RESOURCES`]; every other query parameter is sent on the wire but is
//! not signed.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters that are percent-encoded in keys and query values.
///
/// Everything except unreserved characters (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`)
/// is encoded, so a space becomes `%20` rather than `+`.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Query parameters that are part of the signed resource, in signing order.
pub const SUB_RESOURCES: [&str; 4] = ["acl", "location", "torrent", "logging"];

/// Prefix shared by every amz header.
pub const AMZ_PREFIX: &str = "x-amz-";

/// Prefix applied to user metadata headers.
pub const AMZ_META_PREFIX: &str = "x-amz-meta-";

/// Percent-encode a single value (query value or path segment).
///
/// # Examples
///
/// ```
/// use bucketkit_auth::canonical::encode_value;
///
/// assert_eq!(encode_value("a b/c"), "a%20b%2Fc");
/// ```
#[must_use]
pub fn encode_value(input: &str) -> String {
    utf8_percent_encode(input, URI_ENCODE_SET).to_string()
}

/// Percent-encode an object key, keeping `/` as a path separator and trimming
/// leading and trailing slashes.
///
/// # Examples
///
/// ```
/// use bucketkit_auth::canonical::encode_uri;
///
/// assert_eq!(encode_uri("/photos/my cat.jpg/"), "photos/my%20cat.jpg");
/// ```
#[must_use]
pub fn encode_uri(uri: &str) -> String {
    encode_value(uri)
        .replace("%2F", "/")
        .trim_matches('/')
        .to_owned()
}

/// Normalize an amz header name.
///
/// Names are lower-cased. Names already starting with `x-amz-` (in any case)
/// pass through; anything else is treated as user metadata and stored under
/// `x-amz-meta-`.
#[must_use]
pub fn amz_header_name(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    if key.starts_with(AMZ_PREFIX) {
        key
    } else {
        format!("{AMZ_META_PREFIX}{key}")
    }
}

/// Build the canonicalized resource for a request.
///
/// `uri` must already be encoded (see [`encode_uri`]). Only the parameters in
/// [`SUB_RESOURCES`] are appended, in that fixed order, with encoded values.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use bucketkit_auth::canonical::canonical_resource;
///
/// let mut params = BTreeMap::new();
/// params.insert("prefix".to_owned(), "x".to_owned());
/// assert_eq!(canonical_resource("b", "k", &params), "/b/k");
///
/// params.insert("acl".to_owned(), String::new());
/// assert_eq!(canonical_resource("b", "k", &params), "/b/k?acl=");
/// ```
#[must_use]
pub fn canonical_resource(bucket: &str, uri: &str, params: &BTreeMap<String, String>) -> String {
    let mut resource = if bucket.is_empty() {
        format!("/{uri}")
    } else {
        format!("/{bucket}/{uri}")
    };

    let sub_resources: Vec<String> = SUB_RESOURCES
        .iter()
        .filter_map(|key| {
            params
                .get(*key)
                .map(|value| format!("{key}={}", encode_value(value)))
        })
        .collect();

    if !sub_resources.is_empty() {
        resource.push('?');
        resource.push_str(&sub_resources.join("&"));
    }

    resource
}

/// Build the string to sign.
///
/// amz headers with empty values are skipped; the rest are rendered as
/// `lowercase(key):value` and sorted before the resource is appended.
#[must_use]
pub fn build_string_to_sign<'a>(
    method: &str,
    content_md5: &str,
    content_type: &str,
    date: &str,
    amz_headers: impl IntoIterator<Item = (&'a str, &'a str)>,
    resource: &str,
) -> String {
    let mut amz: Vec<String> = amz_headers
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}:{value}", key.to_ascii_lowercase()))
        .collect();
    amz.sort();

    let mut tokens: Vec<&str> = Vec::with_capacity(amz.len() + 5);
    tokens.extend([method, content_md5, content_type, date]);
    tokens.extend(amz.iter().map(String::as_str));
    tokens.push(resource);
    tokens.join("\n")
}
