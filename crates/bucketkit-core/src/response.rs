//! Response envelope and status validation.

use std::collections::HashMap;

use bucketkit_xml::{S3Deserialize, from_xml};
use bytes::Bytes;
use tracing::debug;

use crate::content_type;
use crate::error::{S3Error, TransportError};
use crate::transport::WireResponse;

/// Statuses accepted by default.
pub const SUCCESS: &[u16] = &[200];

/// Statuses accepted for deletions.
pub const DELETE_SUCCESS: &[u16] = &[200, 204];

/// Outcome of a request after redirects were resolved.
///
/// Header names are lower-cased and only the first value of each is kept.
#[derive(Debug, Default)]
pub struct Response {
    /// Status code, `0` if the request failed before a status was obtained.
    pub status: u16,
    /// First value of each response header, keyed by lower-cased name.
    pub headers: HashMap<String, String>,
    /// Raw body.
    pub body: Bytes,
    /// Body decoded as UTF-8 (lossy).
    pub body_text: String,
    /// Transport failure, if any.
    pub error: Option<TransportError>,
}

impl Response {
    /// Build an envelope from a raw exchange.
    #[must_use]
    pub fn from_wire(wire: WireResponse) -> Self {
        let mut headers = HashMap::with_capacity(wire.headers.keys_len());
        for name in wire.headers.keys() {
            if let Some(value) = wire.headers.get(name) {
                headers.insert(
                    name.as_str().to_owned(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                );
            }
        }

        Self {
            status: wire.status,
            headers,
            body_text: String::from_utf8_lossy(&wire.body).into_owned(),
            body: wire.body,
            error: None,
        }
    }

    /// An envelope recording a transport failure.
    #[must_use]
    pub fn failed(error: TransportError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Look up a header case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The `Content-Type` header, or `""` when absent.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.header("content-type").unwrap_or_default()
    }

    /// Whether the call completed with one of `accepted`.
    #[must_use]
    pub fn is_accepted(&self, accepted: &[u16]) -> bool {
        self.error.is_none() && accepted.contains(&self.status)
    }

    /// Validate the envelope against `accepted` statuses.
    ///
    /// A recorded transport error is returned as is, without comparing the
    /// status.
    pub fn accept(mut self, accepted: &[u16]) -> Result<Self, S3Error> {
        if let Some(error) = self.error.take() {
            return Err(error.into());
        }
        if !accepted.contains(&self.status) {
            debug!(status = self.status, ?accepted, "rejecting response status");
            return Err(S3Error::UnexpectedStatus {
                status: self.status,
                expected: accepted.to_vec(),
            });
        }
        Ok(self)
    }

    /// Validate against [`SUCCESS`].
    pub fn ok(self) -> Result<Self, S3Error> {
        self.accept(SUCCESS)
    }

    /// Decode the body as an XML document, requiring an XML Content-Type.
    pub fn xml<T: S3Deserialize>(&self) -> Result<T, S3Error> {
        let content_type = self.content_type();
        if !content_type::is_xml(content_type) {
            return Err(S3Error::NotXml {
                content_type: content_type.to_owned(),
            });
        }
        Ok(from_xml(&self.body)?)
    }
}
