//! Request builder.
//!
//! A [`Request`] collects the method, bucket, object key, query parameters,
//! headers, and payload of one call. It is signed and put on the wire by
//! [`Request::response`].
//!
//! ```text
//! StringToSign = Method \n Content-MD5 \n Content-Type \n Date \n
//!                [lower(amz-key):value \n ...] CanonicalResource
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use bucketkit_auth::Signer;
use bucketkit_auth::canonical::{
    amz_header_name, build_string_to_sign, canonical_resource, encode_uri, encode_value,
};
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::response::Response;
use crate::transport::{self, HttpTransport, WireBody, WireRequest};

/// `Date` header format (RFC 1123, always GMT).
pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

const HOST: &str = "host";
const DATE: &str = "date";
const CONTENT_MD5: &str = "content-md5";

/// Builder for one signed request.
#[derive(Debug, Clone)]
pub struct Request {
    signer: Arc<dyn Signer>,
    transport: Arc<dyn HttpTransport>,
    config: Arc<ClientConfig>,
    method: Method,
    bucket: String,
    uri: String,
    params: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    amz_headers: BTreeMap<String, String>,
    body: WireBody,
}

impl Request {
    /// Start a `GET` on the service root with `Host` and `Date` preset.
    #[must_use]
    pub fn new(
        signer: Arc<dyn Signer>,
        transport: Arc<dyn HttpTransport>,
        config: Arc<ClientConfig>,
    ) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(HOST.to_owned(), config.endpoint.clone());
        headers.insert(
            DATE.to_owned(),
            chrono::Utc::now().format(DATE_FORMAT).to_string(),
        );

        Self {
            signer,
            transport,
            config,
            method: Method::GET,
            bucket: String::new(),
            uri: String::new(),
            params: BTreeMap::new(),
            headers,
            amz_headers: BTreeMap::new(),
            body: WireBody::Empty,
        }
    }

    /// Set the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Address a bucket. The name is lower-cased and selects the virtual host.
    #[must_use]
    pub fn bucket(mut self, bucket: &str) -> Self {
        self.bucket = bucket.to_lowercase();
        let host = if self.bucket.is_empty() {
            self.config.endpoint.clone()
        } else {
            format!("{}.{}", self.bucket, self.config.endpoint)
        };
        self.headers.insert(HOST.to_owned(), host);
        self
    }

    /// Address an object key. An empty key is ignored.
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        if !uri.is_empty() {
            self.uri = encode_uri(uri);
        }
        self
    }

    /// Add a query parameter. An empty key is ignored.
    #[must_use]
    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        if !key.is_empty() {
            self.params.insert(key.to_owned(), value.into());
        }
        self
    }

    /// Set a plain header. Empty values are ignored.
    #[must_use]
    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.headers.insert(key.to_ascii_lowercase(), value);
        }
        self
    }

    /// Set an amz header. Keys without the `x-amz-` prefix become
    /// `x-amz-meta-{key}`. Empty values are ignored.
    #[must_use]
    pub fn amz_header(mut self, key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.amz_headers.insert(amz_header_name(key), value);
        }
        self
    }

    /// Send an XML document as the body.
    #[must_use]
    pub fn xml(mut self, body: impl Into<Bytes>) -> Self {
        self.body = WireBody::Bytes(body.into());
        self.header(CONTENT_TYPE.as_str(), "application/xml")
    }

    /// Stream a file as the body with an explicit length.
    #[must_use]
    pub fn file(mut self, path: impl Into<PathBuf>, size: u64) -> Self {
        self.body = WireBody::File {
            path: path.into(),
            size,
        };
        self
    }

    /// The `Host` the request is addressed to.
    #[must_use]
    pub fn host(&self) -> &str {
        self.headers.get(HOST).map_or("", String::as_str)
    }

    /// The amz headers that will be signed and sent.
    #[must_use]
    pub fn amz_headers(&self) -> &BTreeMap<String, String> {
        &self.amz_headers
    }

    /// The canonicalized resource covered by the signature.
    #[must_use]
    pub fn canonical_resource(&self) -> String {
        canonical_resource(&self.bucket, &self.uri, &self.params)
    }

    /// The exact string the signature is computed over.
    #[must_use]
    pub fn string_to_sign(&self) -> String {
        let get = |key: &str| self.headers.get(key).map_or("", String::as_str);
        build_string_to_sign(
            self.method.as_str(),
            get(CONTENT_MD5),
            get(CONTENT_TYPE.as_str()),
            get(DATE),
            self.amz_headers
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str())),
            &self.canonical_resource(),
        )
    }

    /// The absolute URL, with every query parameter encoded and sorted.
    #[must_use]
    pub fn url(&self) -> String {
        let mut url = format!("{}/{}", self.config.base_url(self.host()), self.uri);
        if !self.params.is_empty() {
            let query: Vec<String> = self
                .params
                .iter()
                .map(|(key, value)| format!("{}={}", encode_value(key), encode_value(value)))
                .collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }

    /// Sign the request and convert it into its wire form.
    ///
    /// `Host` is left to the transport so that it follows the URL across
    /// redirects.
    pub fn into_wire(self) -> Result<WireRequest, TransportError> {
        let authorization = self.signer.authorization(&self.string_to_sign());
        let url = self.url();

        let mut headers = HeaderMap::with_capacity(self.headers.len() + self.amz_headers.len() + 2);
        for (key, value) in self.headers.iter().chain(self.amz_headers.iter()) {
            if key == HOST {
                continue;
            }
            headers.insert(header_name(key)?, header_value(key, value)?);
        }
        headers.insert(AUTHORIZATION, header_value("authorization", &authorization)?);
        headers.insert(USER_AGENT, header_value("user-agent", &self.config.user_agent)?);

        Ok(WireRequest {
            method: self.method,
            url,
            headers,
            body: self.body,
        })
    }

    /// Sign and send the request, following redirects.
    pub async fn response(self) -> Response {
        debug!(
            method = %self.method,
            bucket = %self.bucket,
            uri = %self.uri,
            "dispatching request"
        );
        let transport = Arc::clone(&self.transport);
        match self.into_wire() {
            Ok(wire) => transport::send(transport.as_ref(), wire).await,
            Err(error) => Response::failed(error),
        }
    }
}

fn header_name(key: &str) -> Result<HeaderName, TransportError> {
    HeaderName::from_bytes(key.as_bytes())
        .map_err(|e| TransportError::InvalidRequest(format!("header name '{key}': {e}")))
}

fn header_value(key: &str, value: &str) -> Result<HeaderValue, TransportError> {
    HeaderValue::from_str(value)
        .map_err(|e| TransportError::InvalidRequest(format!("value of header '{key}': {e}")))
}
