//! Scripted in-memory transport for unit tests.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bucketkit_auth::{Credentials, Signer};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue};
use parking_lot::Mutex;
use reqwest::Url;

use crate::client::S3Client;
use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::transport::{HttpTransport, WireRequest, WireResponse};

type Handler = dyn Fn(&WireRequest) -> Result<WireResponse, TransportError> + Send + Sync;

/// Answers every exchange with a handler and records what it saw.
pub(crate) struct MockTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<WireRequest>>,
}

impl MockTransport {
    pub(crate) fn new(
        handler: impl Fn(&WireRequest) -> Result<WireResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every exchange with an empty body and `status`.
    pub(crate) fn status(status: u16) -> Self {
        Self::new(move |_| Ok(response(status, &[], "")))
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub(crate) fn requests(&self) -> Vec<WireRequest> {
        self.requests.lock().clone()
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: &WireRequest) -> Result<WireResponse, TransportError> {
        self.requests.lock().push(request.clone());
        (self.handler)(request)
    }
}

pub(crate) fn signer() -> Arc<dyn Signer> {
    Arc::new(Credentials::new("AKID", "secret").unwrap())
}

pub(crate) fn client(transport: &Arc<MockTransport>) -> S3Client {
    S3Client::new(
        signer(),
        transport.clone(),
        Arc::new(ClientConfig::default()),
    )
}

pub(crate) fn response(status: u16, headers: &[(&str, &str)], body: &str) -> WireResponse {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    WireResponse {
        status,
        headers: map,
        body: Bytes::copy_from_slice(body.as_bytes()),
    }
}

pub(crate) fn xml_response(body: &str) -> WireResponse {
    response(200, &[("content-type", "application/xml")], body)
}

/// Value of a query parameter in a request URL.
pub(crate) fn query_param(request: &WireRequest, key: &str) -> Option<String> {
    Url::parse(&request.url)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Path of a request URL without the leading slash.
pub(crate) fn path(request: &WireRequest) -> String {
    Url::parse(&request.url).unwrap().path().trim_start_matches('/').to_owned()
}
