//! HTTP transport and redirect handling.
//!
//! An [`HttpTransport`] performs exactly one exchange. Redirects are resolved
//! by [`send`], which re-issues the same request against each `Location` of a
//! `307` answer until a final response arrives or [`MAX_REDIRECTS`] hops have
//! been taken.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::CONTENT_LENGTH;
use http::{HeaderMap, Method, StatusCode};
use reqwest::Url;
use tracing::debug;

use crate::error::TransportError;
use crate::response::Response;

/// Maximum number of `307` hops before giving up.
pub const MAX_REDIRECTS: usize = 10;

/// Body of a request on the wire.
#[derive(Debug, Clone, Default)]
pub enum WireBody {
    /// No body.
    #[default]
    Empty,
    /// In-memory body.
    Bytes(Bytes),
    /// File streamed from disk with a caller-supplied length.
    File {
        /// Path to read from.
        path: PathBuf,
        /// Length announced in `Content-Length`.
        size: u64,
    },
}

impl WireBody {
    /// Length of the body in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        match self {
            Self::Empty => 0,
            Self::Bytes(bytes) => bytes.len() as u64,
            Self::File { size, .. } => *size,
        }
    }

    /// Whether the body is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fully signed request ready to be executed.
#[derive(Debug, Clone)]
pub struct WireRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Headers, including `Authorization`.
    pub headers: HeaderMap,
    /// Request body.
    pub body: WireBody,
}

/// The raw result of one exchange.
#[derive(Debug, Clone, Default)]
pub struct WireResponse {
    /// Status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

/// Executes a single HTTP exchange.
///
/// Implementations must not follow redirects themselves.
#[async_trait]
pub trait HttpTransport: Send + Sync + fmt::Debug {
    /// Execute `request` and return the raw response.
    async fn execute(&self, request: &WireRequest) -> Result<WireResponse, TransportError>;
}

/// Send a request, following `307 Temporary Redirect` answers.
///
/// Each exchange answered with `307` and a `Location` counts as one hop; after
/// [`MAX_REDIRECTS`] hops the call fails with
/// [`TransportError::TooManyRedirects`]. A `307` without `Location` is
/// returned as is.
pub async fn send(transport: &dyn HttpTransport, mut request: WireRequest) -> Response {
    let mut hops = 0;

    loop {
        debug!(method = %request.method, url = %request.url, "sending request");

        let wire = match transport.execute(&request).await {
            Ok(wire) => wire,
            Err(error) => return Response::failed(error),
        };
        let response = Response::from_wire(wire);

        if response.status != StatusCode::TEMPORARY_REDIRECT.as_u16() {
            return response;
        }
        let Some(location) = response.header("location") else {
            return response;
        };

        hops += 1;
        if hops >= MAX_REDIRECTS {
            return Response::failed(TransportError::TooManyRedirects { hops });
        }

        let next = match resolve_location(&request.url, location) {
            Ok(next) => next,
            Err(error) => return Response::failed(error),
        };
        debug!(hop = hops, location = %next, "following redirect");
        request.url = next;
    }
}

fn resolve_location(current: &str, location: &str) -> Result<String, TransportError> {
    Url::parse(current)
        .and_then(|base| base.join(location))
        .map(|url| url.to_string())
        .map_err(|e| TransportError::InvalidRedirect {
            location: location.to_owned(),
            reason: e.to_string(),
        })
}

/// [`HttpTransport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with redirects disabled.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client. It must not follow redirects.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &WireRequest) -> Result<WireResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone());
        if !request.body.is_empty()
            || request.method == Method::PUT
            || request.method == Method::POST
        {
            builder = builder.header(CONTENT_LENGTH, request.body.len());
        }

        let builder = match &request.body {
            WireBody::Empty => builder,
            WireBody::Bytes(bytes) => builder.body(bytes.clone()),
            WireBody::File { path, .. } => {
                let file = tokio::fs::File::open(path)
                    .await
                    .map_err(|source| TransportError::File {
                        path: path.clone(),
                        source,
                    })?;
                builder.body(reqwest::Body::from(file))
            }
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(WireResponse {
            status,
            headers,
            body,
        })
    }
}
