//! Client error types.

use std::io;
use std::path::PathBuf;

use bucketkit_auth::AuthError;
use bucketkit_xml::XmlError;

/// Failures that happen before an HTTP status could be obtained.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP client failed (connection, TLS, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A custom transport reported a failure.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request could not be put on the wire (bad header value, bad URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The upload source could not be opened.
    #[error("failed to open {} for upload: {source}", .path.display())]
    File {
        /// Path of the upload source.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The server kept answering `307 Temporary Redirect`.
    #[error("too many redirects (gave up after {hops} hops)")]
    TooManyRedirects {
        /// Number of redirects followed before giving up.
        hops: usize,
    },

    /// A redirect `Location` could not be resolved into a URL.
    #[error("invalid redirect location '{location}': {reason}")]
    InvalidRedirect {
        /// The raw `Location` header.
        location: String,
        /// Why resolution failed.
        reason: String,
    },
}

/// Errors returned by client operations.
#[derive(Debug, thiserror::Error)]
pub enum S3Error {
    /// A precondition on the caller's input failed; nothing was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Credentials were rejected before any request was made.
    #[error("credentials error: {0}")]
    Auth(#[from] AuthError),

    /// The request never produced a status.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a status outside the accepted set.
    #[error("unexpected status {status}, expected {}", join_statuses(.expected))]
    UnexpectedStatus {
        /// Status received.
        status: u16,
        /// Statuses the operation accepts.
        expected: Vec<u16>,
    },

    /// An XML body was expected but the response declared another type.
    #[error("expected an XML response, got Content-Type '{content_type}'")]
    NotXml {
        /// The `Content-Type` received (empty if absent).
        content_type: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode XML: {0}")]
    Xml(#[from] XmlError),

    /// A date in a response did not match the expected format.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(#[source] XmlError),

    /// A required response header was absent.
    #[error("missing response header: {0}")]
    MissingHeader(String),

    /// A response header could not be interpreted.
    #[error("invalid response header {name}: {reason}")]
    InvalidHeader {
        /// Header name.
        name: String,
        /// Why parsing failed.
        reason: String,
    },

    /// Local file access failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A bulk delete worker stopped before reporting on a key.
    #[error("delete worker stopped before reporting: {0}")]
    WorkerStopped(String),

    /// One object of a bulk deletion failed.
    #[error("failed to delete '{key}': {source}")]
    DeleteFailed {
        /// Key that could not be deleted.
        key: String,
        /// The delete failure.
        source: Box<S3Error>,
    },
}

impl S3Error {
    /// Status code carried by the error, if the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::DeleteFailed { source, .. } => source.status(),
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn join_statuses(statuses: &[u16]) -> String {
    statuses
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(" or ")
}
