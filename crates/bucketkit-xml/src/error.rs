//! XML error types.

use std::io;

/// Errors that can occur during S3 XML serialization or deserialization.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An I/O error during XML writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// A required XML element was missing.
    #[error("missing required XML element: {0}")]
    MissingElement(String),

    /// An unexpected XML element was encountered.
    #[error("unexpected XML element: {0}")]
    UnexpectedElement(String),

    /// An error parsing a value from XML text content.
    #[error("failed to parse value: {0}")]
    ParseError(String),

    /// A timestamp did not match the expected format.
    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp {
        /// The offending text.
        value: String,
        /// Why parsing failed.
        reason: String,
    },
}
