//! S3 XML serialization: building request bodies.
//!
//! - Namespace: `http://s3.amazonaws.com/doc/2006-03-01/`
//! - XML declaration: `<?xml version="1.0" encoding="UTF-8"?>`

use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};

use crate::error::XmlError;

/// The S3 XML namespace.
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// Trait for serializing S3 types to XML.
///
/// Implementors write their content as child elements inside the current XML
/// context. The root element is handled by [`to_xml`].
pub trait S3Serialize {
    /// Serialize this value as XML child elements into the given writer.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if writing to the underlying writer fails.
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()>;
}

/// Serialize a value as a complete S3 XML document with declaration and namespace.
///
/// # Errors
///
/// Returns `XmlError` if serialization fails.
pub fn to_xml<T: S3Serialize>(root_element: &str, value: &T) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(256);
    let mut writer = Writer::new_with_indent(&mut buf, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer
        .create_element(root_element)
        .with_attribute(("xmlns", S3_NAMESPACE))
        .write_inner_content(|w| value.serialize_xml(w))?;

    Ok(buf)
}

/// Body of a bucket creation request that pins the bucket to a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBucketConfiguration {
    /// Region name, e.g. `eu-west-1` or `EU`.
    pub location_constraint: String,
}

impl CreateBucketConfiguration {
    /// Root element name.
    pub const ROOT: &'static str = "CreateBucketConfiguration";

    /// Render the complete document.
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if serialization fails.
    pub fn to_document(&self) -> Result<Vec<u8>, XmlError> {
        to_xml(Self::ROOT, self)
    }
}

impl S3Serialize for CreateBucketConfiguration {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer
            .create_element("LocationConstraint")
            .write_text_content(BytesText::new(&self.location_constraint))?;
        Ok(())
    }
}
