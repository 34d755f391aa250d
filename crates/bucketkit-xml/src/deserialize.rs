//! S3 XML deserialization: parsing response bodies into Rust types.
//!
//! Only the elements the client consumes are decoded; unknown elements
//! (`StorageClass`, `CommonPrefixes`, …) are skipped. Timestamps are kept as
//! text here and converted by the caller with [`parse_timestamp`], so that a
//! malformed date can abort a whole listing rather than a single entry.

use chrono::NaiveDateTime;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::XmlError;

/// Format of `LastModified` and `CreationDate` values, e.g. `2006-02-03T16:45:09.000Z`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Format of HTTP date headers, e.g. `Wed, 01 Mar 2006 12:00:00 GMT`.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Trait for deserializing S3 types from XML.
///
/// The root element has already been consumed by the caller; the
/// implementation reads child elements until the matching end tag.
pub trait S3Deserialize: Sized {
    /// Deserialize an instance from the given XML reader.
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if the XML is malformed or a value cannot be parsed.
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError>;
}

/// Deserialize S3 XML into a typed value.
///
/// Finds the root element and delegates to the type's [`S3Deserialize`]
/// implementation.
///
/// # Errors
///
/// Returns `XmlError` if the XML is malformed or deserialization fails.
pub fn from_xml<T: S3Deserialize>(xml: &[u8]) -> Result<T, XmlError> {
    let mut reader = Reader::from_reader(xml);

    loop {
        match reader.read_event()? {
            Event::Start(_) => {
                return T::deserialize_xml(&mut reader);
            }
            Event::Eof => {
                return Err(XmlError::MissingElement("root element".to_string()));
            }
            // Declaration, comments, processing instructions, whitespace.
            _ => {}
        }
    }
}

/// Parse an S3 timestamp (`2006-02-03T16:45:09.000Z`) into epoch seconds.
///
/// The fractional part is optional; the trailing `Z` is not.
///
/// # Errors
///
/// Returns [`XmlError::InvalidTimestamp`] if the text does not match.
pub fn parse_timestamp(value: &str) -> Result<i64, XmlError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|ndt| ndt.and_utc().timestamp())
        .map_err(|e| XmlError::InvalidTimestamp {
            value: value.to_owned(),
            reason: e.to_string(),
        })
}

/// Parse an HTTP date (`Wed, 01 Mar 2006 12:00:00 GMT`) into epoch seconds.
///
/// # Errors
///
/// Returns [`XmlError::InvalidTimestamp`] if the text does not match.
pub fn parse_http_date(value: &str) -> Result<i64, XmlError> {
    NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT)
        .map(|ndt| ndt.and_utc().timestamp())
        .map_err(|e| XmlError::InvalidTimestamp {
            value: value.to_owned(),
            reason: e.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Helper functions for reading common XML patterns
// ---------------------------------------------------------------------------

fn tag_name(start: &BytesStart<'_>) -> Result<String, XmlError> {
    let name = start.name();
    std::str::from_utf8(name.as_ref())
        .map(str::to_owned)
        .map_err(|e| XmlError::ParseError(e.to_string()))
}

/// Read the text content of the current element and consume its end tag.
///
/// Entity and character references arrive as separate events and are
/// resolved in place.
fn read_text_content(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&decoded);
            }
            Event::GeneralRef(r) => {
                if r.is_char_ref() {
                    if let Some(ch) = r
                        .resolve_char_ref()
                        .map_err(|err| XmlError::ParseError(err.to_string()))?
                    {
                        text.push(ch);
                    }
                } else {
                    let name = r
                        .decode()
                        .map_err(|err| XmlError::ParseError(err.to_string()))?;
                    let resolved = quick_xml::escape::resolve_predefined_entity(&name)
                        .ok_or_else(|| XmlError::ParseError(format!("unknown entity &{name};")))?;
                    text.push_str(resolved);
                }
            }
            Event::End(_) => {
                return Ok(text);
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while reading text content".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Read an element's text with surrounding whitespace removed.
///
/// Used for scalar fields. Keys, prefixes and markers keep their exact text
/// since whitespace there is significant.
fn read_trimmed(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let text = read_text_content(reader)?;
    Ok(text.trim().to_owned())
}

/// Skip over an element and all its children.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while skipping element".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Visit every child element of the current element until its end tag.
///
/// The visitor must consume the child completely (text, nested struct, or
/// [`skip_element`]).
fn for_each_child<F>(
    reader: &mut Reader<&[u8]>,
    context: &str,
    mut visit: F,
) -> Result<(), XmlError>
where
    F: FnMut(&str, &mut Reader<&[u8]>) -> Result<(), XmlError>,
{
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let tag = tag_name(&e)?;
                visit(&tag, reader)?;
            }
            Event::End(_) => return Ok(()),
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(format!(
                    "unexpected EOF in {context}"
                )));
            }
            _ => {}
        }
    }
}

/// Parse a boolean from XML text ("true"/"false").
fn parse_bool(s: &str) -> Result<bool, XmlError> {
    match s.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(XmlError::ParseError(format!("invalid boolean: {s}"))),
    }
}

/// Parse a u64 from XML text.
fn parse_u64(s: &str) -> Result<u64, XmlError> {
    s.trim()
        .parse::<u64>()
        .map_err(|e| XmlError::ParseError(format!("invalid u64 '{s}': {e}")))
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Owner of a bucket or object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Owner {
    /// Canonical user ID.
    pub id: String,
    /// Display name.
    pub display_name: String,
}

impl S3Deserialize for Owner {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut owner = Owner::default();
        for_each_child(reader, "Owner", |tag, reader| {
            match tag {
                "ID" => owner.id = read_trimmed(reader)?,
                "DisplayName" => owner.display_name = read_trimmed(reader)?,
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(owner)
    }
}

/// One `<Contents>` entry of a bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEntry {
    /// Object key.
    pub key: String,
    /// Raw `LastModified` text.
    pub last_modified: String,
    /// Raw `ETag` text, quotes included.
    pub etag: String,
    /// Object size in bytes.
    pub size: u64,
    /// Object owner, when the service reports it.
    pub owner: Option<Owner>,
}

impl S3Deserialize for ListEntry {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut entry = ListEntry::default();
        for_each_child(reader, "Contents", |tag, reader| {
            match tag {
                "Key" => entry.key = read_text_content(reader)?,
                "LastModified" => entry.last_modified = read_trimmed(reader)?,
                "ETag" => entry.etag = read_trimmed(reader)?,
                "Size" => entry.size = parse_u64(&read_text_content(reader)?)?,
                "Owner" => entry.owner = Some(Owner::deserialize_xml(reader)?),
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(entry)
    }
}

/// A page of a bucket listing (`ListBucketResult`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListBucketResult {
    /// Bucket name.
    pub name: String,
    /// Echoed prefix.
    pub prefix: String,
    /// Echoed marker.
    pub marker: String,
    /// Echoed `max-keys`.
    pub max_keys: Option<u64>,
    /// Whether more entries follow this page.
    pub is_truncated: bool,
    /// Explicit resume point, sent when a delimiter is in use.
    pub next_marker: Option<String>,
    /// Entries in listing order.
    pub contents: Vec<ListEntry>,
}

impl S3Deserialize for ListBucketResult {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut page = ListBucketResult::default();
        for_each_child(reader, "ListBucketResult", |tag, reader| {
            match tag {
                "Name" => page.name = read_trimmed(reader)?,
                "Prefix" => page.prefix = read_text_content(reader)?,
                "Marker" => page.marker = read_text_content(reader)?,
                "MaxKeys" => page.max_keys = Some(parse_u64(&read_text_content(reader)?)?),
                "IsTruncated" => page.is_truncated = parse_bool(&read_text_content(reader)?)?,
                "NextMarker" => page.next_marker = Some(read_text_content(reader)?),
                "Contents" => page.contents.push(ListEntry::deserialize_xml(reader)?),
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(page)
    }
}

/// One `<Bucket>` entry of the account listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketEntry {
    /// Bucket name.
    pub name: String,
    /// Raw `CreationDate` text.
    pub creation_date: String,
}

impl S3Deserialize for BucketEntry {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut bucket = BucketEntry::default();
        for_each_child(reader, "Bucket", |tag, reader| {
            match tag {
                "Name" => bucket.name = read_trimmed(reader)?,
                "CreationDate" => bucket.creation_date = read_trimmed(reader)?,
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(bucket)
    }
}

/// The account listing (`ListAllMyBucketsResult`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListAllMyBucketsResult {
    /// Account owner.
    pub owner: Owner,
    /// Buckets owned by the account.
    pub buckets: Vec<BucketEntry>,
}

impl S3Deserialize for ListAllMyBucketsResult {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut result = ListAllMyBucketsResult::default();
        for_each_child(reader, "ListAllMyBucketsResult", |tag, reader| {
            match tag {
                "Owner" => result.owner = Owner::deserialize_xml(reader)?,
                "Buckets" => {
                    for_each_child(reader, "Buckets", |tag, reader| {
                        if tag == "Bucket" {
                            result.buckets.push(BucketEntry::deserialize_xml(reader)?);
                        } else {
                            skip_element(reader)?;
                        }
                        Ok(())
                    })?;
                }
                _ => skip_element(reader)?,
            }
            Ok(())
        })?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>photos</Name>
  <Prefix>2024/</Prefix>
  <Marker></Marker>
  <MaxKeys>1000</MaxKeys>
  <IsTruncated>true</IsTruncated>
  <Contents>
    <Key>2024/cat &amp; dog.jpg</Key>
    <LastModified>2024-01-02T03:04:05.000Z</LastModified>
    <ETag>&quot;9b2cf535f27731c974343645a3985328&quot;</ETag>
    <Size>434234</Size>
    <StorageClass>STANDARD</StorageClass>
    <Owner>
      <ID>75aa57f09aa0c8caeab4f8c24e99d10f8e7faeebf76c078efc7c6caea54ba06a</ID>
      <DisplayName>mtd@amazon.com</DisplayName>
    </Owner>
  </Contents>
  <Contents>
    <Key>2024/owl.png</Key>
    <LastModified>2024-01-03T00:00:00Z</LastModified>
    <ETag>"abc"</ETag>
    <Size>12</Size>
  </Contents>
  <CommonPrefixes><Prefix>2024/raw/</Prefix></CommonPrefixes>
</ListBucketResult>"#;

    #[test]
    fn test_should_parse_list_bucket_result() {
        let page: ListBucketResult = from_xml(LIST_PAGE.as_bytes()).unwrap();
        assert_eq!(page.name, "photos");
        assert_eq!(page.prefix, "2024/");
        assert_eq!(page.marker, "");
        assert_eq!(page.max_keys, Some(1000));
        assert!(page.is_truncated);
        assert_eq!(page.next_marker, None);
        assert_eq!(page.contents.len(), 2);

        let first = &page.contents[0];
        assert_eq!(first.key, "2024/cat & dog.jpg");
        assert_eq!(first.etag, "\"9b2cf535f27731c974343645a3985328\"");
        assert_eq!(first.size, 434_234);
        assert_eq!(
            first.owner.as_ref().map(|o| o.display_name.as_str()),
            Some("mtd@amazon.com")
        );
        assert!(page.contents[1].owner.is_none());
    }

    #[test]
    fn test_should_parse_next_marker() {
        let xml = "<ListBucketResult><Name>b</Name><IsTruncated>true</IsTruncated>\
                   <NextMarker>dir/</NextMarker></ListBucketResult>";
        let page: ListBucketResult = from_xml(xml.as_bytes()).unwrap();
        assert_eq!(page.next_marker.as_deref(), Some("dir/"));
        assert!(page.contents.is_empty());
    }

    #[test]
    fn test_should_parse_indented_listing() {
        let xml = "<ListBucketResult>
  <Name>
    photos
  </Name>
  <MaxKeys>
    2
  </MaxKeys>
  <IsTruncated>
    true
  </IsTruncated>
  <Contents>
    <Key> a &amp; b </Key>
    <LastModified>
      2024-01-02T03:04:05.000Z
    </LastModified>
    <ETag>
      &quot;abc&quot;
    </ETag>
    <Size>
      7
    </Size>
  </Contents>
</ListBucketResult>";
        let page: ListBucketResult = from_xml(xml.as_bytes()).unwrap();
        assert_eq!(page.name, "photos");
        assert_eq!(page.max_keys, Some(2));
        assert!(page.is_truncated);

        let entry = &page.contents[0];
        assert_eq!(entry.key, " a & b ");
        assert_eq!(entry.etag, "\"abc\"");
        assert_eq!(entry.size, 7);
        assert_eq!(parse_timestamp(&entry.last_modified).unwrap(), 1_704_164_645);
    }

    #[test]
    fn test_should_reject_invalid_boolean() {
        let xml = "<ListBucketResult><IsTruncated>maybe</IsTruncated></ListBucketResult>";
        let err = from_xml::<ListBucketResult>(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, XmlError::ParseError(_)));
    }

    #[test]
    fn test_should_reject_truncated_document() {
        let xml = "<ListBucketResult><Contents><Key>a</Key>";
        assert!(from_xml::<ListBucketResult>(xml.as_bytes()).is_err());
    }

    #[test]
    fn test_should_reject_empty_document() {
        let err = from_xml::<ListBucketResult>(b"").unwrap_err();
        assert!(matches!(err, XmlError::MissingElement(_)));
    }

    #[test]
    fn test_should_parse_account_listing() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListAllMyBucketsResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Owner><ID>abc123</ID><DisplayName>owner</DisplayName></Owner>
  <Buckets>
    <Bucket><Name>alpha</Name><CreationDate>2019-12-11T23:32:47.000Z</CreationDate></Bucket>
    <Bucket><Name>beta</Name><CreationDate>2020-01-01T00:00:00.000Z</CreationDate></Bucket>
  </Buckets>
</ListAllMyBucketsResult>"#;
        let result: ListAllMyBucketsResult = from_xml(xml.as_bytes()).unwrap();
        assert_eq!(result.owner.id, "abc123");
        assert_eq!(result.owner.display_name, "owner");
        let names: Vec<&str> = result.buckets.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["alpha", "beta"]);
        assert_eq!(result.buckets[1].creation_date, "2020-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_should_parse_timestamp_with_and_without_fraction() {
        assert_eq!(parse_timestamp("2024-01-02T03:04:05.000Z").unwrap(), 1_704_164_645);
        assert_eq!(parse_timestamp("2024-01-02T03:04:05Z").unwrap(), 1_704_164_645);
        assert_eq!(parse_timestamp("2024-01-02T03:04:05.9Z").unwrap(), 1_704_164_645);
    }

    #[test]
    fn test_should_reject_non_utc_timestamp() {
        assert!(parse_timestamp("2024-01-02T03:04:05+08:00").is_err());
        assert!(parse_timestamp("2024-01-02 03:04:05").is_err());
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(XmlError::InvalidTimestamp { ref value, .. }) if value == "yesterday"
        ));
    }

    #[test]
    fn test_should_parse_http_date() {
        assert_eq!(
            parse_http_date("Tue, 02 Jan 2024 03:04:05 GMT").unwrap(),
            1_704_164_645
        );
        assert!(parse_http_date("2024-01-02T03:04:05Z").is_err());
    }
}
