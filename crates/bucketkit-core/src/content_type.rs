//! Content-Type detection for uploads and validation of XML responses.

use std::path::Path;

use mime::Mime;
use tokio::io::AsyncReadExt;

use crate::error::S3Error;

/// Number of leading bytes inspected when sniffing.
pub const SNIFF_LEN: usize = 512;

static EXTENSION_TYPES: &[(&str, &str)] = &[
    ("ai", "application/postscript"),
    ("aif", "audio/x-aiff"),
    ("aifc", "audio/x-aiff"),
    ("aiff", "audio/x-aiff"),
    ("asc", "text/plain"),
    ("avi", "video/x-msvideo"),
    ("bin", "application/macbinary"),
    ("bmp", "image/bmp"),
    ("bz", "application/x-bzip"),
    ("bz2", "application/x-bzip2"),
    ("class", "application/octet-stream"),
    ("cpt", "application/mac-compactpro"),
    ("css", "text/css"),
    ("csv", "text/x-comma-separated-values"),
    ("dcr", "application/x-director"),
    ("dir", "application/x-director"),
    ("dll", "application/octet-stream"),
    ("dms", "application/octet-stream"),
    ("doc", "application/msword"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("dvi", "application/x-dvi"),
    ("dxr", "application/x-director"),
    ("eml", "message/rfc822"),
    ("eps", "application/postscript"),
    ("exe", "application/octet-stream"),
    ("flv", "video/x-flv"),
    ("gif", "image/gif"),
    ("gtar", "application/x-gtar"),
    ("gz", "application/x-gzip"),
    ("hqx", "application/mac-binhex40"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("ico", "image/x-icon"),
    ("jpe", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "application/x-javascript"),
    ("json", "application/json"),
    ("lha", "application/octet-stream"),
    ("log", "text/plain"),
    ("lzh", "application/octet-stream"),
    ("mid", "audio/midi"),
    ("midi", "audio/midi"),
    ("mif", "application/vnd.mif"),
    ("mov", "video/quicktime"),
    ("movie", "video/x-sgi-movie"),
    ("mp2", "audio/mpeg"),
    ("mp3", "audio/mpeg"),
    ("mpe", "video/mpeg"),
    ("mpeg", "video/mpeg"),
    ("mpg", "video/mpeg"),
    ("mpga", "audio/mpeg"),
    ("oda", "application/oda"),
    ("ogg", "application/ogg"),
    ("pdf", "application/pdf"),
    ("php", "application/x-httpd-php"),
    ("php3", "application/x-httpd-php"),
    ("php4", "application/x-httpd-php"),
    ("phps", "application/x-httpd-php-source"),
    ("phtml", "application/x-httpd-php"),
    ("png", "image/png"),
    ("ppt", "application/powerpoint"),
    ("ps", "application/postscript"),
    ("psd", "application/x-photoshop"),
    ("qt", "video/quicktime"),
    ("ra", "audio/x-realaudio"),
    ("ram", "audio/x-pn-realaudio"),
    ("rm", "audio/x-pn-realaudio"),
    ("rpm", "audio/x-pn-realaudio-plugin"),
    ("rtf", "text/rtf"),
    ("rtx", "text/richtext"),
    ("rv", "video/vnd.rn-realvideo"),
    ("sea", "application/octet-stream"),
    ("shtml", "text/html"),
    ("sit", "application/x-stuffit"),
    ("smi", "application/smil"),
    ("smil", "application/smil"),
    ("so", "application/octet-stream"),
    ("svg", "image/svg+xml"),
    ("swf", "application/x-shockwave-flash"),
    ("tar", "application/x-tar"),
    ("text", "text/plain"),
    ("tgz", "application/x-tar"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("txt", "text/plain"),
    ("wav", "audio/x-wav"),
    ("wbxml", "application/wbxml"),
    ("wmlc", "application/wmlc"),
    ("word", "application/msword"),
    ("xht", "application/xhtml+xml"),
    ("xhtml", "application/xhtml+xml"),
    ("xl", "application/excel"),
    ("xls", "application/excel"),
    ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    ("xml", "text/xml"),
    ("xsl", "text/xml"),
    ("zip", "application/x-zip"),
];

/// Magic-number signatures checked in order.
static SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"BM", "image/bmp"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1F\x8B\x08", "application/x-gzip"),
    (b"Rar!\x1A\x07", "application/x-rar-compressed"),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"OggS\x00", "application/ogg"),
    (b"ID3", "audio/mpeg"),
    (b"%!PS-Adobe-", "application/postscript"),
];

static HTML_PREFIXES: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Look up the Content-Type registered for a file's extension.
///
/// Extensions are matched case-insensitively.
#[must_use]
pub fn from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    EXTENSION_TYPES
        .binary_search_by(|(candidate, _)| (*candidate).cmp(ext.as_str()))
        .ok()
        .map(|idx| EXTENSION_TYPES[idx].1)
}

/// Guess a Content-Type from the first bytes of a file.
///
/// Falls back to `text/plain; charset=utf-8` when no binary bytes are present
/// and to `application/octet-stream` otherwise.
#[must_use]
pub fn sniff(head: &[u8]) -> String {
    let head = &head[..head.len().min(SNIFF_LEN)];

    if let Some((_, content_type)) = SIGNATURES.iter().find(|(sig, _)| head.starts_with(sig)) {
        return (*content_type).to_owned();
    }
    if head.len() >= 12 && &head[..4] == b"RIFF" && &head[8..12] == b"WEBP" {
        return "image/webp".to_owned();
    }
    if head.len() >= 12 && &head[..4] == b"RIFF" && &head[8..12] == b"WAVE" {
        return "audio/wave".to_owned();
    }

    let trimmed = trim_leading_whitespace(head);
    if trimmed.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8".to_owned();
    }
    if HTML_PREFIXES.iter().any(|tag| is_html_tag(trimmed, tag)) {
        return mime::TEXT_HTML_UTF_8.to_string();
    }

    if head.iter().any(|byte| is_binary(*byte)) {
        mime::APPLICATION_OCTET_STREAM.to_string()
    } else {
        mime::TEXT_PLAIN_UTF_8.to_string()
    }
}

/// Detect the Content-Type of a local file: extension table first, then
/// sniffing of the first [`SNIFF_LEN`] bytes.
pub async fn detect(path: &Path) -> Result<String, S3Error> {
    if let Some(content_type) = from_extension(path) {
        return Ok(content_type.to_owned());
    }

    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| S3Error::io(path, e))?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    (&mut file)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .await
        .map_err(|e| S3Error::io(path, e))?;

    Ok(sniff(&head))
}

/// Whether a Content-Type header value denotes an XML document.
#[must_use]
pub fn is_xml(content_type: &str) -> bool {
    content_type.parse::<Mime>().is_ok_and(|parsed| {
        matches!(
            parsed.essence_str(),
            "application/xml" | "text/xml"
        )
    })
}

fn trim_leading_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

fn is_html_tag(data: &[u8], tag: &[u8]) -> bool {
    if data.len() <= tag.len() || !data[..tag.len()].eq_ignore_ascii_case(tag) {
        return false;
    }
    // The tag must be terminated, so `<Bold` is not `<B`.
    matches!(data[tag.len()], b' ' | b'>')
}

fn is_binary(byte: u8) -> bool {
    matches!(byte, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_should_keep_extension_table_sorted() {
        assert!(EXTENSION_TYPES.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_should_map_known_extensions() {
        assert_eq!(from_extension(Path::new("a/cat.jpg")), Some("image/jpeg"));
        assert_eq!(from_extension(Path::new("CAT.JPG")), Some("image/jpeg"));
        assert_eq!(from_extension(Path::new("report.xlsx")).map(|t| t.contains("spreadsheetml")), Some(true));
        assert_eq!(from_extension(Path::new("notes")), None);
        assert_eq!(from_extension(Path::new("archive.unknown")), None);
    }

    #[test]
    fn test_should_sniff_signatures() {
        assert_eq!(sniff(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), "image/png");
        assert_eq!(sniff(b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(sniff(b"GIF89a\x01\x00"), "image/gif");
        assert_eq!(sniff(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
    }

    #[test]
    fn test_should_sniff_markup() {
        assert_eq!(sniff(b"  <?xml version=\"1.0\"?><a/>"), "text/xml; charset=utf-8");
        assert_eq!(sniff(b"\n<!doctype html><html>"), "text/html; charset=utf-8");
        assert_eq!(sniff(b"<Bold>"), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_should_fall_back_on_text_or_binary() {
        assert_eq!(sniff(b"hello world\n"), "text/plain; charset=utf-8");
        assert_eq!(sniff(b""), "text/plain; charset=utf-8");
        assert_eq!(sniff(b"\x00\x01\x02garbage"), "application/octet-stream");
    }

    #[test]
    fn test_should_recognize_xml_content_types() {
        assert!(is_xml("application/xml"));
        assert!(is_xml("application/xml; charset=utf-8"));
        assert!(is_xml("text/xml"));
        assert!(!is_xml("text/html"));
        assert!(!is_xml(""));
    }

    #[tokio::test]
    async fn test_should_detect_by_extension_then_content() {
        let dir = tempfile::tempdir().unwrap();

        let png = dir.path().join("photo.png");
        std::fs::write(&png, b"not really a png").unwrap();
        assert_eq!(detect(&png).await.unwrap(), "image/png");

        let blob = dir.path().join("blob");
        let mut file = std::fs::File::create(&blob).unwrap();
        file.write_all(b"%PDF-1.4 body").unwrap();
        drop(file);
        assert_eq!(detect(&blob).await.unwrap(), "application/pdf");
    }

    #[tokio::test]
    async fn test_should_fail_detection_for_missing_file() {
        let err = detect(Path::new("/nonexistent/bucketkit/blob")).await.unwrap_err();
        assert!(matches!(err, S3Error::Io { .. }));
    }
}
