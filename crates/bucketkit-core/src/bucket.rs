//! Bucket and object operations.

use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bucketkit_auth::canonical::encode_uri;
use bucketkit_xml::{CreateBucketConfiguration, parse_http_date};
use md5::{Digest, Md5};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::debug;

use crate::client::S3Client;
use crate::content_type;
use crate::error::S3Error;
use crate::request::Request;
use crate::response::{DELETE_SUCCESS, Response};
use crate::types::{
    CopyOptions, CreateBucketOptions, Method, ObjectMeta, PutOptions, cache_control, strip_quotes,
};

/// Default permission bits of saved files.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// A bucket, optionally narrowed to one object key.
#[derive(Debug, Clone)]
pub struct Bucket {
    client: S3Client,
    name: String,
    uri: String,
}

impl Bucket {
    pub(crate) fn parse(client: S3Client, path: &str) -> Result<Self, S3Error> {
        let mut segments = path
            .split('/')
            .map(|segment| segment.trim_matches(' '))
            .filter(|segment| !segment.is_empty());

        let name = segments
            .next()
            .ok_or_else(|| S3Error::InvalidInput(format!("no bucket name in path '{path}'")))?
            .to_lowercase();
        let uri = segments.collect::<Vec<_>>().join("/");

        Ok(Self { client, name, uri })
    }

    /// Bucket name (lower-cased).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Object key, empty when the handle addresses the bucket itself.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// A handle on `key` in the same bucket. The key is used verbatim.
    #[must_use]
    pub fn object(&self, key: &str) -> Self {
        Self {
            client: self.client.clone(),
            name: self.name.clone(),
            uri: key.to_owned(),
        }
    }

    pub(crate) fn request(&self) -> Request {
        self.client.request().bucket(&self.name)
    }

    fn object_request(&self) -> Result<Request, S3Error> {
        self.require_uri()?;
        Ok(self.request().uri(&self.uri))
    }

    fn require_uri(&self) -> Result<(), S3Error> {
        if self.uri.is_empty() {
            return Err(S3Error::InvalidInput(format!(
                "no object path given for bucket '{}'",
                self.name
            )));
        }
        Ok(())
    }

    /// Create the bucket.
    pub async fn create(&self, options: CreateBucketOptions) -> Result<(), S3Error> {
        let mut request = self
            .request()
            .method(Method::PUT)
            .amz_header("x-amz-acl", options.acl.as_str());

        if let Some(location) = options.location {
            let document = CreateBucketConfiguration {
                location_constraint: location.as_str().to_owned(),
            }
            .to_document()?;
            request = request.xml(document);
        }

        request.response().await.ok()?;
        debug!(bucket = %self.name, "created bucket");
        Ok(())
    }

    /// Delete the bucket. It must be empty.
    pub async fn delete(&self) -> Result<(), S3Error> {
        self.request()
            .method(Method::DELETE)
            .response()
            .await
            .accept(DELETE_SUCCESS)?;
        Ok(())
    }

    /// Upload a local file to this handle's key.
    pub async fn put(&self, path: impl AsRef<Path>, options: PutOptions) -> Result<(), S3Error> {
        self.require_uri()?;

        let path = absolute(path.as_ref())?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| S3Error::io(&path, e))?;
        if !metadata.is_file() {
            return Err(S3Error::InvalidInput(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let checksum = file_md5(&path).await?;
        let content_type = content_type::detect(&path).await?;
        debug!(
            bucket = %self.name,
            key = %self.uri,
            size = metadata.len(),
            content_type = %content_type,
            "uploading file"
        );

        self.object_request()?
            .method(Method::PUT)
            .header("Content-Type", content_type)
            .header("Content-MD5", checksum)
            .header(
                "Cache-Control",
                cache_control(options.cache_seconds).unwrap_or_default(),
            )
            .amz_header("x-amz-acl", options.acl.as_str())
            .file(path, metadata.len())
            .response()
            .await
            .ok()?;
        Ok(())
    }

    /// Delete the object at this handle's key.
    pub async fn delete_object(&self) -> Result<(), S3Error> {
        self.object_request()?
            .method(Method::DELETE)
            .response()
            .await
            .accept(DELETE_SUCCESS)?;
        Ok(())
    }

    /// Fetch object metadata with `HEAD`.
    pub async fn meta(&self) -> Result<ObjectMeta, S3Error> {
        let response = self
            .object_request()?
            .method(Method::HEAD)
            .response()
            .await
            .ok()?;

        let content_length = required_header(&response, "Content-Length")?
            .trim()
            .parse::<u64>()
            .map_err(|e| S3Error::InvalidHeader {
                name: "Content-Length".to_owned(),
                reason: e.to_string(),
            })?;
        let last_modified = parse_http_date(required_header(&response, "Last-Modified")?)
            .map_err(S3Error::InvalidTimestamp)?;
        let checksum = strip_quotes(required_header(&response, "ETag")?);
        let content_type = required_header(&response, "Content-Type")?.to_owned();

        Ok(ObjectMeta {
            content_length,
            last_modified,
            checksum,
            content_type,
        })
    }

    /// Download the object and return the validated envelope.
    pub async fn file(&self) -> Result<Response, S3Error> {
        self.object_request()?
            .method(Method::GET)
            .response()
            .await
            .ok()
    }

    /// Download the object into a local file.
    ///
    /// The file is created or truncated, synced, and given `mode`
    /// ([`DEFAULT_FILE_MODE`] when `None`) on Unix.
    pub async fn save(&self, path: impl AsRef<Path>, mode: Option<u32>) -> Result<(), S3Error> {
        let response = self.file().await?;
        let path = absolute(path.as_ref())?;

        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| S3Error::io(&path, e))?;
        file.write_all(&response.body)
            .await
            .map_err(|e| S3Error::io(&path, e))?;
        file.sync_all().await.map_err(|e| S3Error::io(&path, e))?;
        drop(file);

        set_mode(&path, mode.unwrap_or(DEFAULT_FILE_MODE)).await
    }

    /// Server-side copy of this object to `dest` (`bucket/key`).
    pub async fn copy_to(&self, dest: &str, options: CopyOptions) -> Result<(), S3Error> {
        let dest = self.client.bucket(dest)?;
        copy(self, &dest, options).await
    }

    /// Server-side copy of `src` (`bucket/key`) to this object.
    pub async fn copy_from(&self, src: &str, options: CopyOptions) -> Result<(), S3Error> {
        let src = self.client.bucket(src)?;
        copy(&src, self, options).await
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

async fn copy(src: &Bucket, dest: &Bucket, options: CopyOptions) -> Result<(), S3Error> {
    if dest.uri.is_empty() {
        return Err(S3Error::InvalidInput(format!(
            "no destination object path given for bucket '{}'",
            dest.name
        )));
    }
    if src.uri.is_empty() {
        return Err(S3Error::InvalidInput(format!(
            "no source object path given for bucket '{}'",
            src.name
        )));
    }

    debug!(
        src_bucket = %src.name,
        src_key = %src.uri,
        dest_bucket = %dest.name,
        dest_key = %dest.uri,
        "copying object"
    );
    dest.request()
        .uri(&dest.uri)
        .method(Method::PUT)
        .amz_header("x-amz-acl", options.acl.as_str())
        .amz_header(
            "x-amz-copy-source",
            format!("/{}/{}", src.name, encode_uri(&src.uri)),
        )
        .amz_header("x-amz-metadata-directive", "COPY")
        .header(
            "Cache-Control",
            cache_control(options.cache_seconds).unwrap_or_default(),
        )
        .response()
        .await
        .ok()?;
    Ok(())
}

fn required_header<'a>(response: &'a Response, name: &str) -> Result<&'a str, S3Error> {
    response
        .header(name)
        .ok_or_else(|| S3Error::MissingHeader(name.to_owned()))
}

fn absolute(path: &Path) -> Result<PathBuf, S3Error> {
    std::path::absolute(path).map_err(|e| S3Error::io(path, e))
}

async fn file_md5(path: &Path) -> Result<String, S3Error> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| S3Error::io(path, e))?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; HASH_BUFFER_SIZE];
    loop {
        let n = file.read(&mut buf).await.map_err(|e| S3Error::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(BASE64.encode(hasher.finalize()))
}

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> Result<(), S3Error> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .await
        .map_err(|e| S3Error::io(path, e))
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) -> Result<(), S3Error> {
    Ok(())
}
