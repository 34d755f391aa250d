//! Request options, filters, and result models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use http::Method;

/// Canned ACL sent as `x-amz-acl`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CannedAcl {
    /// Owner gets full control, nobody else has access.
    #[default]
    #[serde(rename = "private")]
    Private,
    #[serde(rename = "public-read")]
    PublicRead,
    #[serde(rename = "public-read-write")]
    PublicReadWrite,
    #[serde(rename = "aws-exec-read")]
    AwsExecRead,
    #[serde(rename = "authenticated-read")]
    AuthenticatedRead,
    #[serde(rename = "bucket-owner-read")]
    BucketOwnerRead,
    #[serde(rename = "bucket-owner-full-control")]
    BucketOwnerFullControl,
    #[serde(rename = "log-delivery-write")]
    LogDeliveryWrite,
}

impl CannedAcl {
    /// All canned ACLs.
    pub const ALL: [Self; 8] = [
        Self::Private,
        Self::PublicRead,
        Self::PublicReadWrite,
        Self::AwsExecRead,
        Self::AuthenticatedRead,
        Self::BucketOwnerRead,
        Self::BucketOwnerFullControl,
        Self::LogDeliveryWrite,
    ];

    /// Returns the header value of this ACL.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::PublicRead => "public-read",
            Self::PublicReadWrite => "public-read-write",
            Self::AwsExecRead => "aws-exec-read",
            Self::AuthenticatedRead => "authenticated-read",
            Self::BucketOwnerRead => "bucket-owner-read",
            Self::BucketOwnerFullControl => "bucket-owner-full-control",
            Self::LogDeliveryWrite => "log-delivery-write",
        }
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CannedAcl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|acl| acl.as_str() == s)
            .ok_or_else(|| format!("unknown canned ACL '{s}'"))
    }
}

/// Bucket location constraint.
///
/// Leaving the location unset (`None` in [`CreateBucketOptions`]) creates the
/// bucket in the endpoint's default region without a request body.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    #[serde(rename = "af-south-1")]
    AfSouth1,
    #[serde(rename = "ap-east-1")]
    ApEast1,
    #[serde(rename = "ap-northeast-1")]
    ApNortheast1,
    #[serde(rename = "ap-northeast-2")]
    ApNortheast2,
    #[serde(rename = "ap-northeast-3")]
    ApNortheast3,
    #[serde(rename = "ap-south-1")]
    ApSouth1,
    #[serde(rename = "ap-southeast-1")]
    ApSoutheast1,
    #[serde(rename = "ap-southeast-2")]
    ApSoutheast2,
    #[serde(rename = "ca-central-1")]
    CaCentral1,
    #[serde(rename = "cn-north-1")]
    CnNorth1,
    #[serde(rename = "cn-northwest-1")]
    CnNorthwest1,
    /// Legacy alias for `eu-west-1`.
    #[serde(rename = "EU")]
    Eu,
    #[serde(rename = "eu-central-1")]
    EuCentral1,
    #[serde(rename = "eu-north-1")]
    EuNorth1,
    #[serde(rename = "eu-south-1")]
    EuSouth1,
    #[serde(rename = "eu-west-1")]
    EuWest1,
    #[serde(rename = "eu-west-2")]
    EuWest2,
    #[serde(rename = "eu-west-3")]
    EuWest3,
    #[serde(rename = "me-south-1")]
    MeSouth1,
    #[serde(rename = "sa-east-1")]
    SaEast1,
    #[serde(rename = "us-east-2")]
    UsEast2,
    #[serde(rename = "us-gov-east-1")]
    UsGovEast1,
    #[serde(rename = "us-gov-west-1")]
    UsGovWest1,
    #[serde(rename = "us-west-1")]
    UsWest1,
    #[serde(rename = "us-west-2")]
    UsWest2,
}

impl Location {
    /// All named locations.
    pub const ALL: [Self; 25] = [
        Self::AfSouth1,
        Self::ApEast1,
        Self::ApNortheast1,
        Self::ApNortheast2,
        Self::ApNortheast3,
        Self::ApSouth1,
        Self::ApSoutheast1,
        Self::ApSoutheast2,
        Self::CaCentral1,
        Self::CnNorth1,
        Self::CnNorthwest1,
        Self::Eu,
        Self::EuCentral1,
        Self::EuNorth1,
        Self::EuSouth1,
        Self::EuWest1,
        Self::EuWest2,
        Self::EuWest3,
        Self::MeSouth1,
        Self::SaEast1,
        Self::UsEast2,
        Self::UsGovEast1,
        Self::UsGovWest1,
        Self::UsWest1,
        Self::UsWest2,
    ];

    /// Returns the `LocationConstraint` value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AfSouth1 => "af-south-1",
            Self::ApEast1 => "ap-east-1",
            Self::ApNortheast1 => "ap-northeast-1",
            Self::ApNortheast2 => "ap-northeast-2",
            Self::ApNortheast3 => "ap-northeast-3",
            Self::ApSouth1 => "ap-south-1",
            Self::ApSoutheast1 => "ap-southeast-1",
            Self::ApSoutheast2 => "ap-southeast-2",
            Self::CaCentral1 => "ca-central-1",
            Self::CnNorth1 => "cn-north-1",
            Self::CnNorthwest1 => "cn-northwest-1",
            Self::Eu => "EU",
            Self::EuCentral1 => "eu-central-1",
            Self::EuNorth1 => "eu-north-1",
            Self::EuSouth1 => "eu-south-1",
            Self::EuWest1 => "eu-west-1",
            Self::EuWest2 => "eu-west-2",
            Self::EuWest3 => "eu-west-3",
            Self::MeSouth1 => "me-south-1",
            Self::SaEast1 => "sa-east-1",
            Self::UsEast2 => "us-east-2",
            Self::UsGovEast1 => "us-gov-east-1",
            Self::UsGovWest1 => "us-gov-west-1",
            Self::UsWest1 => "us-west-1",
            Self::UsWest2 => "us-west-2",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|loc| loc.as_str() == s)
            .ok_or_else(|| format!("unknown location '{s}'"))
    }
}

/// Options for bucket creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateBucketOptions {
    /// Canned ACL of the new bucket.
    pub acl: CannedAcl,
    /// Region constraint; `None` sends no body.
    pub location: Option<Location>,
}

/// Options for object upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// Canned ACL of the uploaded object.
    pub acl: CannedAcl,
    /// `Cache-Control: max-age` in seconds; zero is ignored.
    pub cache_seconds: Option<u32>,
}

/// Options for server-side copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyOptions {
    /// Canned ACL of the destination object.
    pub acl: CannedAcl,
    /// `Cache-Control: max-age` in seconds; zero is ignored.
    pub cache_seconds: Option<u32>,
}

pub(crate) fn cache_control(cache_seconds: Option<u32>) -> Option<String> {
    cache_seconds
        .filter(|seconds| *seconds > 0)
        .map(|seconds| format!("max-age={seconds}"))
}

/// Object listing filter.
///
/// Empty strings and a zero limit are treated as absent.
///
/// # Examples
///
/// ```
/// use bucketkit_core::types::ListFilter;
///
/// let filter = ListFilter::new().prefix("logs/").limit(0);
/// assert_eq!(filter.prefix.as_deref(), Some("logs/"));
/// assert_eq!(filter.limit, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Only keys starting with this prefix.
    pub prefix: Option<String>,
    /// Start listing after this key.
    pub marker: Option<String>,
    /// Group keys sharing a prefix up to this delimiter.
    pub delimiter: Option<String>,
    /// Server-side `max-keys`; a limit also stops the listing after one page.
    pub limit: Option<u64>,
}

impl ListFilter {
    /// An empty filter: every key, all pages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = non_empty(prefix.into());
        self
    }

    /// Set the start-after key.
    #[must_use]
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = non_empty(marker.into());
        self
    }

    /// Set the grouping delimiter.
    #[must_use]
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = non_empty(delimiter.into());
        self
    }

    /// Set the page size and stop after the first page.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// One object in a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSummary {
    /// Object key.
    pub key: String,
    /// Last modification, epoch seconds.
    pub last_modified: i64,
    /// ETag with surrounding quotes removed.
    pub checksum: String,
    /// Size in bytes.
    pub size: u64,
}

/// Object metadata from a `HEAD` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectMeta {
    /// `Content-Length` in bytes.
    pub content_length: u64,
    /// Last modification, epoch seconds.
    pub last_modified: i64,
    /// ETag with surrounding quotes removed.
    pub checksum: String,
    /// `Content-Type` as stored.
    pub content_type: String,
}

/// Account owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountOwner {
    /// Canonical user ID.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// One bucket owned by the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSummary {
    /// Bucket name.
    pub name: String,
    /// Creation time, epoch seconds.
    pub created: i64,
}

/// Account owner and bucket list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    /// Account owner.
    pub owner: AccountOwner,
    /// Buckets in the order the service listed them.
    pub buckets: Vec<BucketSummary>,
}

pub(crate) fn strip_quotes(etag: &str) -> String {
    etag.trim_matches('"').to_owned()
}
