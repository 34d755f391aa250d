//! Client configuration.
//!
//! Provides [`ClientConfig`] for configuring how requests are addressed and
//! identified. Values can be loaded from environment variables via
//! [`ClientConfig::from_env`].

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Default service endpoint.
pub const DEFAULT_ENDPOINT: &str = "s3.amazonaws.com";

fn default_user_agent() -> String {
    format!("bucketkit/{}", env!("CARGO_PKG_VERSION"))
}

/// Client configuration.
///
/// # Examples
///
/// ```
/// use bucketkit_core::config::ClientConfig;
///
/// let config = ClientConfig::builder().endpoint("minio.local:9000").use_ssl(false).build();
/// assert_eq!(config.base_url("photos.minio.local:9000"), "http://photos.minio.local:9000");
/// assert_eq!(config.clean_workers, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Service endpoint host (virtual-hosted buckets become `{bucket}.{endpoint}`).
    #[builder(default = String::from(DEFAULT_ENDPOINT), setter(into))]
    pub endpoint: String,

    /// Whether to use `https`.
    #[builder(default = true)]
    pub use_ssl: bool,

    /// Value of the `User-Agent` header.
    #[builder(default = default_user_agent(), setter(into))]
    pub user_agent: String,

    /// Default worker count for bulk deletion.
    #[builder(default = 1)]
    pub clean_workers: usize,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"), setter(into))]
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from(DEFAULT_ENDPOINT),
            use_ssl: true,
            user_agent: default_user_agent(),
            clean_workers: 1,
            log_level: String::from("info"),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `S3_ENDPOINT` | `endpoint` |
    /// | `S3_USE_SSL` | `use_ssl` |
    /// | `S3_USER_AGENT` | `user_agent` |
    /// | `S3_CLEAN_WORKERS` | `clean_workers` |
    /// | `LOG_LEVEL` | `log_level` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("S3_ENDPOINT") {
            config.endpoint = v;
        }
        if let Ok(v) = std::env::var("S3_USE_SSL") {
            config.use_ssl = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("S3_USER_AGENT") {
            config.user_agent = v;
        }
        if let Ok(v) = std::env::var("S3_CLEAN_WORKERS") {
            if let Ok(n) = v.parse::<usize>() {
                config.clean_workers = n.max(1);
            }
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// URL scheme implied by `use_ssl`.
    #[must_use]
    pub fn scheme(&self) -> &'static str {
        if self.use_ssl { "https" } else { "http" }
    }

    /// Base URL for a host, e.g. `https://photos.s3.amazonaws.com`.
    #[must_use]
    pub fn base_url(&self, host: &str) -> String {
        format!("{}://{host}", self.scheme())
    }
}

fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
