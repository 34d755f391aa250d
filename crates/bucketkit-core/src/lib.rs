//! S3 client core for bucketkit.
//!
//! Requests are described with a [`Request`] builder, signed with the legacy
//! `AWS access:signature` scheme, and executed by an [`HttpTransport`]. The
//! redirect loop in [`transport::send`] re-issues a request against the
//! `Location` of a `307` answer and gives up after [`MAX_REDIRECTS`] hops.
//!
//! # Usage
//!
//! ```no_run
//! use bucketkit_core::{ClientConfig, ClientFactory, ListFilter};
//!
//! # async fn run() -> Result<(), bucketkit_core::S3Error> {
//! let factory = ClientFactory::new(ClientConfig::from_env())?;
//! let client = factory.client("AKID", "secret")?;
//!
//! let bucket = client.bucket("photos")?;
//! for file in bucket.files(&ListFilter::new().prefix("2024/")).await? {
//!     println!("{} {} bytes", file.key, file.size);
//! }
//!
//! let errors = bucket.clean(4).await;
//! assert!(errors.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`client`] - Client construction, credential memoization, account info
//! - [`bucket`] - Bucket and object operations
//! - [`listing`] - Paginated object listing
//! - [`clean`] - Bulk deletion with a worker pool
//! - [`request`] - Request builder and signing
//! - [`transport`] - HTTP transport trait, reqwest backend, redirect loop
//! - [`response`] - Response envelope and status validation
//! - [`content_type`] - Upload Content-Type detection
//! - [`config`] - Client configuration
//! - [`types`] - Options, filters, and result models

pub mod bucket;
pub mod clean;
pub mod client;
pub mod config;
pub mod content_type;
pub mod error;
pub mod listing;
pub mod request;
pub mod response;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use bucket::Bucket;
pub use client::{BucketFactory, ClientFactory, S3Client};
pub use config::ClientConfig;
pub use error::{S3Error, TransportError};
pub use request::Request;
pub use response::{DELETE_SUCCESS, Response, SUCCESS};
pub use transport::{
    HttpTransport, MAX_REDIRECTS, ReqwestTransport, WireBody, WireRequest, WireResponse,
};
pub use types::{
    AccountInfo, AccountOwner, BucketSummary, CannedAcl, CopyOptions, CreateBucketOptions,
    ListFilter, Location, Method, ObjectMeta, ObjectSummary, PutOptions,
};
