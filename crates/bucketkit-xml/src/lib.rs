//! S3 XML documents for bucketkit.
//!
//! The client consumes two documents and produces one:
//!
//! - [`ListBucketResult`] - a page of a bucket listing (`GET /?prefix=…`)
//! - [`ListAllMyBucketsResult`] - account owner and bucket list (`GET /`)
//! - [`CreateBucketConfiguration`] - optional body of a bucket creation
//!
//! # Key components
//!
//! - [`S3Deserialize`] trait and [`from_xml`] for parsing response bodies
//! - [`S3Serialize`] trait and [`to_xml`] for building request bodies
//! - [`parse_timestamp`] and [`parse_http_date`] for the two date formats S3 uses

pub mod deserialize;
pub mod error;
pub mod serialize;

pub use deserialize::{
    BucketEntry, ListAllMyBucketsResult, ListBucketResult, ListEntry, Owner, S3Deserialize,
    from_xml, parse_http_date, parse_timestamp,
};
pub use error::XmlError;
pub use serialize::{CreateBucketConfiguration, S3_NAMESPACE, S3Serialize, to_xml};
