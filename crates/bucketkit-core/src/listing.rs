//! Paginated object listing.
//!
//! ```text
//! fetch page ──► parse page ──► limit given? ──yes──► done
//!     ▲                            │ no
//!     │                     next marker? ──no──► done
//!     │                            │ yes
//!     └──────── yes ◄──── truncated? ──no──► done
//! ```

use bucketkit_xml::{ListBucketResult, ListEntry, parse_timestamp};
use tracing::debug;

use crate::bucket::Bucket;
use crate::error::S3Error;
use crate::types::{ListFilter, Method, ObjectSummary, strip_quotes};

impl TryFrom<ListEntry> for ObjectSummary {
    type Error = S3Error;

    fn try_from(entry: ListEntry) -> Result<Self, Self::Error> {
        let last_modified =
            parse_timestamp(&entry.last_modified).map_err(S3Error::InvalidTimestamp)?;
        Ok(Self {
            checksum: strip_quotes(&entry.etag),
            key: entry.key,
            last_modified,
            size: entry.size,
        })
    }
}

impl Bucket {
    /// List the objects matching `filter`.
    ///
    /// Without a limit, pages are fetched until the listing is exhausted.
    /// With a limit, exactly one page of at most `limit` entries is fetched.
    /// Any failure aborts the whole listing.
    pub async fn files(&self, filter: &ListFilter) -> Result<Vec<ObjectSummary>, S3Error> {
        let mut files = Vec::new();
        let mut marker = filter.marker.clone();
        let mut pages = 0usize;

        loop {
            let page = self.list_page(filter, marker.as_deref()).await?;
            pages += 1;

            let mut next = None;
            for entry in page.contents {
                let summary = ObjectSummary::try_from(entry)?;
                next = Some(summary.key.clone());
                files.push(summary);
            }
            if let Some(next_marker) = page.next_marker.filter(|m| !m.is_empty()) {
                next = Some(next_marker);
            }

            if filter.limit.is_some() || next.is_none() || !page.is_truncated {
                break;
            }
            marker = next;
        }

        debug!(bucket = %self.name(), pages, objects = files.len(), "listed objects");
        Ok(files)
    }

    /// Fetch and decode one listing page.
    pub async fn list_page(
        &self,
        filter: &ListFilter,
        marker: Option<&str>,
    ) -> Result<ListBucketResult, S3Error> {
        let mut request = self.request().method(Method::GET);
        if let Some(prefix) = &filter.prefix {
            request = request.param("prefix", prefix.as_str());
        }
        if let Some(marker) = marker {
            request = request.param("marker", marker);
        }
        if let Some(delimiter) = &filter.delimiter {
            request = request.param("delimiter", delimiter.as_str());
        }
        if let Some(limit) = filter.limit {
            request = request.param("max-keys", limit.to_string());
        }

        request.response().await.ok()?.xml()
    }
}
