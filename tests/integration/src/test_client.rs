//! End-to-end client operations over real HTTP.

#[cfg(test)]
mod tests {
    use std::io::Write;

    use bucketkit_core::{CannedAcl, ListFilter, Method, PutOptions, S3Error};

    use crate::{ACCESS_KEY, Recorded, TestServer, reply};

    const LISTING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>photos</Name><Prefix>2024/</Prefix><Marker></Marker><MaxKeys>1000</MaxKeys>
  <IsTruncated>false</IsTruncated>
  <Contents>
    <Key>2024/cat.jpg</Key><LastModified>2024-01-02T03:04:05.000Z</LastModified>
    <ETag>&quot;5eb63bbbe01eeed093cb22bb8f5acdc3&quot;</ETag><Size>11</Size>
    <Owner><ID>owner</ID><DisplayName>alice</DisplayName></Owner>
  </Contents>
</ListBucketResult>"#;

    fn photos(req: &Recorded) -> http::Response<http_body_util::Full<bytes::Bytes>> {
        match req.method {
            Method::GET => reply(200, &[("content-type", "application/xml")], LISTING),
            Method::HEAD => reply(
                200,
                &[
                    ("content-type", "image/jpeg"),
                    ("content-length", "11"),
                    ("etag", "\"5eb63bbbe01eeed093cb22bb8f5acdc3\""),
                    ("last-modified", "Tue, 02 Jan 2024 03:04:05 GMT"),
                ],
                "",
            ),
            Method::DELETE => reply(204, &[], ""),
            _ => reply(200, &[], ""),
        }
    }

    #[tokio::test]
    async fn test_should_upload_signed_file() {
        let server = TestServer::start(photos).await;
        let client = server.client(&["photos"]);

        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(b"hello world").unwrap();
        file.flush().unwrap();

        client
            .bucket("photos/2024/cat.jpg")
            .unwrap()
            .put(
                file.path(),
                PutOptions {
                    acl: CannedAcl::PublicRead,
                    cache_seconds: Some(60),
                },
            )
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let put = &requests[0];
        assert_eq!(put.method, Method::PUT);
        assert_eq!(put.path, "/2024/cat.jpg");
        assert_eq!(
            put.header("host"),
            Some(format!("photos.localhost:{}", server.port()).as_str())
        );
        assert_eq!(put.header("content-type"), Some("image/jpeg"));
        assert_eq!(put.header("content-md5"), Some("XrY7u+Ae7tCTyyK7j1rNww=="));
        assert_eq!(put.header("content-length"), Some("11"));
        assert_eq!(put.header("x-amz-acl"), Some("public-read"));
        assert_eq!(put.header("cache-control"), Some("max-age=60"));
        assert!(put.header("date").is_some());
        assert!(
            put.header("authorization")
                .unwrap()
                .starts_with(&format!("AWS {ACCESS_KEY}:"))
        );
        assert_eq!(put.body.as_ref(), b"hello world");
    }

    #[tokio::test]
    async fn test_should_list_and_stat_objects() {
        let server = TestServer::start(photos).await;
        let client = server.client(&["photos"]);
        let bucket = client.bucket("photos").unwrap();

        let files = bucket
            .files(&ListFilter::new().prefix("2024/"))
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].key, "2024/cat.jpg");
        assert_eq!(files[0].checksum, "5eb63bbbe01eeed093cb22bb8f5acdc3");
        assert_eq!(files[0].last_modified, 1_704_164_645);

        let listing = &server.requests()[0];
        assert_eq!(listing.path, "/");
        assert_eq!(listing.query.as_deref(), Some("prefix=2024%2F"));

        let meta = bucket.object("2024/cat.jpg").meta().await.unwrap();
        assert_eq!(meta.content_length, 11);
        assert_eq!(meta.content_type, "image/jpeg");
        assert_eq!(meta.checksum, "5eb63bbbe01eeed093cb22bb8f5acdc3");
        assert_eq!(meta.last_modified, 1_704_164_645);
    }

    #[tokio::test]
    async fn test_should_clean_bucket_over_http() {
        let server = TestServer::start(photos).await;
        let client = server.client(&["photos"]);

        let errors = client.bucket("photos").unwrap().clean(2).await;
        assert!(errors.is_empty(), "{errors:?}");

        let deleted: Vec<String> = server
            .requests()
            .into_iter()
            .filter(|req| req.method == Method::DELETE)
            .map(|req| req.path)
            .collect();
        assert_eq!(deleted, vec!["/2024/cat.jpg"]);
    }

    #[tokio::test]
    async fn test_should_reject_forbidden_bucket_delete() {
        let server = TestServer::start(|_| {
            reply(403, &[("content-type", "application/xml")], "<Error/>")
        })
        .await;
        let client = server.client(&["photos"]);

        let err = client.bucket("photos").unwrap().delete().await.unwrap_err();
        assert!(matches!(
            err,
            S3Error::UnexpectedStatus { status: 403, .. }
        ));
    }

    #[tokio::test]
    async fn test_should_ping_service_root() {
        let server = TestServer::start(|_| reply(200, &[], "")).await;
        let client = server.client(&[]);

        assert!(client.test().await);
        assert_eq!(server.requests()[0].path, "/");
    }
}
