//! Wire-level tests of the reqwest transport and the redirect loop.

#[cfg(test)]
mod tests {
    use std::io::Write;

    use bucketkit_core::transport::send;
    use bucketkit_core::{
        MAX_REDIRECTS, ReqwestTransport, TransportError, WireBody, WireRequest,
    };
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue, Method};

    use crate::{TestServer, reply};

    fn request(method: Method, url: String, body: WireBody) -> WireRequest {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("AWS AKID:sig"));
        headers.insert("x-amz-acl", HeaderValue::from_static("private"));
        WireRequest {
            method,
            url,
            headers,
            body,
        }
    }

    #[tokio::test]
    async fn test_should_follow_temporary_redirect() {
        let server = TestServer::start(|req| match req.path.as_str() {
            "/old" => reply(307, &[("location", "/new")], ""),
            _ => reply(200, &[], "moved"),
        })
        .await;
        let transport = ReqwestTransport::new().unwrap();

        let response = send(
            &transport,
            request(Method::GET, server.url("/old"), WireBody::Empty),
        )
        .await;

        assert!(response.error.is_none(), "{:?}", response.error);
        assert_eq!(response.status, 200);
        assert_eq!(response.body_text, "moved");

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].path, "/new");
        assert_eq!(requests[1].header("authorization"), Some("AWS AKID:sig"));
        assert_eq!(requests[1].header("x-amz-acl"), Some("private"));
    }

    #[tokio::test]
    async fn test_should_give_up_after_ten_hops() {
        let server = TestServer::start(|_| reply(307, &[("location", "/loop")], "")).await;
        let transport = ReqwestTransport::new().unwrap();

        let response = send(
            &transport,
            request(Method::GET, server.url("/start"), WireBody::Empty),
        )
        .await;

        assert!(matches!(
            response.error,
            Some(TransportError::TooManyRedirects { hops: 10 })
        ));
        assert_eq!(server.requests().len(), MAX_REDIRECTS);
    }

    #[tokio::test]
    async fn test_should_stream_file_with_explicit_length() {
        let server = TestServer::start(|_| reply(200, &[], "")).await;
        let transport = ReqwestTransport::new().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        file.flush().unwrap();

        let body = WireBody::File {
            path: file.path().to_path_buf(),
            size: 11,
        };
        let response = send(&transport, request(Method::PUT, server.url("/k"), body)).await;
        assert!(response.error.is_none(), "{:?}", response.error);

        let requests = server.requests();
        assert_eq!(requests[0].header("content-length"), Some("11"));
        assert_eq!(requests[0].body, Bytes::from_static(b"hello world"));
    }

    #[tokio::test]
    async fn test_should_send_zero_length_for_empty_put() {
        let server = TestServer::start(|_| reply(200, &[], "")).await;
        let transport = ReqwestTransport::new().unwrap();

        send(
            &transport,
            request(Method::PUT, server.url("/bucket"), WireBody::Empty),
        )
        .await;

        assert_eq!(server.requests()[0].header("content-length"), Some("0"));
    }

    #[tokio::test]
    async fn test_should_keep_first_value_of_repeated_header() {
        let server = TestServer::start(|_| {
            reply(
                200,
                &[("x-amz-meta-tag", "first"), ("x-amz-meta-tag", "second")],
                "",
            )
        })
        .await;
        let transport = ReqwestTransport::new().unwrap();

        let response = send(
            &transport,
            request(Method::GET, server.url("/k"), WireBody::Empty),
        )
        .await;

        assert_eq!(response.header("X-Amz-Meta-Tag"), Some("first"));
    }

    #[tokio::test]
    async fn test_should_report_missing_upload_file() {
        let server = TestServer::start(|_| reply(200, &[], "")).await;
        let transport = ReqwestTransport::new().unwrap();

        let body = WireBody::File {
            path: "/nonexistent/bucketkit/upload.bin".into(),
            size: 3,
        };
        let response = send(&transport, request(Method::PUT, server.url("/k"), body)).await;

        assert!(matches!(response.error, Some(TransportError::File { .. })));
        assert!(server.requests().is_empty());
    }
}
